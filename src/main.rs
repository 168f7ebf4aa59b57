mod api;
mod database;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

    log::info!("🚀 Starting MedReport Service...");
    log::info!("📊 Database: {}", database_url);

    // Upload folder for transient report files
    std::fs::create_dir_all(&upload_dir)?;
    log::info!("📁 Upload dir ready: {}", upload_dir);

    if env::var("GEMINI_API_KEY").is_err() {
        log::warn!("⚠️  GEMINI_API_KEY is not set - analysis endpoints will fail");
    }

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_data = web::Data::new(db.clone());

    log::info!("✅ MongoDB connected successfully");

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        // Open CORS, same policy the original frontend relied on
        let cors = Cors::permissive();

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Auth endpoints (public)
            .service(
                web::scope("/api/v1/auth")
                    .route("/signup", web::post().to(api::auth::signup))
                    .route("/login", web::post().to(api::auth::login))
                    .route("/forgot-password", web::post().to(api::auth::forgot_password))
                    .route("/reset-password", web::post().to(api::auth::reset_password)),
            )
            // Insights: upload + analysis and follow-up conversation - Requires JWT
            .service(
                web::scope("/api/v1/insights")
                    .wrap(middleware::AuthMiddleware)
                    .route("/analyze", web::post().to(api::analysis::analyze))
                    .route("/followup", web::post().to(api::analysis::followup)),
            )
            // Reports: per-user insight history - Requires JWT
            .service(
                web::scope("/api/v1/reports")
                    .wrap(middleware::AuthMiddleware)
                    .route("", web::post().to(api::reports::save_report))
                    .route("", web::get().to(api::reports::my_reports)),
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
