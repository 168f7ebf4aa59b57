use crate::database::MongoDB;
use crate::middleware::auth::authenticated_claims;
use crate::services::report_service::{self, SaveReportRequest};
use crate::utils::error::AppError;
use actix_web::{web, HttpRequest, HttpResponse};

#[utoipa::path(
    post,
    path = "/api/v1/reports",
    tag = "Reports",
    request_body = SaveReportRequest,
    responses(
        (status = 200, description = "Report saved"),
        (status = 400, description = "Empty content"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn save_report(
    req: HttpRequest,
    db: web::Data<MongoDB>,
    request: web::Json<SaveReportRequest>,
) -> HttpResponse {
    let claims = match authenticated_claims(&req) {
        Some(claims) => claims,
        None => return AppError::MissingToken.to_response(),
    };

    log::info!("💾 POST /reports - user: {}", claims.sub);

    let content = request.content.as_deref().unwrap_or("");

    match report_service::save_report(&db, &claims.sub, content).await {
        Ok(report_id) => {
            log::info!("✅ Report saved for user: {}", claims.sub);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Report saved",
                "report_id": report_id
            }))
        }
        Err(e) => {
            log::warn!("❌ Save report failed - user: {} - {}", claims.sub, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/reports",
    tag = "Reports",
    responses(
        (status = 200, description = "Caller's reports, newest first"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_reports(req: HttpRequest, db: web::Data<MongoDB>) -> HttpResponse {
    let claims = match authenticated_claims(&req) {
        Some(claims) => claims,
        None => return AppError::MissingToken.to_response(),
    };

    log::info!("📄 GET /reports - user: {}", claims.sub);

    match report_service::list_reports(&db, &claims.sub).await {
        Ok(reports) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "reports": reports
        })),
        Err(e) => {
            log::error!("❌ List reports failed - user: {} - {}", claims.sub, e);
            e.to_response()
        }
    }
}
