use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MedReport Service API",
        version = "1.0.0",
        description = "Backend gateway for medical report analysis.\n\n**Authentication:** Protected endpoints require a JWT Bearer token (24h validity).\n\n**Features:**\n- Signup / login with OTP-based password reset\n- Upload of PDF, DOCX, image (OCR) or plain-text medical reports\n- AI-generated insight with follow-up conversation modes\n- Per-user report history",
        contact(
            name = "MedReport Service Team",
            email = "support@medreport-service.com"
        )
    ),
    paths(
        // Auth endpoints
        crate::api::auth::signup,
        crate::api::auth::login,
        crate::api::auth::forgot_password,
        crate::api::auth::reset_password,

        // Insights
        crate::api::analysis::analyze,
        crate::api::analysis::followup,

        // Reports
        crate::api::reports::save_report,
        crate::api::reports::my_reports,

        // Health
        crate::api::health::health_check,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::SignupRequest,
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::AuthResponse,
            crate::services::auth_service::ForgotPasswordRequest,
            crate::services::auth_service::ResetPasswordRequest,

            // Insights
            crate::services::insight_service::FollowUpRequest,

            // Reports
            crate::services::report_service::SaveReportRequest,
            crate::models::report::ReportView,

            // Health
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Signup, login and OTP-based password reset."),
        (name = "Insights", description = "Medical report analysis and follow-up conversation. Uploads accept PDF, DOCX, images (OCR) and plain text."),
        (name = "Reports", description = "Per-user insight history. Reports are append-only and listed newest first."),
        (name = "Health", description = "Health check endpoint for monitoring service status."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}
