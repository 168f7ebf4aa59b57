use crate::database::MongoDB;
use crate::services::auth_service::{
    self, AuthResponse, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
};
use actix_web::{web, HttpResponse};

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Signup successful"),
        (status = 400, description = "Name already taken or missing fields")
    )
)]
pub async fn signup(db: web::Data<MongoDB>, request: web::Json<SignupRequest>) -> HttpResponse {
    log::info!("📝 POST /auth/signup - name: {}", request.name);

    match auth_service::signup(&db, &request).await {
        Ok(()) => {
            log::info!("✅ Signup successful: {}", request.name);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Signup successful"
            }))
        }
        Err(e) => {
            log::warn!("❌ Signup failed: {} - {}", request.name, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Incorrect password"),
        (status = 404, description = "User not found")
    )
)]
pub async fn login(db: web::Data<MongoDB>, request: web::Json<LoginRequest>) -> HttpResponse {
    log::info!("🔐 POST /auth/login - name: {}", request.name);

    match auth_service::login(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.name);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.name, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    tag = "Auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "OTP issued"),
        (status = 404, description = "User not found")
    )
)]
pub async fn forgot_password(
    db: web::Data<MongoDB>,
    request: web::Json<ForgotPasswordRequest>,
) -> HttpResponse {
    log::info!("🔑 POST /auth/forgot-password - name: {}", request.name);

    match auth_service::forgot_password(&db, &request.name).await {
        Ok(otp) => {
            log::info!("✅ OTP issued for: {}", request.name);
            // OTP delivered in-band: placeholder for out-of-band delivery
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "OTP generated",
                "otp": otp
            }))
        }
        Err(e) => {
            log::warn!("❌ Forgot password failed: {} - {}", request.name, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    tag = "Auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset"),
        (status = 401, description = "Invalid or expired OTP"),
        (status = 404, description = "User not found")
    )
)]
pub async fn reset_password(
    db: web::Data<MongoDB>,
    request: web::Json<ResetPasswordRequest>,
) -> HttpResponse {
    log::info!("🔑 POST /auth/reset-password - name: {}", request.name);

    match auth_service::reset_password(&db, &request).await {
        Ok(()) => {
            log::info!("✅ Password reset: {}", request.name);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Password reset successful"
            }))
        }
        Err(e) => {
            log::warn!("❌ Password reset failed: {} - {}", request.name, e);
            e.to_response()
        }
    }
}
