use actix_web::{http::StatusCode, HttpResponse};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    Validation(String),
    MissingToken,
    InvalidToken,
    DuplicateUser,
    UserNotFound,
    IncorrectPassword,
    InvalidOtp,
    OtpExpired,
    ExtractionFailed(String),
    GenerationFailed(String),
    DatabaseError(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "{}", msg),
            AppError::MissingToken => write!(f, "No token provided"),
            AppError::InvalidToken => write!(f, "Invalid or expired token"),
            AppError::DuplicateUser => write!(f, "Name already taken"),
            AppError::UserNotFound => write!(f, "User not found"),
            AppError::IncorrectPassword => write!(f, "Incorrect password"),
            AppError::InvalidOtp => write!(f, "Invalid OTP"),
            AppError::OtpExpired => write!(f, "OTP has expired"),
            AppError::ExtractionFailed(msg) => write!(f, "Failed to read file: {}", msg),
            AppError::GenerationFailed(msg) => write!(f, "Failed to generate insight: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::DuplicateUser => StatusCode::BAD_REQUEST,
            AppError::MissingToken
            | AppError::InvalidToken
            | AppError::IncorrectPassword
            | AppError::InvalidOtp
            | AppError::OtpExpired => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::ExtractionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts the error into the uniform `{success: false, message}` envelope.
    pub fn to_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "message": self.to_string()
        }))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(AppError::DuplicateUser.to_string(), "Name already taken");
        assert_eq!(AppError::IncorrectPassword.to_string(), "Incorrect password");
        assert_eq!(AppError::UserNotFound.to_string(), "User not found");
        assert_eq!(
            AppError::Validation("Report content is empty".to_string()).to_string(),
            "Report content is empty"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::OtpExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::UserNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::ExtractionFailed("bad pdf".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::GenerationFailed("timeout".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
