use crate::database::MongoDB;
use crate::models::User;
use crate::utils::error::AppError;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const OTP_TTL_MINUTES: i64 = 10;
const TOKEN_TTL_HOURS: i64 = 24;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // user_id
    pub name: String,
    pub iat: usize, // issued at
    pub exp: usize, // expiration
    pub jti: String, // JWT ID
}

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub name: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ForgotPasswordRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ResetPasswordRequest {
    pub name: String,
    pub otp: String,
    pub new_password: String,
}

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret-change-me".to_string())
}

// Generate JWT token (24h expiry)
pub fn generate_jwt(user_id: &str, name: &str) -> Result<String, AppError> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: user_id.to_string(),
        name: name.to_string(),
        iat,
        exp,
        jti,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Verify JWT token. Expired and malformed tokens are both InvalidToken.
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidToken)
}

// User signup
pub async fn signup(db: &MongoDB, request: &SignupRequest) -> Result<(), AppError> {
    let name = request.name.trim();
    if name.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Name and password are required".to_string(),
        ));
    }

    let collection = db.collection::<User>("users");

    if collection.find_one(doc! { "name": name }).await?.is_some() {
        return Err(AppError::DuplicateUser);
    }

    let hashed = hash(&request.password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let new_user = User {
        _id: None,
        user_id: ObjectId::new().to_hex(),
        name: name.to_string(),
        password: hashed,
        reset_otp: None,
        reset_otp_expire: None,
        created_at: Some(BsonDateTime::now()),
    };

    collection.insert_one(&new_user).await?;

    log::info!("✅ User registered successfully: {}", name);

    Ok(())
}

// User login
pub async fn login(db: &MongoDB, request: &LoginRequest) -> Result<AuthResponse, AppError> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "name": &request.name })
        .await?
        .ok_or(AppError::UserNotFound)?;

    let valid = verify(&request.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))?;

    if !valid {
        return Err(AppError::IncorrectPassword);
    }

    let token = generate_jwt(&user.user_id, &user.name)?;

    Ok(AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        name: user.name,
    })
}

/// Issues a 6-digit reset code with a 10 minute expiry and stores it on the
/// user. Requesting again overwrites the previous code (latest wins).
///
/// The code is handed back to the caller in-band. Known placeholder for
/// out-of-band delivery.
pub async fn forgot_password(db: &MongoDB, name: &str) -> Result<String, AppError> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "name": name })
        .await?
        .ok_or(AppError::UserNotFound)?;

    let otp = generate_otp();
    let expire = BsonDateTime::from_millis(
        (Utc::now() + Duration::minutes(OTP_TTL_MINUTES)).timestamp_millis(),
    );

    collection
        .update_one(
            doc! { "user_id": &user.user_id },
            doc! { "$set": { "reset_otp": &otp, "reset_otp_expire": expire } },
        )
        .await?;

    log::info!("🔑 Reset OTP issued for user: {}", name);

    Ok(otp)
}

// Reset password with a previously issued OTP
pub async fn reset_password(db: &MongoDB, request: &ResetPasswordRequest) -> Result<(), AppError> {
    if request.new_password.is_empty() {
        return Err(AppError::Validation("New password is required".to_string()));
    }

    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "name": &request.name })
        .await?
        .ok_or(AppError::UserNotFound)?;

    match &user.reset_otp {
        Some(stored) if stored == &request.otp => {}
        _ => return Err(AppError::InvalidOtp),
    }

    match user.reset_otp_expire {
        Some(expire) if expire.timestamp_millis() >= Utc::now().timestamp_millis() => {}
        _ => return Err(AppError::OtpExpired),
    }

    let hashed = hash(&request.new_password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    // New hash lands and both OTP fields clear in a single update
    collection
        .update_one(
            doc! { "user_id": &user.user_id },
            doc! {
                "$set": { "password": hashed },
                "$unset": { "reset_otp": "", "reset_otp_expire": "" }
            },
        )
        .await?;

    log::info!("✅ Password reset for user: {}", request.name);

    Ok(())
}

fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_round_trip() {
        let token = generate_jwt("user-123", "alice").unwrap();
        let claims = verify_token(&token).unwrap();

        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.name, "alice");
        assert!(claims.exp > claims.iat);
        // 24h validity window
        assert_eq!(claims.exp - claims.iat, (24 * 3600) as usize);
    }

    #[test]
    fn test_expired_token_rejected() {
        let iat = (Utc::now() - Duration::hours(25)).timestamp() as usize;
        let exp = (Utc::now() - Duration::hours(1)).timestamp() as usize;
        let claims = Claims {
            sub: "user-123".to_string(),
            name: "alice".to_string(),
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(get_jwt_secret().as_ref()),
        )
        .unwrap();

        assert_eq!(verify_token(&token), Err(AppError::InvalidToken));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let token = generate_jwt("user-123", "alice").unwrap();
        let tampered = format!("{}x", token);

        assert_eq!(verify_token(&tampered), Err(AppError::InvalidToken));
        assert_eq!(verify_token("not-a-jwt"), Err(AppError::InvalidToken));
    }

    #[test]
    fn test_otp_is_six_digits() {
        for _ in 0..50 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_bcrypt_hash_verify() {
        // Low cost factor to keep the test fast
        let hashed = hash("pw1", 4).unwrap();
        assert!(verify("pw1", &hashed).unwrap());
        assert!(!verify("wrong", &hashed).unwrap());
    }

    async fn test_db() -> MongoDB {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/MedReportTest".to_string());
        MongoDB::new(&uri).await.unwrap()
    }

    async fn signup_test_user(db: &MongoDB) -> String {
        let name = format!("test-{}", Uuid::new_v4());
        signup(
            db,
            &SignupRequest {
                name: name.clone(),
                password: "pw1".to_string(),
            },
        )
        .await
        .unwrap();
        name
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_reset_with_wrong_otp_rejected() {
        let db = test_db().await;
        let name = signup_test_user(&db).await;

        let otp = forgot_password(&db, &name).await.unwrap();
        let wrong = if otp == "000000" { "111111" } else { "000000" };

        let err = reset_password(
            &db,
            &ResetPasswordRequest {
                name: name.clone(),
                otp: wrong.to_string(),
                new_password: "pw2".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err, AppError::InvalidOtp);
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_reset_after_expiry_rejected_with_correct_otp() {
        let db = test_db().await;
        let name = signup_test_user(&db).await;

        let otp = forgot_password(&db, &name).await.unwrap();

        // Push the expiry into the past instead of waiting out the window
        let expired = BsonDateTime::from_millis(Utc::now().timestamp_millis() - 1_000);
        db.collection::<User>("users")
            .update_one(
                doc! { "name": &name },
                doc! { "$set": { "reset_otp_expire": expired } },
            )
            .await
            .unwrap();

        let err = reset_password(
            &db,
            &ResetPasswordRequest {
                name: name.clone(),
                otp,
                new_password: "pw2".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err, AppError::OtpExpired);
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_second_forgot_invalidates_first_otp() {
        let db = test_db().await;
        let name = signup_test_user(&db).await;

        let first_otp = forgot_password(&db, &name).await.unwrap();
        let second_otp = forgot_password(&db, &name).await.unwrap();

        // Random codes can collide; the first code only becomes stale when
        // the reissue actually differs
        if first_otp != second_otp {
            let err = reset_password(
                &db,
                &ResetPasswordRequest {
                    name: name.clone(),
                    otp: first_otp,
                    new_password: "pw2".to_string(),
                },
            )
            .await
            .unwrap_err();
            assert_eq!(err, AppError::InvalidOtp);
        }

        // Latest code wins, and the new password is live afterwards
        reset_password(
            &db,
            &ResetPasswordRequest {
                name: name.clone(),
                otp: second_otp,
                new_password: "pw2".to_string(),
            },
        )
        .await
        .unwrap();

        let response = login(
            &db,
            &LoginRequest {
                name: name.clone(),
                password: "pw2".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(response.success);
        assert_eq!(response.name, name);
    }
}
