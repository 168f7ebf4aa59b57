use crate::database::MongoDB;
use crate::middleware::auth::authenticated_claims;
use crate::services::insight_service::{self, FollowUpRequest};
use crate::services::{extract_service, report_service};
use crate::utils::error::AppError;
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use futures::StreamExt;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Transient uploaded file: created on receipt, read once, always deleted.
struct UploadedFile {
    path: PathBuf,
    media_type: String,
}

fn upload_dir() -> PathBuf {
    PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()))
}

#[utoipa::path(
    post,
    path = "/api/v1/insights/analyze",
    tag = "Insights",
    responses(
        (status = 200, description = "Insight generated and persisted"),
        (status = 400, description = "No file uploaded"),
        (status = 422, description = "File could not be read"),
        (status = 502, description = "Generation API failed"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn analyze(
    req: HttpRequest,
    db: web::Data<MongoDB>,
    payload: Multipart,
) -> HttpResponse {
    let claims = match authenticated_claims(&req) {
        Some(claims) => claims,
        None => return AppError::MissingToken.to_response(),
    };

    log::info!("🤖 POST /insights/analyze - user: {}", claims.sub);

    let upload = match save_upload(payload).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            log::warn!("❌ Analyze without file - user: {}", claims.sub);
            return AppError::Validation("No file uploaded.".to_string()).to_response();
        }
        Err(e) => {
            log::warn!("❌ Upload failed - user: {} - {}", claims.sub, e);
            return e.to_response();
        }
    };

    let result = run_analysis(&db, &claims.sub, &upload).await;

    // The temp file goes away on every exit path, success or failure
    if let Err(e) = tokio::fs::remove_file(&upload.path).await {
        log::warn!(
            "⚠️  Failed to remove upload {}: {}",
            upload.path.display(),
            e
        );
    }

    match result {
        Ok(insight) => {
            log::info!("✅ Insight generated for user: {}", claims.sub);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "insight": insight
            }))
        }
        Err(e) => {
            log::warn!("❌ Analysis failed - user: {} - {}", claims.sub, e);
            e.to_response()
        }
    }
}

// extract -> generate -> persist. Extraction is blocking work and runs on the
// blocking pool; nothing exclusive is held across the Gemini call.
async fn run_analysis(
    db: &MongoDB,
    user_id: &str,
    upload: &UploadedFile,
) -> Result<String, AppError> {
    let path = upload.path.clone();
    let media_type = upload.media_type.clone();

    let text = tokio::task::spawn_blocking(move || extract_service::extract(&path, &media_type))
        .await
        .map_err(|e| AppError::Internal(format!("Extraction task failed: {}", e)))??;

    let insight = insight_service::analyze(&text).await?;

    report_service::save_report(db, user_id, &insight).await?;

    Ok(insight)
}

// Streams the "file" part to a UUID-named temp file under the uploads dir.
// Ok(None) when the part never showed up.
async fn save_upload(mut payload: Multipart) -> Result<Option<UploadedFile>, AppError> {
    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::Validation(format!("Malformed upload: {}", e)))?;

        if field.content_disposition().get_name() != Some("file") {
            continue;
        }

        let media_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "text/plain".to_string());

        let dir = upload_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload dir: {}", e)))?;

        let path = dir.join(Uuid::new_v4().to_string());
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload file: {}", e)))?;

        while let Some(chunk) = field.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = tokio::fs::remove_file(&path).await;
                    return Err(AppError::Validation(format!("Upload interrupted: {}", e)));
                }
            };
            if let Err(e) = file.write_all(&chunk).await {
                let _ = tokio::fs::remove_file(&path).await;
                return Err(AppError::Internal(format!("Failed to write upload: {}", e)));
            }
        }

        return Ok(Some(UploadedFile { path, media_type }));
    }

    Ok(None)
}

#[utoipa::path(
    post,
    path = "/api/v1/insights/followup",
    tag = "Insights",
    request_body = FollowUpRequest,
    responses(
        (status = 200, description = "Follow-up reply"),
        (status = 400, description = "Missing prior insight"),
        (status = 502, description = "Generation API failed"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn followup(req: HttpRequest, request: web::Json<FollowUpRequest>) -> HttpResponse {
    let claims = match authenticated_claims(&req) {
        Some(claims) => claims,
        None => return AppError::MissingToken.to_response(),
    };

    log::info!(
        "💬 POST /insights/followup - user: {}, mode: {}",
        claims.sub,
        request.mode.as_deref().unwrap_or("generic")
    );

    match insight_service::follow_up(&request).await {
        Ok(reply) => {
            log::info!("✅ Follow-up reply generated for user: {}", claims.sub);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "reply": reply
            }))
        }
        Err(e) => {
            log::warn!("❌ Follow-up failed - user: {} - {}", claims.sub, e);
            e.to_response()
        }
    }
}
