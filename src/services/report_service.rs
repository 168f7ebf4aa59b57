use crate::database::MongoDB;
use crate::models::{Report, ReportView};
use crate::utils::error::AppError;
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SaveReportRequest {
    pub content: Option<String>,
}

/// Persists a report for the owning user. Blank content is rejected before
/// touching the store.
pub async fn save_report(db: &MongoDB, user_id: &str, content: &str) -> Result<String, AppError> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("Report content is empty".to_string()));
    }

    let collection = db.collection::<Report>("reports");

    let report = Report {
        _id: None,
        user_id: user_id.to_string(),
        content: content.to_string(),
        created_at: BsonDateTime::now(),
    };

    let result = collection.insert_one(&report).await?;

    let report_id = result
        .inserted_id
        .as_object_id()
        .map(|oid| oid.to_hex())
        .unwrap_or_default();

    log::info!("💾 Report saved for user {}: {}", user_id, report_id);

    Ok(report_id)
}

/// All reports owned by `user_id`, newest first. Never returns another
/// user's reports.
pub async fn list_reports(db: &MongoDB, user_id: &str) -> Result<Vec<ReportView>, AppError> {
    let collection = db.collection::<Report>("reports");

    let cursor = collection
        .find(doc! { "user_id": user_id })
        .sort(doc! { "created_at": -1 })
        .await?;

    let reports: Vec<Report> = cursor.try_collect().await?;

    Ok(reports.into_iter().map(ReportView::from).collect())
}
