use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// Report document as stored in the `reports` collection.
/// Append-only: created once per analysis or manual save, never updated.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Report {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub user_id: String,
    pub content: String,
    pub created_at: BsonDateTime,
}

/// Wire shape returned by the report listing endpoint.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ReportView {
    pub content: String,
    pub created_at: String,
}

impl From<Report> for ReportView {
    fn from(report: Report) -> Self {
        ReportView {
            content: report.content,
            created_at: report.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}
