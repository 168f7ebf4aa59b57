use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// User document as stored in the `users` collection.
///
/// `name` is unique (enforced by index). The OTP fields are only present while
/// a password reset is in flight and are cleared together on success.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub user_id: String, // PRIMARY IDENTIFIER - matches MongoDB structure
    pub name: String,
    pub password: String, // bcrypt hash, never the plain password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_otp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_otp_expire: Option<BsonDateTime>,
    pub created_at: Option<BsonDateTime>,
}
