//! Pending captcha records for members awaiting verification.

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A member who joined a captcha-gated chat and has not verified yet.
/// The sweeper kicks the member once `expires_at` passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingCaptcha {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub chat_id: i64,
    pub user_id: u64,
    /// The verify-button prompt, deleted once resolved.
    #[serde(default)]
    pub prompt_message_id: Option<i32>,
    pub joined_at: i64,
    /// Unix timestamp after which the member is removed (indexed).
    pub expires_at: i64,
}

impl PendingCaptcha {
    pub fn new(chat_id: i64, user_id: u64, timeout_secs: u64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            chat_id,
            user_id,
            prompt_message_id: None,
            joined_at: now,
            expires_at: now + timeout_secs as i64,
        }
    }
}
