//! Chat-scoped trigger -> response documents (filters and notes).

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Auto-reply filter: when `trigger` appears as a word in a chat
/// message, the bot replies with `response`. Triggers are unique per
/// chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatFilter {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub chat_id: i64,
    /// Lowercased trigger word.
    pub trigger: String,
    pub response: String,
    #[serde(default)]
    pub created_by: u64,
    #[serde(default)]
    pub created_at: i64,
}

impl ChatFilter {
    pub fn new(chat_id: i64, trigger: &str, response: &str, created_by: u64) -> Self {
        Self {
            id: None,
            chat_id,
            trigger: trigger.to_lowercase(),
            response: response.to_string(),
            created_by,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Saved note, fetched with /get <name>. Names are unique per chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatNote {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub chat_id: i64,
    /// Lowercased note name.
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub created_by: u64,
    #[serde(default)]
    pub created_at: i64,
}

impl ChatNote {
    pub fn new(chat_id: i64, name: &str, content: &str, created_by: u64) -> Self {
        Self {
            id: None,
            chat_id,
            name: name.to_lowercase(),
            content: content.to_string(),
            created_by,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}
