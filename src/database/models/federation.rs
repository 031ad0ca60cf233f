//! Federation documents: cross-chat ban lists.

use serde::{Deserialize, Serialize};

/// A single federation ban entry. Appended on fban, removed only by an
/// explicit unfban.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationBan {
    pub user_id: u64,
    pub reason: String,
    pub banned_by: u64,
    pub banned_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationRecord {
    /// Short unique federation id (indexed).
    pub fed_id: String,
    pub name: String,
    pub owner_id: u64,
    #[serde(default)]
    pub admins: Vec<u64>,
    #[serde(default)]
    pub banned_users: Vec<FederationBan>,
    #[serde(default)]
    pub subscribed_feds: Vec<String>,
    #[serde(default)]
    pub log_channel_id: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
}

impl FederationRecord {
    pub fn new(name: &str, owner_id: u64) -> Self {
        Self {
            // First 8 hex chars of a v4 uuid, same shape users are used to
            // pasting into /joinfed.
            fed_id: uuid::Uuid::new_v4().to_string()[..8].to_string(),
            name: name.to_string(),
            owner_id,
            admins: Vec::new(),
            banned_users: Vec::new(),
            subscribed_feds: Vec::new(),
            log_channel_id: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        user_id == self.owner_id || self.admins.contains(&user_id)
    }

    pub fn ban_entry(&self, user_id: u64) -> Option<&FederationBan> {
        self.banned_users.iter().find(|b| b.user_id == user_id)
    }

    /// Append a ban. Re-banning an already banned user updates the reason
    /// in place rather than duplicating the entry.
    pub fn add_ban(&mut self, user_id: u64, reason: &str, banned_by: u64) {
        let now = chrono::Utc::now().timestamp();
        if let Some(existing) = self.banned_users.iter_mut().find(|b| b.user_id == user_id) {
            existing.reason = reason.to_string();
            existing.banned_by = banned_by;
            existing.banned_at = now;
            return;
        }
        self.banned_users.push(FederationBan {
            user_id,
            reason: reason.to_string(),
            banned_by,
            banned_at: now,
        });
    }

    /// Remove a ban; returns whether an entry existed.
    pub fn remove_ban(&mut self, user_id: u64) -> bool {
        let before = self.banned_users.len();
        self.banned_users.retain(|b| b.user_id != user_id);
        self.banned_users.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ban_list_append_and_remove() {
        let mut fed = FederationRecord::new("test", 1);
        fed.add_ban(100, "spam", 1);
        fed.add_ban(200, "raid", 1);
        assert_eq!(fed.banned_users.len(), 2);
        assert_eq!(fed.ban_entry(100).unwrap().reason, "spam");

        // Re-ban updates in place.
        fed.add_ban(100, "worse spam", 2);
        assert_eq!(fed.banned_users.len(), 2);
        assert_eq!(fed.ban_entry(100).unwrap().reason, "worse spam");

        assert!(fed.remove_ban(100));
        assert!(!fed.remove_ban(100));
        assert_eq!(fed.banned_users.len(), 1);
    }

    #[test]
    fn owner_is_admin() {
        let mut fed = FederationRecord::new("test", 1);
        assert!(fed.is_admin(1));
        assert!(!fed.is_admin(2));
        fed.admins.push(2);
        assert!(fed.is_admin(2));
    }

    #[test]
    fn fed_id_is_short() {
        let fed = FederationRecord::new("test", 1);
        assert_eq!(fed.fed_id.len(), 8);
    }
}
