//! User identity record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::UserId;

/// Per-user notification opt-ins. New accounts get both channels enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPrefs {
    pub email: bool,
    pub push: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
        }
    }
}

/// Full user row, including the password digest.
///
/// Never serialized outward; API responses use [`UserProfile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub name: String,
    /// Unique; mutable only through the verified email-change flow.
    pub email: String,
    pub password_digest: String,
    /// Platform-wide superuser flag.
    pub is_admin: bool,
    pub prefs: NotificationPrefs,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        password_digest: String,
    ) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            name: name.into(),
            email: normalize_email(&email.into()),
            password_digest,
            is_admin: false,
            prefs: NotificationPrefs::default(),
            created_at: Utc::now(),
        }
    }

    /// Digest-free projection safe to hand to clients.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            is_admin: self.is_admin,
        }
    }
}

/// Public user record: everything except credentials and preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

/// Canonical email form: trimmed, lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized_on_construction() {
        let user = User::new("bob", "Bob", "  Bob@Example.COM ", "digest".into());
        assert_eq!(user.email, "bob@example.com");
    }

    #[test]
    fn profile_never_carries_the_digest() {
        let user = User::new("bob", "Bob", "bob@example.com", "digest".into());
        let json = serde_json::to_string(&user.profile()).unwrap();
        assert!(!json.contains("digest"));
    }

    #[test]
    fn new_accounts_opt_into_both_channels() {
        let prefs = NotificationPrefs::default();
        assert!(prefs.email);
        assert!(prefs.push);
    }
}
