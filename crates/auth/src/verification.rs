//! One-time codes for the verified email-change flow.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use stockroom_core::UserId;

/// Codes expire five minutes after issuance.
pub fn code_ttl() -> Duration {
    Duration::minutes(5)
}

/// A single active email-change code for one (user, target email) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailChangeCode {
    pub user_id: UserId,
    /// The address the user is changing to; the code only confirms this one.
    pub new_email: String,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Set on successful confirmation; a verified code can never be replayed.
    pub verified: bool,
}

impl EmailChangeCode {
    pub fn issue(user_id: UserId, new_email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            new_email: new_email.into(),
            code: generate_code(),
            issued_at: now,
            expires_at: now + code_ttl(),
            verified: false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// A code is accepted once: unverified, unexpired, exact match.
    pub fn accepts(&self, code: &str, now: DateTime<Utc>) -> bool {
        !self.verified && !self.is_expired(now) && self.code == code
    }
}

/// 6-digit numeric code, zero-padded.
pub fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}

/// Storage port for pending email-change codes.
pub trait VerificationStore: Send + Sync {
    /// Store a freshly issued code, dropping every prior code for the user:
    /// issuing a new code invalidates all unconsumed ones.
    fn replace(&self, code: EmailChangeCode);

    fn get(&self, user: UserId) -> Option<EmailChangeCode>;

    /// Mark the user's active code as consumed. Returns whether one existed.
    fn mark_verified(&self, user: UserId) -> bool;
}

impl<S> VerificationStore for Arc<S>
where
    S: VerificationStore + ?Sized,
{
    fn replace(&self, code: EmailChangeCode) {
        (**self).replace(code)
    }

    fn get(&self, user: UserId) -> Option<EmailChangeCode> {
        (**self).get(user)
    }

    fn mark_verified(&self, user: UserId) -> bool {
        (**self).mark_verified(user)
    }
}
