//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error taxonomy.
///
/// Every failure the core can produce is a typed, non-fatal value; callers
/// decide presentation. Keep this focused on deterministic business failures;
/// transport concerns belong in the API layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Login failed. Deliberately identical for "unknown user" and
    /// "wrong password" so usernames cannot be enumerated.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration or email change targets an address already in use.
    #[error("email already in use")]
    EmailTaken,

    /// Registration targets a username already in use.
    #[error("username already in use")]
    UsernameTaken,

    /// The presented access token has passed its expiry.
    #[error("access token expired")]
    AccessTokenExpired,

    /// The presented refresh token has passed its expiry.
    #[error("refresh token expired")]
    RefreshTokenExpired,

    /// A verified refresh token no longer matches the persisted one:
    /// a concurrent login rotated it. Forces re-authentication.
    #[error("refresh token superseded")]
    Superseded,

    /// The caller is known but lacks the permission for this operation.
    #[error("forbidden")]
    Forbidden,

    /// The resource is absent, or exists but the caller holds no right to
    /// learn that it exists.
    #[error("not found")]
    NotFound,

    /// A usage decrement exceeded the stored quantity. Recoverable by the
    /// caller; no state was changed.
    #[error("insufficient quantity: requested {requested}, available {available}")]
    InsufficientQuantity { available: u32, requested: u32 },

    /// A workspace-scoped operation was attempted with no active workspace.
    #[error("no workspace selected")]
    WorkspaceNotSelected,

    /// Removing or demoting the last owner of a workspace was rejected.
    #[error("workspace must retain at least one owner")]
    LastOwnerRemovalRejected,

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A conflict occurred (e.g. optimistic concurrency exhaustion).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Whether the client session must discard its local state and
    /// re-authenticate when it sees this error.
    pub fn forces_logout(&self) -> bool {
        matches!(self, Self::Superseded | Self::RefreshTokenExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superseded_forces_logout() {
        assert!(DomainError::Superseded.forces_logout());
        assert!(DomainError::RefreshTokenExpired.forces_logout());
        assert!(!DomainError::AccessTokenExpired.forces_logout());
        assert!(!DomainError::Forbidden.forces_logout());
    }

    #[test]
    fn insufficient_quantity_reports_both_sides() {
        let err = DomainError::InsufficientQuantity {
            available: 10,
            requested: 15,
        };
        let msg = err.to_string();
        assert!(msg.contains("15"));
        assert!(msg.contains("10"));
    }
}
