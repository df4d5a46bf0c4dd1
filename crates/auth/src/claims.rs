use serde::{Deserialize, Serialize};

use stockroom_core::UserId;

/// Discriminates access tokens from refresh tokens so one can never be
/// presented where the other is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by an access token.
///
/// Deliberately identity-only: no role or workspace claims. Those are
/// resolved fresh on every request so a role change takes effect without
/// waiting for token expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the authenticated user.
    pub sub: UserId,
    pub username: String,
    pub name: String,
    pub kind: TokenKind,
    /// Issued-at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
}

/// Claims carried by a refresh token: user id only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: UserId,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}
