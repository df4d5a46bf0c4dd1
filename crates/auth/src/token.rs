//! Compact, expiring, tamper-evident tokens (HS256).
//!
//! The codec is a pure function over bytes: expiry and signature are checked
//! from the token alone, with no server lookup. Refresh tokens get one
//! additional check elsewhere: comparison against the single persisted value
//! per user (see [`crate::session::SessionManager::refresh`]).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use stockroom_core::parse_duration_or;

use crate::claims::{AccessClaims, RefreshClaims, TokenKind};
use crate::user::User;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("malformed token")]
    Malformed,
}

/// Token signing configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HS256 signing secret (must be at least 32 bytes).
    pub secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Documented defaults: 15-minute access tokens, 7-day refresh tokens.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
        }
    }

    /// Apply TTLs from configuration literals (`"15m"`, `"7d"`). Invalid
    /// literals keep the defaults instead of failing startup.
    pub fn with_ttl_literals(mut self, access: Option<&str>, refresh: Option<&str>) -> Self {
        self.access_ttl = parse_duration_or(access, self.access_ttl);
        self.refresh_ttl = parse_duration_or(refresh, self.refresh_ttl);
        self
    }
}

/// A signed token together with its expiry instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies access/refresh tokens.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenCodec {
    /// # Panics
    ///
    /// Panics if the signing secret is shorter than 32 bytes. This is a
    /// startup-time configuration error, not a runtime condition.
    pub fn new(config: TokenConfig) -> Self {
        assert!(
            config.secret.len() >= 32,
            "token signing secret must be at least 32 bytes"
        );

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(&config.secret),
            decoding_key: DecodingKey::from_secret(&config.secret),
            validation,
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue an access token for `user`, expiring at `now + access_ttl`.
    pub fn issue_access(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now + self.access_ttl;
        let claims = AccessClaims {
            sub: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            kind: TokenKind::Access,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        self.sign(&claims, expires_at)
    }

    /// Issue a refresh token for `user`, expiring at `now + refresh_ttl`.
    pub fn issue_refresh(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now + self.refresh_ttl;
        let claims = RefreshClaims {
            sub: user.id,
            kind: TokenKind::Refresh,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        self.sign(&claims, expires_at)
    }

    /// Verify an access token's signature and expiry.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = self.decode(token)?;
        if claims.kind != TokenKind::Access {
            return Err(TokenError::Malformed);
        }
        Ok(claims)
    }

    /// Verify a refresh token's signature and expiry. The superseded check
    /// against persisted state is the session manager's job.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims: RefreshClaims = self.decode(token)?;
        if claims.kind != TokenKind::Refresh {
            return Err(TokenError::Malformed);
        }
        Ok(claims)
    }

    fn sign<C: Serialize>(
        &self,
        claims: &C,
        expires_at: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let token = encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|_| TokenError::Malformed)?;
        Ok(IssuedToken { token, expires_at })
    }

    fn decode<C: DeserializeOwned>(&self, token: &str) -> Result<C, TokenError> {
        decode::<C>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })
    }
}
