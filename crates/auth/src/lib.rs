//! `stockroom-auth` — session/token lifecycle core.
//!
//! This crate is intentionally decoupled from HTTP and storage: tokens are
//! pure functions over bytes, credential hashing is a local computation, and
//! persistence goes through the [`UserStore`] port. The only mutable shared
//! session state in the whole system is the single persisted refresh token
//! per user, rotated on login.

pub mod claims;
pub mod client;
pub mod notify;
pub mod password;
pub mod session;
pub mod store;
pub mod token;
pub mod user;
pub mod verification;

pub use claims::{AccessClaims, RefreshClaims, TokenKind};
pub use client::{ClientSession, ClientStorage};
pub use notify::{NotificationKind, Notifier, NotifyError};
pub use password::CredentialHasher;
pub use session::{AuthResponse, AuthTokens, RegisterRequest, SessionManager};
pub use store::UserStore;
pub use token::{IssuedToken, TokenCodec, TokenConfig, TokenError};
pub use user::{NotificationPrefs, User, UserProfile};
pub use verification::{code_ttl, EmailChangeCode, VerificationStore};
