//! Session lifecycle: login, registration, refresh, logout, email change.
//!
//! Per-user state machine: `Anonymous -> Authenticated -> (AccessExpired) ->
//! Authenticated | LoggedOut`. The single persisted refresh token is the only
//! mutable shared session state; overwriting it on login is the one
//! "log out everywhere" mechanism.

use std::sync::Arc;

use chrono::Utc;

use stockroom_core::{DomainError, DomainResult, UserId};

use crate::claims::AccessClaims;
use crate::notify::{send_best_effort, NotificationKind, Notifier};
use crate::password::CredentialHasher;
use crate::store::UserStore;
use crate::token::{IssuedToken, TokenCodec, TokenError};
use crate::user::{normalize_email, User, UserProfile};
use crate::verification::{EmailChangeCode, VerificationStore};

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Result of a successful login or registration: tokens plus the public user
/// record (never the digest).
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub tokens: AuthTokens,
    pub user: UserProfile,
}

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub name: String,
    pub secret: String,
    pub email: String,
}

pub struct SessionManager {
    users: Arc<dyn UserStore>,
    verifications: Arc<dyn VerificationStore>,
    notifier: Arc<dyn Notifier>,
    codec: TokenCodec,
    hasher: CredentialHasher,
}

impl SessionManager {
    pub fn new(
        users: Arc<dyn UserStore>,
        verifications: Arc<dyn VerificationStore>,
        notifier: Arc<dyn Notifier>,
        codec: TokenCodec,
        hasher: CredentialHasher,
    ) -> Self {
        Self {
            users,
            verifications,
            notifier,
            codec,
            hasher,
        }
    }

    /// Authenticate with username + secret.
    ///
    /// Unknown user and wrong password return the identical error so
    /// usernames cannot be enumerated through the login endpoint.
    pub fn login(&self, username: &str, secret: &str) -> DomainResult<AuthResponse> {
        let Some(user) = self.users.find_by_username(username.trim()) else {
            return Err(DomainError::InvalidCredentials);
        };
        if !self.hasher.verify(secret, &user.password_digest) {
            return Err(DomainError::InvalidCredentials);
        }

        let response = self.open_session(&user)?;
        tracing::info!(user_id = %user.id, username = %user.username, "user logged in");
        Ok(response)
    }

    /// Create an account, then behave like `login`.
    pub fn register(&self, req: RegisterRequest) -> DomainResult<AuthResponse> {
        let username = req.username.trim();
        if username.is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if req.name.trim().is_empty() {
            return Err(DomainError::validation("display name cannot be empty"));
        }
        let email = normalize_email(&req.email);
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }

        if self.users.find_by_email(&email).is_some() {
            return Err(DomainError::EmailTaken);
        }
        if self.users.find_by_username(username).is_some() {
            return Err(DomainError::UsernameTaken);
        }

        let digest = self.hasher.hash(&req.secret)?;
        let user = User::new(username, req.name.trim(), email, digest);
        self.users.insert(user.clone())?;

        send_best_effort(
            self.notifier.as_ref(),
            NotificationKind::Welcome,
            &user.email,
            serde_json::json!({ "name": user.name }),
        );

        let response = self.open_session(&user)?;
        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(response)
    }

    /// Exchange a live refresh token for a new access token.
    ///
    /// The refresh token itself is NOT rotated here; rotation happens on
    /// login only. A token that verifies but no longer matches the persisted
    /// value was rotated away by a concurrent login (or stolen) and fails
    /// with `Superseded`, forcing re-authentication.
    pub fn refresh(&self, refresh_token: &str) -> DomainResult<IssuedToken> {
        let claims = self.codec.verify_refresh(refresh_token).map_err(|e| match e {
            TokenError::Expired => DomainError::RefreshTokenExpired,
            _ => DomainError::validation("invalid refresh token"),
        })?;

        let persisted = self.users.refresh_token(claims.sub);
        if persisted.as_deref() != Some(refresh_token) {
            tracing::warn!(user_id = %claims.sub, "superseded refresh token presented");
            return Err(DomainError::Superseded);
        }

        let user = self.users.get(claims.sub).ok_or(DomainError::Superseded)?;
        self.codec
            .issue_access(&user, Utc::now())
            .map_err(|_| DomainError::validation("token issuance failed"))
    }

    /// Clear the persisted refresh token. Idempotent.
    pub fn logout(&self, user: UserId) {
        self.users.set_refresh_token(user, None);
        tracing::info!(user_id = %user, "user logged out");
    }

    /// Verify a bearer access token and return its claims.
    pub fn authenticate(&self, access_token: &str) -> DomainResult<AccessClaims> {
        self.codec.verify_access(access_token).map_err(|e| match e {
            TokenError::Expired => DomainError::AccessTokenExpired,
            _ => DomainError::InvalidCredentials,
        })
    }

    pub fn user_profile(&self, id: UserId) -> Option<UserProfile> {
        self.users.get(id).map(|u| u.profile())
    }

    pub fn is_admin(&self, id: UserId) -> bool {
        self.users.get(id).is_some_and(|u| u.is_admin)
    }

    /// Start a verified email change: issue a one-time code to the new
    /// address, invalidating any prior unconsumed code for this user.
    pub fn request_email_change(&self, user: UserId, new_email: &str) -> DomainResult<()> {
        let new_email = normalize_email(new_email);
        if new_email.is_empty() || !new_email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }
        let current = self.users.get(user).ok_or(DomainError::NotFound)?;
        if let Some(existing) = self.users.find_by_email(&new_email) {
            if existing.id != current.id {
                return Err(DomainError::EmailTaken);
            }
        }

        let code = EmailChangeCode::issue(user, new_email.clone(), Utc::now());
        // Store before sending: an undeliverable code is recoverable, an
        // unconfirmable one is not.
        let digits = code.code.clone();
        self.verifications.replace(code);
        send_best_effort(
            self.notifier.as_ref(),
            NotificationKind::EmailChangeCode,
            &new_email,
            serde_json::json!({ "code": digits }),
        );
        Ok(())
    }

    /// Complete a verified email change. The code is single-use: marking it
    /// verified on success prevents replay.
    pub fn confirm_email_change(&self, user: UserId, code: &str) -> DomainResult<UserProfile> {
        let pending = self.verifications.get(user).ok_or(DomainError::NotFound)?;
        let now = Utc::now();
        if pending.is_expired(now) {
            return Err(DomainError::validation("verification code expired"));
        }
        if !pending.accepts(code, now) {
            return Err(DomainError::validation("invalid verification code"));
        }

        // The address may have been claimed between request and confirm.
        if let Some(existing) = self.users.find_by_email(&pending.new_email) {
            if existing.id != user {
                return Err(DomainError::EmailTaken);
            }
        }

        let mut row = self.users.get(user).ok_or(DomainError::NotFound)?;
        self.verifications.mark_verified(user);
        row.email = pending.new_email;
        self.users.update(&row)?;
        tracing::info!(user_id = %user, "email changed");
        Ok(row.profile())
    }

    /// Delete the account: ends the session, then removes the row. Resource
    /// cascade (owned categories etc.) is the access gate's responsibility.
    pub fn delete_account(&self, user: UserId) -> DomainResult<()> {
        self.logout(user);
        if !self.users.remove(user) {
            return Err(DomainError::NotFound);
        }
        tracing::info!(user_id = %user, "account deleted");
        Ok(())
    }

    fn open_session(&self, user: &User) -> DomainResult<AuthResponse> {
        let now = Utc::now();
        let access = self
            .codec
            .issue_access(user, now)
            .map_err(|_| DomainError::validation("token issuance failed"))?;
        let refresh = self
            .codec
            .issue_refresh(user, now)
            .map_err(|_| DomainError::validation("token issuance failed"))?;

        // Single point of session invalidation: the previous refresh token,
        // wherever it lives, is dead from here on.
        self.users.set_refresh_token(user.id, Some(&refresh.token));

        Ok(AuthResponse {
            tokens: AuthTokens { access, refresh },
            user: user.profile(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotifyError;
    use crate::token::TokenConfig;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// Minimal in-crate store double; the shared adapters live in infra.
    #[derive(Default)]
    struct MemStore {
        users: RwLock<HashMap<UserId, User>>,
        refresh: RwLock<HashMap<UserId, String>>,
    }

    impl UserStore for MemStore {
        fn insert(&self, user: User) -> DomainResult<()> {
            self.users.write().unwrap().insert(user.id, user);
            Ok(())
        }

        fn get(&self, id: UserId) -> Option<User> {
            self.users.read().unwrap().get(&id).cloned()
        }

        fn find_by_username(&self, username: &str) -> Option<User> {
            self.users
                .read()
                .unwrap()
                .values()
                .find(|u| u.username == username)
                .cloned()
        }

        fn find_by_email(&self, email: &str) -> Option<User> {
            self.users
                .read()
                .unwrap()
                .values()
                .find(|u| u.email == email)
                .cloned()
        }

        fn update(&self, user: &User) -> DomainResult<()> {
            self.users.write().unwrap().insert(user.id, user.clone());
            Ok(())
        }

        fn remove(&self, id: UserId) -> bool {
            self.users.write().unwrap().remove(&id).is_some()
        }

        fn set_refresh_token(&self, user: UserId, token: Option<&str>) {
            let mut map = self.refresh.write().unwrap();
            match token {
                Some(t) => {
                    map.insert(user, t.to_string());
                }
                None => {
                    map.remove(&user);
                }
            }
        }

        fn refresh_token(&self, user: UserId) -> Option<String> {
            self.refresh.read().unwrap().get(&user).cloned()
        }
    }

    #[derive(Default)]
    struct MemVerifications {
        codes: RwLock<HashMap<UserId, EmailChangeCode>>,
    }

    impl VerificationStore for MemVerifications {
        fn replace(&self, code: EmailChangeCode) {
            self.codes.write().unwrap().insert(code.user_id, code);
        }

        fn get(&self, user: UserId) -> Option<EmailChangeCode> {
            self.codes.read().unwrap().get(&user).cloned()
        }

        fn mark_verified(&self, user: UserId) -> bool {
            match self.codes.write().unwrap().get_mut(&user) {
                Some(code) => {
                    code.verified = true;
                    true
                }
                None => false,
            }
        }
    }

    struct NullNotifier;

    impl Notifier for NullNotifier {
        fn send(
            &self,
            _kind: NotificationKind,
            _recipient: &str,
            _payload: serde_json::Value,
        ) -> Result<(), NotifyError> {
            Ok(())
        }
    }

    fn manager() -> (SessionManager, Arc<MemStore>, Arc<MemVerifications>) {
        let store = Arc::new(MemStore::default());
        let verifications = Arc::new(MemVerifications::default());
        let manager = SessionManager::new(
            store.clone(),
            verifications.clone(),
            Arc::new(NullNotifier),
            TokenCodec::new(TokenConfig::new(*b"test-secret-key-at-least-32-byte")),
            // Cheap parameters keep the test suite fast.
            CredentialHasher::with_params(1024, 1, 1).unwrap(),
        );
        (manager, store, verifications)
    }

    fn register(manager: &SessionManager, username: &str, email: &str) -> AuthResponse {
        manager
            .register(RegisterRequest {
                username: username.to_string(),
                name: "Test User".to_string(),
                secret: "password123".to_string(),
                email: email.to_string(),
            })
            .unwrap()
    }

    #[test]
    fn register_then_login() {
        let (manager, _, _) = manager();
        register(&manager, "alice", "alice@example.com");

        let response = manager.login("alice", "password123").unwrap();
        assert_eq!(response.user.username, "alice");
        assert!(manager.authenticate(&response.tokens.access.token).is_ok());
    }

    #[test]
    fn unknown_user_and_wrong_password_are_indistinguishable() {
        let (manager, _, _) = manager();
        register(&manager, "alice", "alice@example.com");

        let unknown = manager.login("nobody", "password123").unwrap_err();
        let wrong = manager.login("alice", "wrong").unwrap_err();
        assert_eq!(unknown, DomainError::InvalidCredentials);
        assert_eq!(unknown, wrong);
    }

    #[test]
    fn duplicate_email_then_username_are_rejected_in_order() {
        let (manager, _, _) = manager();
        register(&manager, "alice", "alice@example.com");

        let err = manager
            .register(RegisterRequest {
                username: "alice2".to_string(),
                name: "Alice".to_string(),
                secret: "pw".to_string(),
                email: "ALICE@example.com".to_string(),
            })
            .unwrap_err();
        assert_eq!(err, DomainError::EmailTaken);

        let err = manager
            .register(RegisterRequest {
                username: "alice".to_string(),
                name: "Alice".to_string(),
                secret: "pw".to_string(),
                email: "other@example.com".to_string(),
            })
            .unwrap_err();
        assert_eq!(err, DomainError::UsernameTaken);
    }

    #[test]
    fn login_rotates_the_refresh_token() {
        let (manager, _, _) = manager();
        let first = register(&manager, "alice", "alice@example.com");
        let r1 = first.tokens.refresh.token.clone();

        // A second login rotates R1 out.
        let second = manager.login("alice", "password123").unwrap();
        let r2 = second.tokens.refresh.token.clone();

        assert_eq!(manager.refresh(&r1).unwrap_err(), DomainError::Superseded);
        assert!(manager.refresh(&r2).is_ok());
    }

    #[test]
    fn refresh_does_not_rotate() {
        let (manager, _, _) = manager();
        let response = register(&manager, "alice", "alice@example.com");
        let refresh = response.tokens.refresh.token;

        // Two consecutive refreshes against the same token both succeed.
        assert!(manager.refresh(&refresh).is_ok());
        assert!(manager.refresh(&refresh).is_ok());
    }

    #[test]
    fn logout_is_idempotent_and_kills_refresh() {
        let (manager, store, _) = manager();
        let response = register(&manager, "alice", "alice@example.com");
        let user = response.user.id;

        manager.logout(user);
        manager.logout(user);
        assert_eq!(store.refresh_token(user), None);
        assert_eq!(
            manager.refresh(&response.tokens.refresh.token).unwrap_err(),
            DomainError::Superseded
        );
    }

    #[test]
    fn concurrent_refreshes_of_a_superseded_token_both_fail() {
        let (manager, _, _) = manager();
        let first = register(&manager, "alice", "alice@example.com");
        let r1 = first.tokens.refresh.token.clone();

        // Rotation happened elsewhere; R1 is now superseded.
        manager.login("alice", "password123").unwrap();

        let manager = Arc::new(manager);
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let manager = manager.clone();
                let r1 = r1.clone();
                std::thread::spawn(move || manager.refresh(&r1))
            })
            .collect();

        // No TOCTOU window: every concurrent caller observes Superseded.
        for handle in handles {
            assert_eq!(
                handle.join().unwrap().unwrap_err(),
                DomainError::Superseded
            );
        }
    }

    #[test]
    fn garbage_refresh_token_is_a_validation_error() {
        let (manager, _, _) = manager();
        let err = manager.refresh("not.a.token").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn email_change_happy_path() {
        let (manager, _, verifications) = manager();
        let response = register(&manager, "alice", "alice@example.com");
        let user = response.user.id;

        manager.request_email_change(user, "New@Example.com").unwrap();
        let code = verifications.get(user).unwrap().code;

        let profile = manager.confirm_email_change(user, &code).unwrap();
        assert_eq!(profile.email, "new@example.com");
    }

    #[test]
    fn email_change_code_is_single_use() {
        let (manager, _, verifications) = manager();
        let response = register(&manager, "alice", "alice@example.com");
        let user = response.user.id;

        manager.request_email_change(user, "new@example.com").unwrap();
        let code = verifications.get(user).unwrap().code;
        manager.confirm_email_change(user, &code).unwrap();

        assert!(manager.confirm_email_change(user, &code).is_err());
    }

    #[test]
    fn new_code_invalidates_the_previous_one() {
        let (manager, _, verifications) = manager();
        let response = register(&manager, "alice", "alice@example.com");
        let user = response.user.id;

        manager.request_email_change(user, "a@example.com").unwrap();
        let old_code = verifications.get(user).unwrap().code;
        manager.request_email_change(user, "b@example.com").unwrap();
        let new_code = verifications.get(user).unwrap().code;

        if old_code != new_code {
            assert!(manager.confirm_email_change(user, &old_code).is_err());
        }
        let profile = manager.confirm_email_change(user, &new_code).unwrap();
        assert_eq!(profile.email, "b@example.com");
    }

    #[test]
    fn email_change_to_taken_address_is_rejected() {
        let (manager, _, _) = manager();
        register(&manager, "alice", "alice@example.com");
        let bob = register(&manager, "bob", "bob@example.com");

        assert_eq!(
            manager
                .request_email_change(bob.user.id, "alice@example.com")
                .unwrap_err(),
            DomainError::EmailTaken
        );
    }
}
