//! Client-held session state and the refresh-then-retry contract.
//!
//! The client session owns the durable copies of both tokens and the cached
//! user identity. It is an explicit context object (call sites go through
//! it rather than reading ambient global state) and it tolerates the
//! backing store being empty, partially populated, or stale.

use std::sync::{Arc, RwLock};

use stockroom_core::{DomainError, DomainResult};

use crate::session::SessionManager;
use crate::user::UserProfile;

/// Durable key-value storage on the client side (survives restarts).
pub trait ClientStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

impl<S> ClientStorage for Arc<S>
where
    S: ClientStorage + ?Sized,
{
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

pub const ACCESS_TOKEN_KEY: &str = "session.access_token";
pub const REFRESH_TOKEN_KEY: &str = "session.refresh_token";
pub const USER_KEY: &str = "session.user";

/// Client-side session: `Anonymous` or `Authenticated`.
pub struct ClientSession {
    manager: Arc<SessionManager>,
    storage: Arc<dyn ClientStorage>,
    user: RwLock<Option<UserProfile>>,
}

impl ClientSession {
    pub fn new(manager: Arc<SessionManager>, storage: Arc<dyn ClientStorage>) -> Self {
        Self {
            manager,
            storage,
            user: RwLock::new(None),
        }
    }

    /// Rehydrate from durable storage on startup.
    ///
    /// Returns the restored identity, or `None` (leaving the session
    /// `Anonymous`) when the store is empty or holds an unusable partial
    /// state, in which case the leftovers are cleared.
    pub fn restore(&self) -> Option<UserProfile> {
        let user: Option<UserProfile> = self
            .storage
            .get(USER_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok());
        let has_refresh = self.storage.get(REFRESH_TOKEN_KEY).is_some();

        match (user, has_refresh) {
            (Some(user), true) => {
                *self.user.write().unwrap_or_else(|e| e.into_inner()) = Some(user.clone());
                Some(user)
            }
            _ => {
                self.clear();
                None
            }
        }
    }

    pub fn login(&self, username: &str, secret: &str) -> DomainResult<UserProfile> {
        let response = self.manager.login(username, secret)?;
        self.persist(&response.user, &response.tokens.access.token, &response.tokens.refresh.token);
        Ok(response.user)
    }

    /// Drop the session locally and clear the persisted refresh token.
    /// Idempotent: logging out an anonymous session is a no-op.
    pub fn logout(&self) {
        if let Some(user) = self.current_user() {
            self.manager.logout(user.id);
        }
        self.clear();
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.user
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.storage.get(ACCESS_TOKEN_KEY)
    }

    /// Run an operation under the at-most-one-retry rule.
    ///
    /// `AccessTokenExpired` triggers exactly one refresh attempt followed by
    /// exactly one retry of the operation. If the refresh itself fails, the
    /// session transitions to `Anonymous`, local state is discarded, and the
    /// refresh error propagates. Any other error passes through untouched;
    /// this is what prevents infinite refresh loops.
    pub fn run<T>(&self, mut op: impl FnMut(&str) -> DomainResult<T>) -> DomainResult<T> {
        // A partially populated store (refresh token but no access token,
        // e.g. a crash between writes) spends its one refresh up front.
        let (token, already_refreshed) = match self.access_token() {
            Some(token) => (token, false),
            None if self.storage.get(REFRESH_TOKEN_KEY).is_some() => (self.refresh()?, true),
            None => return Err(DomainError::InvalidCredentials),
        };

        match op(&token) {
            Err(DomainError::AccessTokenExpired) if !already_refreshed => {
                let fresh = self.refresh()?;
                op(&fresh)
            }
            other => other,
        }
    }

    /// Exchange the stored refresh token for a new access token. On any
    /// failure the session is torn down to `Anonymous`.
    pub fn refresh(&self) -> DomainResult<String> {
        let refresh_token = match self.storage.get(REFRESH_TOKEN_KEY) {
            Some(t) => t,
            None => {
                self.clear();
                return Err(DomainError::RefreshTokenExpired);
            }
        };

        match self.manager.refresh(&refresh_token) {
            Ok(issued) => {
                self.storage.set(ACCESS_TOKEN_KEY, &issued.token);
                Ok(issued.token)
            }
            Err(e) => {
                tracing::debug!(error = %e, "refresh failed; dropping client session");
                self.clear();
                Err(e)
            }
        }
    }

    fn persist(&self, user: &UserProfile, access: &str, refresh: &str) {
        self.storage.set(ACCESS_TOKEN_KEY, access);
        self.storage.set(REFRESH_TOKEN_KEY, refresh);
        if let Ok(raw) = serde_json::to_string(user) {
            self.storage.set(USER_KEY, &raw);
        }
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = Some(user.clone());
    }

    fn clear(&self) {
        self.storage.remove(ACCESS_TOKEN_KEY);
        self.storage.remove(REFRESH_TOKEN_KEY);
        self.storage.remove(USER_KEY);
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NotificationKind, Notifier, NotifyError};
    use crate::password::CredentialHasher;
    use crate::session::RegisterRequest;
    use crate::store::UserStore;
    use crate::token::{TokenCodec, TokenConfig};
    use crate::user::User;
    use crate::verification::{EmailChangeCode, VerificationStore};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use stockroom_core::UserId;

    #[derive(Default)]
    struct MemStore {
        users: std::sync::RwLock<HashMap<UserId, User>>,
        refresh: std::sync::RwLock<HashMap<UserId, String>>,
    }

    impl UserStore for MemStore {
        fn insert(&self, user: User) -> stockroom_core::DomainResult<()> {
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

        fn update(&self, user: &User) -> stockroom_core::DomainResult<()> {
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
    struct NoVerifications;

    impl VerificationStore for NoVerifications {
        fn replace(&self, _code: EmailChangeCode) {}
        fn get(&self, _user: UserId) -> Option<EmailChangeCode> {
            None
        }
        fn mark_verified(&self, _user: UserId) -> bool {
            false
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

    /// KV store that counts writes, so tests can observe refresh traffic.
    #[derive(Default)]
    struct CountingStorage {
        map: std::sync::RwLock<HashMap<String, String>>,
        access_token_writes: AtomicUsize,
    }

    impl ClientStorage for CountingStorage {
        fn get(&self, key: &str) -> Option<String> {
            self.map.read().unwrap().get(key).cloned()
        }

        fn set(&self, key: &str, value: &str) {
            if key == ACCESS_TOKEN_KEY {
                self.access_token_writes.fetch_add(1, Ordering::SeqCst);
            }
            self.map
                .write()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }

        fn remove(&self, key: &str) {
            self.map.write().unwrap().remove(key);
        }
    }

    fn setup() -> (Arc<SessionManager>, Arc<CountingStorage>, ClientSession) {
        let manager = Arc::new(SessionManager::new(
            Arc::new(MemStore::default()),
            Arc::new(NoVerifications),
            Arc::new(NullNotifier),
            TokenCodec::new(TokenConfig::new(*b"test-secret-key-at-least-32-byte")),
            CredentialHasher::with_params(1024, 1, 1).unwrap(),
        ));
        let storage = Arc::new(CountingStorage::default());
        let session = ClientSession::new(manager.clone(), storage.clone());

        manager
            .register(RegisterRequest {
                username: "alice".to_string(),
                name: "Alice".to_string(),
                secret: "password123".to_string(),
                email: "alice@example.com".to_string(),
            })
            .unwrap();

        (manager, storage, session)
    }

    #[test]
    fn expired_access_triggers_exactly_one_refresh_and_one_retry() {
        let (_, storage, session) = setup();
        session.login("alice", "password123").unwrap();
        let writes_after_login = storage.access_token_writes.load(Ordering::SeqCst);

        let calls = AtomicUsize::new(0);
        let result = session.run(|_token| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(DomainError::AccessTokenExpired)
            } else {
                Ok("payload")
            }
        });

        assert_eq!(result.unwrap(), "payload");
        // Operation ran twice: original call plus the single retry.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // Exactly one refresh wrote exactly one new access token.
        assert_eq!(
            storage.access_token_writes.load(Ordering::SeqCst),
            writes_after_login + 1
        );
    }

    #[test]
    fn persistent_expiry_does_not_loop() {
        let (_, _, session) = setup();
        session.login("alice", "password123").unwrap();

        let calls = AtomicUsize::new(0);
        let result: DomainResult<()> = session.run(|_token| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DomainError::AccessTokenExpired)
        });

        // Second expiry propagates; no further refresh attempts.
        assert_eq!(result.unwrap_err(), DomainError::AccessTokenExpired);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_refresh_drops_to_anonymous() {
        let (manager, _, session) = setup();
        session.login("alice", "password123").unwrap();

        // A login elsewhere rotates the refresh token out from under us.
        manager.login("alice", "password123").unwrap();

        let result: DomainResult<()> =
            session.run(|_token| Err(DomainError::AccessTokenExpired));

        assert_eq!(result.unwrap_err(), DomainError::Superseded);
        assert!(!session.is_authenticated());
        assert_eq!(session.access_token(), None);
    }

    #[test]
    fn restore_tolerates_empty_and_partial_state() {
        let (_, storage, session) = setup();
        assert!(session.restore().is_none());

        // Partial state: user blob without tokens is unusable and cleared.
        storage.set(USER_KEY, "{\"not\": \"a profile\"}");
        assert!(session.restore().is_none());
        assert_eq!(storage.get(USER_KEY), None);
    }

    #[test]
    fn restore_recovers_a_full_session() {
        let (_, storage, session) = setup();
        session.login("alice", "password123").unwrap();

        // Simulate process restart: fresh session over the same storage.
        let manager = session.manager.clone();
        let restarted = ClientSession::new(manager, storage);
        let user = restarted.restore().unwrap();
        assert_eq!(user.username, "alice");
        assert!(restarted.is_authenticated());
    }

    #[test]
    fn anonymous_run_fails_without_tokens() {
        let (_, _, session) = setup();
        let result: DomainResult<()> = session.run(|_| Ok(()));
        assert_eq!(result.unwrap_err(), DomainError::InvalidCredentials);
    }

    #[test]
    fn missing_access_token_is_recovered_from_the_refresh_token() {
        let (_, storage, session) = setup();
        session.login("alice", "password123").unwrap();

        // Partial store: the access token write was lost.
        storage.remove(ACCESS_TOKEN_KEY);

        let result = session.run(|_token| Ok("payload"));
        assert_eq!(result.unwrap(), "payload");
        assert!(session.access_token().is_some());
    }
}
