//! In-memory user and verification-code stores.

use std::collections::HashMap;
use std::sync::RwLock;

use stockroom_auth::{EmailChangeCode, User, UserStore, VerificationStore};
use stockroom_core::{DomainError, DomainResult, UserId};

/// In-memory [`UserStore`].
///
/// The user map and the refresh-token map sit behind separate locks; refresh
/// token reads and writes each take the whole lock, so a rotation is observed
/// atomically by every concurrent `refresh` call.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
    refresh: RwLock<HashMap<UserId, String>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryUserStore {
    fn insert(&self, user: User) -> DomainResult<()> {
        let mut users = self
            .users
            .write()
            .map_err(|_| DomainError::conflict("user store poisoned"))?;

        // Backstop for the session manager's pre-checks.
        if users.values().any(|u| u.username == user.username) {
            return Err(DomainError::UsernameTaken);
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(DomainError::EmailTaken);
        }

        users.insert(user.id, user);
        Ok(())
    }

    fn get(&self, id: UserId) -> Option<User> {
        self.users.read().ok()?.get(&id).cloned()
    }

    fn find_by_username(&self, username: &str) -> Option<User> {
        self.users
            .read()
            .ok()?
            .values()
            .find(|u| u.username == username)
            .cloned()
    }

    fn find_by_email(&self, email: &str) -> Option<User> {
        self.users
            .read()
            .ok()?
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    fn update(&self, user: &User) -> DomainResult<()> {
        let mut users = self
            .users
            .write()
            .map_err(|_| DomainError::conflict("user store poisoned"))?;
        if !users.contains_key(&user.id) {
            return Err(DomainError::NotFound);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    fn remove(&self, id: UserId) -> bool {
        if let Ok(mut refresh) = self.refresh.write() {
            refresh.remove(&id);
        }
        self.users
            .write()
            .map(|mut users| users.remove(&id).is_some())
            .unwrap_or(false)
    }

    fn set_refresh_token(&self, user: UserId, token: Option<&str>) {
        if let Ok(mut map) = self.refresh.write() {
            match token {
                Some(t) => {
                    map.insert(user, t.to_string());
                }
                None => {
                    map.remove(&user);
                }
            }
        }
    }

    fn refresh_token(&self, user: UserId) -> Option<String> {
        self.refresh.read().ok()?.get(&user).cloned()
    }
}

/// In-memory [`VerificationStore`]: one active code per user.
#[derive(Debug, Default)]
pub struct MemoryVerificationStore {
    codes: RwLock<HashMap<UserId, EmailChangeCode>>,
}

impl MemoryVerificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VerificationStore for MemoryVerificationStore {
    fn replace(&self, code: EmailChangeCode) {
        if let Ok(mut codes) = self.codes.write() {
            codes.insert(code.user_id, code);
        }
    }

    fn get(&self, user: UserId) -> Option<EmailChangeCode> {
        self.codes.read().ok()?.get(&user).cloned()
    }

    fn mark_verified(&self, user: UserId) -> bool {
        match self.codes.write() {
            Ok(mut codes) => match codes.get_mut(&user) {
                Some(code) => {
                    code.verified = true;
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str, email: &str) -> User {
        User::new(username, "Test", email, "digest".to_string())
    }

    #[test]
    fn insert_enforces_unique_username_and_email() {
        let store = MemoryUserStore::new();
        store.insert(user("alice", "alice@example.com")).unwrap();

        assert_eq!(
            store.insert(user("alice", "other@example.com")).unwrap_err(),
            DomainError::UsernameTaken
        );
        assert_eq!(
            store.insert(user("alice2", "alice@example.com")).unwrap_err(),
            DomainError::EmailTaken
        );
    }

    #[test]
    fn removing_a_user_drops_their_refresh_token() {
        let store = MemoryUserStore::new();
        let u = user("alice", "alice@example.com");
        let id = u.id;
        store.insert(u).unwrap();
        store.set_refresh_token(id, Some("token"));

        assert!(store.remove(id));
        assert_eq!(store.refresh_token(id), None);
    }

    #[test]
    fn refresh_rotation_is_atomic_per_read() {
        let store = MemoryUserStore::new();
        let id = UserId::new();
        store.set_refresh_token(id, Some("r1"));
        store.set_refresh_token(id, Some("r2"));

        // Any read after rotation sees exactly the new value.
        assert_eq!(store.refresh_token(id).as_deref(), Some("r2"));
    }
}
