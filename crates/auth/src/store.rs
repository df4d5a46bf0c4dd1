//! Persistence port for users and their session state.

use std::sync::Arc;

use stockroom_core::{DomainResult, UserId};

use crate::user::User;

/// User persistence port.
///
/// Implementations must treat `set_refresh_token`/`refresh_token` as atomic
/// with respect to each other: two concurrent refresh attempts against a
/// rotated token must both observe the new value (no torn reads).
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with a conflict if the username or email is
    /// already taken (the session manager checks first; this is the backstop).
    fn insert(&self, user: User) -> DomainResult<()>;

    fn get(&self, id: UserId) -> Option<User>;

    fn find_by_username(&self, username: &str) -> Option<User>;

    fn find_by_email(&self, email: &str) -> Option<User>;

    fn update(&self, user: &User) -> DomainResult<()>;

    /// Remove a user row. Returns whether a row existed.
    fn remove(&self, id: UserId) -> bool;

    /// Persist the single live refresh token for a user, overwriting any
    /// prior value. `None` clears it (logout).
    fn set_refresh_token(&self, user: UserId, token: Option<&str>);

    /// The currently persisted refresh token, if any.
    fn refresh_token(&self, user: UserId) -> Option<String>;
}

impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    fn insert(&self, user: User) -> DomainResult<()> {
        (**self).insert(user)
    }

    fn get(&self, id: UserId) -> Option<User> {
        (**self).get(id)
    }

    fn find_by_username(&self, username: &str) -> Option<User> {
        (**self).find_by_username(username)
    }

    fn find_by_email(&self, email: &str) -> Option<User> {
        (**self).find_by_email(email)
    }

    fn update(&self, user: &User) -> DomainResult<()> {
        (**self).update(user)
    }

    fn remove(&self, id: UserId) -> bool {
        (**self).remove(id)
    }

    fn set_refresh_token(&self, user: UserId, token: Option<&str>) {
        (**self).set_refresh_token(user, token)
    }

    fn refresh_token(&self, user: UserId) -> Option<String> {
        (**self).refresh_token(user)
    }
}
