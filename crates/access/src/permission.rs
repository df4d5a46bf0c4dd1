//! The permission resolution engine.
//!
//! A pure policy function: no IO, no panics, no business logic. Workspace
//! role is *never* consulted here; it governs structural management only
//! (see [`crate::manage`]).

use serde::Serialize;
use std::fmt;

use stockroom_core::UserId;
use stockroom_inventory::{Category, CategoryPermission, GrantLevel};

/// Effective permission on a category, ordered `none < view < edit < admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    None = 0,
    View = 1,
    Edit = 2,
    Admin = 3,
}

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::View => "view",
            Self::Edit => "edit",
            Self::Admin => "admin",
        }
    }

    pub fn allows_view(&self) -> bool {
        *self >= Self::View
    }

    pub fn allows_edit(&self) -> bool {
        *self >= Self::Edit
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<GrantLevel> for PermissionLevel {
    fn from(level: GrantLevel) -> Self {
        match level {
            GrantLevel::View => Self::View,
            GrantLevel::Edit => Self::Edit,
            GrantLevel::Admin => Self::Admin,
        }
    }
}

/// Resolve a user's effective permission on a category. First match wins:
///
/// 1. owner → `admin`
/// 2. explicit grant → that grant's level
/// 3. public category → `view`
/// 4. otherwise → `none`
///
/// Grant levels start at `view`, so a grant can never lower the access a
/// public category already provides.
pub fn resolve(
    user: UserId,
    category: &Category,
    grant: Option<&CategoryPermission>,
) -> PermissionLevel {
    if category.owner == user {
        return PermissionLevel::Admin;
    }

    if let Some(grant) = grant {
        if grant.user_id == user && grant.category_id == category.id {
            return grant.level.into();
        }
    }

    if category.public {
        return PermissionLevel::View;
    }

    PermissionLevel::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::WorkspaceId;

    fn category(owner: UserId, public: bool) -> Category {
        let mut c = Category::new(WorkspaceId::new(), "Pantry", owner);
        c.public = public;
        c
    }

    fn grant(category: &Category, user: UserId, level: GrantLevel) -> CategoryPermission {
        CategoryPermission::new(category.id, user, level, category.owner)
    }

    #[test]
    fn owner_is_always_admin() {
        let owner = UserId::new();
        let c = category(owner, false);

        assert_eq!(resolve(owner, &c, None), PermissionLevel::Admin);

        // Even a lower explicit grant cannot demote the owner.
        let g = grant(&c, owner, GrantLevel::View);
        assert_eq!(resolve(owner, &c, Some(&g)), PermissionLevel::Admin);
    }

    #[test]
    fn admin_only_through_ownership_or_grant() {
        let owner = UserId::new();
        let other = UserId::new();
        let c = category(owner, true);

        // Public without a grant caps at view.
        assert_eq!(resolve(other, &c, None), PermissionLevel::View);

        let g = grant(&c, other, GrantLevel::Admin);
        assert_eq!(resolve(other, &c, Some(&g)), PermissionLevel::Admin);
    }

    #[test]
    fn explicit_grant_beats_public_flag() {
        let owner = UserId::new();
        let user = UserId::new();
        let c = category(owner, true);

        let g = grant(&c, user, GrantLevel::Edit);
        assert_eq!(resolve(user, &c, Some(&g)), PermissionLevel::Edit);
    }

    #[test]
    fn public_never_resolves_to_none() {
        let owner = UserId::new();
        let user = UserId::new();
        let c = category(owner, true);

        // With or without a grant, public access is at least view;
        // grants never lower public access.
        assert!(resolve(user, &c, None).allows_view());
        for level in [GrantLevel::View, GrantLevel::Edit, GrantLevel::Admin] {
            let g = grant(&c, user, level);
            assert!(resolve(user, &c, Some(&g)).allows_view());
        }
    }

    #[test]
    fn private_without_grant_is_none() {
        let c = category(UserId::new(), false);
        assert_eq!(resolve(UserId::new(), &c, None), PermissionLevel::None);
    }

    #[test]
    fn mismatched_grant_rows_are_ignored() {
        let owner = UserId::new();
        let user = UserId::new();
        let c = category(owner, false);

        // A grant for a different user must not apply.
        let g = grant(&c, UserId::new(), GrantLevel::Admin);
        assert_eq!(resolve(user, &c, Some(&g)), PermissionLevel::None);

        // Nor a grant for a different category.
        let other_category = category(owner, false);
        let g = grant(&other_category, user, GrantLevel::Admin);
        assert_eq!(resolve(user, &c, Some(&g)), PermissionLevel::None);
    }

    #[test]
    fn levels_are_totally_ordered() {
        assert!(PermissionLevel::Admin > PermissionLevel::Edit);
        assert!(PermissionLevel::Edit > PermissionLevel::View);
        assert!(PermissionLevel::View > PermissionLevel::None);
        assert!(!PermissionLevel::View.allows_edit());
        assert!(PermissionLevel::Edit.allows_view());
    }
}
