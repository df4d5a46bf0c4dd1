//! Persistence ports for categories, grants, items, and the usage ledger.
//!
//! Every read and write is scoped by workspace id at the port, so a
//! cross-tenant row can never surface no matter what the caller does.

use std::sync::Arc;

use stockroom_core::{CategoryId, DomainResult, ExpectedVersion, ItemId, UserId, WorkspaceId};

use crate::category::Category;
use crate::grant::CategoryPermission;
use crate::item::Item;
use crate::ledger::UsageRecord;

pub trait CategoryStore: Send + Sync {
    fn insert(&self, category: Category) -> DomainResult<()>;

    fn get(&self, workspace: WorkspaceId, id: CategoryId) -> Option<Category>;

    fn update(&self, category: &Category) -> DomainResult<()>;

    /// Delete a category and cascade to its grants. Items cascade separately
    /// through [`ItemStore::delete_by_category`]. Returns whether a row
    /// existed.
    fn delete(&self, workspace: WorkspaceId, id: CategoryId) -> bool;

    fn list(&self, workspace: WorkspaceId) -> Vec<Category>;

    /// Share-token lookup is deliberately workspace-unscoped: the token is
    /// the entire credential for the unauthenticated read path.
    fn find_by_share_token(&self, token: &str) -> Option<Category>;

    /// Insert-or-replace: at most one grant per (category, user).
    fn upsert_grant(&self, grant: CategoryPermission);

    fn remove_grant(&self, category: CategoryId, user: UserId) -> bool;

    fn grant(&self, category: CategoryId, user: UserId) -> Option<CategoryPermission>;

    fn grants_for(&self, category: CategoryId) -> Vec<CategoryPermission>;

    /// All categories owned by a user, across workspaces. Used only for the
    /// ownership cascade when an account is deleted.
    fn owned_by(&self, user: UserId) -> Vec<Category>;
}

pub trait ItemStore: Send + Sync {
    fn insert(&self, item: Item) -> DomainResult<()>;

    fn get(&self, workspace: WorkspaceId, id: ItemId) -> Option<Item>;

    /// Conditional update: fails with a conflict unless the stored version
    /// matches `expected`; on success the stored version is bumped and the
    /// updated row returned.
    fn update(&self, item: &Item, expected: ExpectedVersion) -> DomainResult<Item>;

    /// Conditional update *plus* ledger append as one atomic step: the
    /// quantity write and the usage record commit together or not at all.
    fn apply_usage(
        &self,
        item: &Item,
        expected: ExpectedVersion,
        record: UsageRecord,
    ) -> DomainResult<Item>;

    fn delete(&self, workspace: WorkspaceId, id: ItemId) -> bool;

    fn list_by_category(&self, workspace: WorkspaceId, category: CategoryId) -> Vec<Item>;

    /// Cascade helper for category deletion. Returns how many items went.
    fn delete_by_category(&self, workspace: WorkspaceId, category: CategoryId) -> usize;

    /// Ledger entries for one item, oldest first.
    fn usage_for_item(&self, workspace: WorkspaceId, item: ItemId) -> Vec<UsageRecord>;
}

impl<S> CategoryStore for Arc<S>
where
    S: CategoryStore + ?Sized,
{
    fn insert(&self, category: Category) -> DomainResult<()> {
        (**self).insert(category)
    }

    fn get(&self, workspace: WorkspaceId, id: CategoryId) -> Option<Category> {
        (**self).get(workspace, id)
    }

    fn update(&self, category: &Category) -> DomainResult<()> {
        (**self).update(category)
    }

    fn delete(&self, workspace: WorkspaceId, id: CategoryId) -> bool {
        (**self).delete(workspace, id)
    }

    fn list(&self, workspace: WorkspaceId) -> Vec<Category> {
        (**self).list(workspace)
    }

    fn find_by_share_token(&self, token: &str) -> Option<Category> {
        (**self).find_by_share_token(token)
    }

    fn upsert_grant(&self, grant: CategoryPermission) {
        (**self).upsert_grant(grant)
    }

    fn remove_grant(&self, category: CategoryId, user: UserId) -> bool {
        (**self).remove_grant(category, user)
    }

    fn grant(&self, category: CategoryId, user: UserId) -> Option<CategoryPermission> {
        (**self).grant(category, user)
    }

    fn grants_for(&self, category: CategoryId) -> Vec<CategoryPermission> {
        (**self).grants_for(category)
    }

    fn owned_by(&self, user: UserId) -> Vec<Category> {
        (**self).owned_by(user)
    }
}

impl<S> ItemStore for Arc<S>
where
    S: ItemStore + ?Sized,
{
    fn insert(&self, item: Item) -> DomainResult<()> {
        (**self).insert(item)
    }

    fn get(&self, workspace: WorkspaceId, id: ItemId) -> Option<Item> {
        (**self).get(workspace, id)
    }

    fn update(&self, item: &Item, expected: ExpectedVersion) -> DomainResult<Item> {
        (**self).update(item, expected)
    }

    fn apply_usage(
        &self,
        item: &Item,
        expected: ExpectedVersion,
        record: UsageRecord,
    ) -> DomainResult<Item> {
        (**self).apply_usage(item, expected, record)
    }

    fn delete(&self, workspace: WorkspaceId, id: ItemId) -> bool {
        (**self).delete(workspace, id)
    }

    fn list_by_category(&self, workspace: WorkspaceId, category: CategoryId) -> Vec<Item> {
        (**self).list_by_category(workspace, category)
    }

    fn delete_by_category(&self, workspace: WorkspaceId, category: CategoryId) -> usize {
        (**self).delete_by_category(workspace, category)
    }

    fn usage_for_item(&self, workspace: WorkspaceId, item: ItemId) -> Vec<UsageRecord> {
        (**self).usage_for_item(workspace, item)
    }
}
