//! In-memory category/item stores.
//!
//! Items and their ledger share a single mutex so the conditional quantity
//! write and the usage-record append commit together, the in-memory
//! equivalent of a storage transaction.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use stockroom_core::{
    CategoryId, DomainError, DomainResult, ExpectedVersion, ItemId, UserId, WorkspaceId,
};
use stockroom_inventory::{
    Category, CategoryPermission, CategoryStore, Item, ItemStore, UsageRecord,
};

#[derive(Debug, Default)]
pub struct MemoryCategoryStore {
    categories: RwLock<HashMap<(WorkspaceId, CategoryId), Category>>,
    grants: RwLock<HashMap<(CategoryId, UserId), CategoryPermission>>,
}

impl MemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CategoryStore for MemoryCategoryStore {
    fn insert(&self, category: Category) -> DomainResult<()> {
        let mut categories = self
            .categories
            .write()
            .map_err(|_| DomainError::conflict("category store poisoned"))?;
        categories.insert((category.workspace_id, category.id), category);
        Ok(())
    }

    fn get(&self, workspace: WorkspaceId, id: CategoryId) -> Option<Category> {
        self.categories.read().ok()?.get(&(workspace, id)).cloned()
    }

    fn update(&self, category: &Category) -> DomainResult<()> {
        let mut categories = self
            .categories
            .write()
            .map_err(|_| DomainError::conflict("category store poisoned"))?;
        let key = (category.workspace_id, category.id);
        if !categories.contains_key(&key) {
            return Err(DomainError::NotFound);
        }
        categories.insert(key, category.clone());
        Ok(())
    }

    fn delete(&self, workspace: WorkspaceId, id: CategoryId) -> bool {
        // Grants cascade with the category row.
        if let Ok(mut grants) = self.grants.write() {
            grants.retain(|(category, _), _| *category != id);
        }
        self.categories
            .write()
            .map(|mut map| map.remove(&(workspace, id)).is_some())
            .unwrap_or(false)
    }

    fn list(&self, workspace: WorkspaceId) -> Vec<Category> {
        self.categories
            .read()
            .map(|map| {
                map.iter()
                    .filter_map(|((ws, _), c)| (*ws == workspace).then(|| c.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn find_by_share_token(&self, token: &str) -> Option<Category> {
        self.categories
            .read()
            .ok()?
            .values()
            .find(|c| c.share_token.as_deref() == Some(token))
            .cloned()
    }

    fn upsert_grant(&self, grant: CategoryPermission) {
        if let Ok(mut grants) = self.grants.write() {
            grants.insert((grant.category_id, grant.user_id), grant);
        }
    }

    fn remove_grant(&self, category: CategoryId, user: UserId) -> bool {
        self.grants
            .write()
            .map(|mut map| map.remove(&(category, user)).is_some())
            .unwrap_or(false)
    }

    fn grant(&self, category: CategoryId, user: UserId) -> Option<CategoryPermission> {
        self.grants.read().ok()?.get(&(category, user)).cloned()
    }

    fn grants_for(&self, category: CategoryId) -> Vec<CategoryPermission> {
        self.grants
            .read()
            .map(|map| {
                map.values()
                    .filter(|g| g.category_id == category)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn owned_by(&self, user: UserId) -> Vec<Category> {
        self.categories
            .read()
            .map(|map| map.values().filter(|c| c.owner == user).cloned().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct ItemsInner {
    items: HashMap<(WorkspaceId, ItemId), Item>,
    ledger: Vec<UsageRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryItemStore {
    inner: Mutex<ItemsInner>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> DomainResult<std::sync::MutexGuard<'_, ItemsInner>> {
        self.inner
            .lock()
            .map_err(|_| DomainError::conflict("item store poisoned"))
    }

    fn write_conditional(
        inner: &mut ItemsInner,
        item: &Item,
        expected: ExpectedVersion,
    ) -> DomainResult<Item> {
        let key = (item.workspace_id, item.id);
        let stored = inner.items.get(&key).ok_or(DomainError::NotFound)?;
        expected.check(stored.version)?;

        let mut updated = item.clone();
        updated.version = stored.version + 1;
        inner.items.insert(key, updated.clone());
        Ok(updated)
    }
}

impl ItemStore for MemoryItemStore {
    fn insert(&self, item: Item) -> DomainResult<()> {
        let mut inner = self.lock()?;
        inner.items.insert((item.workspace_id, item.id), item);
        Ok(())
    }

    fn get(&self, workspace: WorkspaceId, id: ItemId) -> Option<Item> {
        self.inner.lock().ok()?.items.get(&(workspace, id)).cloned()
    }

    fn update(&self, item: &Item, expected: ExpectedVersion) -> DomainResult<Item> {
        let mut inner = self.lock()?;
        Self::write_conditional(&mut inner, item, expected)
    }

    fn apply_usage(
        &self,
        item: &Item,
        expected: ExpectedVersion,
        record: UsageRecord,
    ) -> DomainResult<Item> {
        let mut inner = self.lock()?;
        // Version check first; a conflict leaves the ledger untouched.
        let updated = Self::write_conditional(&mut inner, item, expected)?;
        inner.ledger.push(record);
        Ok(updated)
    }

    fn delete(&self, workspace: WorkspaceId, id: ItemId) -> bool {
        self.inner
            .lock()
            .map(|mut inner| inner.items.remove(&(workspace, id)).is_some())
            .unwrap_or(false)
    }

    fn list_by_category(&self, workspace: WorkspaceId, category: CategoryId) -> Vec<Item> {
        self.inner
            .lock()
            .map(|inner| {
                inner
                    .items
                    .iter()
                    .filter_map(|((ws, _), item)| {
                        (*ws == workspace && item.category_id == category).then(|| item.clone())
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn delete_by_category(&self, workspace: WorkspaceId, category: CategoryId) -> usize {
        self.inner
            .lock()
            .map(|mut inner| {
                let before = inner.items.len();
                inner
                    .items
                    .retain(|(ws, _), item| !(*ws == workspace && item.category_id == category));
                before - inner.items.len()
            })
            .unwrap_or(0)
    }

    fn usage_for_item(&self, workspace: WorkspaceId, item: ItemId) -> Vec<UsageRecord> {
        self.inner
            .lock()
            .map(|inner| {
                inner
                    .ledger
                    .iter()
                    .filter(|r| r.workspace_id == workspace && r.item_id == item)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_inventory::UsageKind;

    fn seeded_item(store: &MemoryItemStore, workspace: WorkspaceId, quantity: u32) -> Item {
        let item = Item::new(workspace, CategoryId::new(), "Rice", quantity, UserId::new());
        store.insert(item.clone()).unwrap();
        item
    }

    #[test]
    fn conditional_update_rejects_stale_versions() {
        let store = MemoryItemStore::new();
        let ws = WorkspaceId::new();
        let item = seeded_item(&store, ws, 10);

        let mut first = item.clone();
        first.quantity = 9;
        store.update(&first, ExpectedVersion::Exact(0)).unwrap();

        // A second writer still holding version 0 must conflict.
        let mut second = item.clone();
        second.quantity = 8;
        let err = store.update(&second, ExpectedVersion::Exact(0)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(store.get(ws, item.id).unwrap().quantity, 9);
    }

    #[test]
    fn apply_usage_commits_quantity_and_ledger_together() {
        let store = MemoryItemStore::new();
        let ws = WorkspaceId::new();
        let item = seeded_item(&store, ws, 10);

        let mut updated = item.clone();
        updated.quantity = 7;
        let record = UsageRecord::new(item.id, ws, UsageKind::Out, 3, UserId::new());
        store
            .apply_usage(&updated, ExpectedVersion::Exact(0), record)
            .unwrap();

        assert_eq!(store.get(ws, item.id).unwrap().quantity, 7);
        assert_eq!(store.usage_for_item(ws, item.id).len(), 1);
    }

    #[test]
    fn conflicting_apply_usage_writes_no_ledger_entry() {
        let store = MemoryItemStore::new();
        let ws = WorkspaceId::new();
        let item = seeded_item(&store, ws, 10);

        let mut updated = item.clone();
        updated.quantity = 7;
        let record = UsageRecord::new(item.id, ws, UsageKind::Out, 3, UserId::new());
        let err = store
            .apply_usage(&updated, ExpectedVersion::Exact(5), record)
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(store.usage_for_item(ws, item.id).is_empty());
        assert_eq!(store.get(ws, item.id).unwrap().quantity, 10);
    }

    #[test]
    fn items_never_leak_across_workspaces() {
        let store = MemoryItemStore::new();
        let (w1, w2) = (WorkspaceId::new(), WorkspaceId::new());
        let item = seeded_item(&store, w1, 10);

        assert!(store.get(w2, item.id).is_none());
        assert!(store.usage_for_item(w2, item.id).is_empty());
    }

    #[test]
    fn categories_with_identical_names_stay_tenant_scoped() {
        let store = MemoryCategoryStore::new();
        let (w1, w2) = (WorkspaceId::new(), WorkspaceId::new());
        store
            .insert(Category::new(w1, "Pantry", UserId::new()))
            .unwrap();
        store
            .insert(Category::new(w2, "Pantry", UserId::new()))
            .unwrap();

        let in_w1 = store.list(w1);
        assert_eq!(in_w1.len(), 1);
        assert!(in_w1.iter().all(|c| c.workspace_id == w1));
    }
}
