//! Inventory item.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, ItemId, UserId, WorkspaceId};

/// One tracked item. Belongs to exactly one category (and transitively one
/// workspace). Quantity is non-negative and, outside direct edits, changes
/// only through usage records so the ledger always reconciles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub workspace_id: WorkspaceId,
    pub category_id: CategoryId,
    pub name: String,
    pub quantity: u32,
    /// Optional price in minor currency units (e.g. cents).
    pub price: Option<i64>,
    pub purchased_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    /// Bumped by the store on every conditional update.
    pub version: u64,
}

impl Item {
    pub fn new(
        workspace_id: WorkspaceId,
        category_id: CategoryId,
        name: impl Into<String>,
        quantity: u32,
        created_by: UserId,
    ) -> Self {
        Self {
            id: ItemId::new(),
            workspace_id,
            category_id,
            name: name.into(),
            quantity,
            price: None,
            purchased_on: None,
            expires_on: None,
            created_by,
            created_at: Utc::now(),
            version: 0,
        }
    }
}
