//! Append-only usage ledger.
//!
//! Every quantity change produces a ledger entry, so an item's current
//! quantity is always reconstructible as the running sum of its deltas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{ItemId, RecordId, UserId, WorkspaceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    /// Stock arriving (restock, initial stock, upward correction).
    In,
    /// Stock leaving (consumption, downward correction).
    Out,
}

impl UsageKind {
    /// Sign a magnitude according to the record kind.
    pub fn signed(&self, quantity: u32) -> i64 {
        match self {
            Self::In => i64::from(quantity),
            Self::Out => -i64::from(quantity),
        }
    }
}

/// One immutable ledger entry. Records are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: RecordId,
    pub item_id: ItemId,
    pub workspace_id: WorkspaceId,
    pub kind: UsageKind,
    /// Signed quantity change; negative for `out`.
    pub delta: i64,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(
        item_id: ItemId,
        workspace_id: WorkspaceId,
        kind: UsageKind,
        quantity: u32,
        actor: UserId,
    ) -> Self {
        Self {
            id: RecordId::new(),
            item_id,
            workspace_id,
            kind,
            delta: kind.signed(quantity),
            actor,
            occurred_at: Utc::now(),
        }
    }

    /// Reconciling entry for a direct quantity edit; kind follows the sign.
    pub fn adjustment(
        item_id: ItemId,
        workspace_id: WorkspaceId,
        delta: i64,
        actor: UserId,
    ) -> Self {
        let kind = if delta >= 0 { UsageKind::In } else { UsageKind::Out };
        Self {
            id: RecordId::new(),
            item_id,
            workspace_id,
            kind,
            delta,
            actor,
            occurred_at: Utc::now(),
        }
    }
}

/// Sum of all deltas; must equal the item's stored quantity.
pub fn running_total<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> i64 {
    records.into_iter().map(|r| r.delta).sum()
}
