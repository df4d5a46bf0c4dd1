//! `stockroom-inventory` — categories, items, grants, and the usage ledger.
//!
//! Pure domain records plus the persistence ports they travel through.
//! Enforcement (who may read or mutate what) lives in the access crate;
//! nothing here checks permissions.

pub mod category;
pub mod grant;
pub mod item;
pub mod ledger;
pub mod store;

pub use category::Category;
pub use grant::{CategoryPermission, GrantLevel};
pub use item::Item;
pub use ledger::{running_total, UsageKind, UsageRecord};
pub use store::{CategoryStore, ItemStore};
