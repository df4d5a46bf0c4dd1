//! In-memory store adapters (RwLock/Mutex maps keyed by tenant).

mod inventory;
mod users;
mod workspaces;

pub use inventory::{MemoryCategoryStore, MemoryItemStore};
pub use users::{MemoryUserStore, MemoryVerificationStore};
pub use workspaces::MemoryWorkspaceStore;
