//! `stockroom-infra` — adapters behind the domain ports.
//!
//! In-memory implementations of every persistence port (tests/dev; a SQL
//! backend would slot in behind the same traits), plus the client-side
//! key-value store and the best-effort notification channel.

pub mod client_store;
pub mod memory;
pub mod notify;

pub use client_store::MemoryClientStorage;
pub use memory::{
    MemoryCategoryStore, MemoryItemStore, MemoryUserStore, MemoryVerificationStore,
    MemoryWorkspaceStore,
};
pub use notify::TracingNotifier;
