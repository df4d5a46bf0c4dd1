//! `stockroom-directory` — tenant directory.
//!
//! Resolves which workspaces a user belongs to and their role in each, and
//! carries the "active workspace" context that scopes every downstream
//! resource query. Workspace role governs *structural* management; content
//! access on categories is resolved elsewhere (the access crate); the two
//! tiers are deliberately independent.

pub mod directory;
pub mod membership;
pub mod role;
pub mod store;
pub mod workspace;

pub use directory::{TenantDirectory, WorkspaceListing, ACTIVE_WORKSPACE_KEY};
pub use membership::WorkspaceMembership;
pub use role::{meets, WorkspaceRole};
pub use store::WorkspaceStore;
pub use workspace::{PlanTier, Workspace};
