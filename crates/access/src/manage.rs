//! Workspace-role checks for structural management.
//!
//! Creating a category, deleting any category, and editing grants are gated
//! by workspace role, not by per-category grants: `admin`/`owner` manage any
//! category in the workspace, `member` manages only categories they own,
//! `viewer` manages none. Collapsing this into [`crate::permission::resolve`]
//! would erase the difference between "can edit items in a shared category"
//! and "can delete or reconfigure that category".

use stockroom_core::UserId;
use stockroom_directory::{meets, WorkspaceRole};
use stockroom_inventory::Category;

/// Whether a member with `role` may create a category in the workspace.
/// The workspace-role gate fires before category resolution is relevant:
/// the category doesn't exist yet.
pub fn can_create_category(role: Option<WorkspaceRole>) -> bool {
    meets(role, WorkspaceRole::Member)
}

/// Whether `user` with `role` may delete or reconfigure `category`, or edit
/// its grants.
pub fn can_manage_category(
    role: Option<WorkspaceRole>,
    category: &Category,
    user: UserId,
) -> bool {
    if meets(role, WorkspaceRole::Admin) {
        return true;
    }
    meets(role, WorkspaceRole::Member) && category.owner == user
}
