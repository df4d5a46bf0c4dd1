//! Persistence port for workspaces and memberships.

use std::sync::Arc;

use stockroom_core::{DomainResult, UserId, WorkspaceId};

use crate::membership::WorkspaceMembership;
use crate::role::WorkspaceRole;
use crate::workspace::Workspace;

pub trait WorkspaceStore: Send + Sync {
    fn insert_workspace(&self, workspace: Workspace) -> DomainResult<()>;

    fn get_workspace(&self, id: WorkspaceId) -> Option<Workspace>;

    fn update_workspace(&self, workspace: &Workspace) -> DomainResult<()>;

    /// Delete a workspace and cascade to its memberships. Returns whether a
    /// row existed.
    fn delete_workspace(&self, id: WorkspaceId) -> bool;

    /// Insert or replace the membership for (workspace, user).
    fn upsert_membership(&self, membership: WorkspaceMembership) -> DomainResult<()>;

    fn remove_membership(&self, workspace: WorkspaceId, user: UserId) -> bool;

    fn membership(&self, workspace: WorkspaceId, user: UserId) -> Option<WorkspaceMembership>;

    fn memberships_of_user(&self, user: UserId) -> Vec<WorkspaceMembership>;

    fn members_of_workspace(&self, workspace: WorkspaceId) -> Vec<WorkspaceMembership>;

    /// How many members hold `role` in the workspace (last-owner guard).
    fn count_role(&self, workspace: WorkspaceId, role: WorkspaceRole) -> usize;
}

impl<S> WorkspaceStore for Arc<S>
where
    S: WorkspaceStore + ?Sized,
{
    fn insert_workspace(&self, workspace: Workspace) -> DomainResult<()> {
        (**self).insert_workspace(workspace)
    }

    fn get_workspace(&self, id: WorkspaceId) -> Option<Workspace> {
        (**self).get_workspace(id)
    }

    fn update_workspace(&self, workspace: &Workspace) -> DomainResult<()> {
        (**self).update_workspace(workspace)
    }

    fn delete_workspace(&self, id: WorkspaceId) -> bool {
        (**self).delete_workspace(id)
    }

    fn upsert_membership(&self, membership: WorkspaceMembership) -> DomainResult<()> {
        (**self).upsert_membership(membership)
    }

    fn remove_membership(&self, workspace: WorkspaceId, user: UserId) -> bool {
        (**self).remove_membership(workspace, user)
    }

    fn membership(&self, workspace: WorkspaceId, user: UserId) -> Option<WorkspaceMembership> {
        (**self).membership(workspace, user)
    }

    fn memberships_of_user(&self, user: UserId) -> Vec<WorkspaceMembership> {
        (**self).memberships_of_user(user)
    }

    fn members_of_workspace(&self, workspace: WorkspaceId) -> Vec<WorkspaceMembership> {
        (**self).members_of_workspace(workspace)
    }

    fn count_role(&self, workspace: WorkspaceId, role: WorkspaceRole) -> usize {
        (**self).count_role(workspace, role)
    }
}
