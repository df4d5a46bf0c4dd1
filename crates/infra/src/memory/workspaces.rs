//! In-memory workspace/membership store.

use std::collections::HashMap;
use std::sync::RwLock;

use stockroom_core::{DomainError, DomainResult, UserId, WorkspaceId};
use stockroom_directory::{Workspace, WorkspaceMembership, WorkspaceRole, WorkspaceStore};

#[derive(Debug, Default)]
pub struct MemoryWorkspaceStore {
    workspaces: RwLock<HashMap<WorkspaceId, Workspace>>,
    memberships: RwLock<HashMap<(WorkspaceId, UserId), WorkspaceMembership>>,
}

impl MemoryWorkspaceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkspaceStore for MemoryWorkspaceStore {
    fn insert_workspace(&self, workspace: Workspace) -> DomainResult<()> {
        let mut workspaces = self
            .workspaces
            .write()
            .map_err(|_| DomainError::conflict("workspace store poisoned"))?;
        if workspaces.contains_key(&workspace.id) {
            return Err(DomainError::conflict("workspace already exists"));
        }
        workspaces.insert(workspace.id, workspace);
        Ok(())
    }

    fn get_workspace(&self, id: WorkspaceId) -> Option<Workspace> {
        self.workspaces.read().ok()?.get(&id).cloned()
    }

    fn update_workspace(&self, workspace: &Workspace) -> DomainResult<()> {
        let mut workspaces = self
            .workspaces
            .write()
            .map_err(|_| DomainError::conflict("workspace store poisoned"))?;
        if !workspaces.contains_key(&workspace.id) {
            return Err(DomainError::NotFound);
        }
        workspaces.insert(workspace.id, workspace.clone());
        Ok(())
    }

    fn delete_workspace(&self, id: WorkspaceId) -> bool {
        // Cascade memberships with the workspace row.
        if let Ok(mut memberships) = self.memberships.write() {
            memberships.retain(|(ws, _), _| *ws != id);
        }
        self.workspaces
            .write()
            .map(|mut map| map.remove(&id).is_some())
            .unwrap_or(false)
    }

    fn upsert_membership(&self, membership: WorkspaceMembership) -> DomainResult<()> {
        let mut memberships = self
            .memberships
            .write()
            .map_err(|_| DomainError::conflict("workspace store poisoned"))?;
        memberships.insert((membership.workspace_id, membership.user_id), membership);
        Ok(())
    }

    fn remove_membership(&self, workspace: WorkspaceId, user: UserId) -> bool {
        self.memberships
            .write()
            .map(|mut map| map.remove(&(workspace, user)).is_some())
            .unwrap_or(false)
    }

    fn membership(&self, workspace: WorkspaceId, user: UserId) -> Option<WorkspaceMembership> {
        self.memberships.read().ok()?.get(&(workspace, user)).cloned()
    }

    fn memberships_of_user(&self, user: UserId) -> Vec<WorkspaceMembership> {
        self.memberships
            .read()
            .map(|map| map.values().filter(|m| m.user_id == user).cloned().collect())
            .unwrap_or_default()
    }

    fn members_of_workspace(&self, workspace: WorkspaceId) -> Vec<WorkspaceMembership> {
        self.memberships
            .read()
            .map(|map| {
                map.values()
                    .filter(|m| m.workspace_id == workspace)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn count_role(&self, workspace: WorkspaceId, role: WorkspaceRole) -> usize {
        self.memberships
            .read()
            .map(|map| {
                map.values()
                    .filter(|m| m.workspace_id == workspace && m.role == role)
                    .count()
            })
            .unwrap_or(0)
    }
}
