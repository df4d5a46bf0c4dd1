//! The tenant directory: workspace listings, the active-workspace context,
//! and membership management.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use stockroom_auth::ClientStorage;
use stockroom_core::{DomainError, DomainResult, UserId, WorkspaceId};

use crate::membership::WorkspaceMembership;
use crate::role::{meets, WorkspaceRole};
use crate::store::WorkspaceStore;
use crate::workspace::{PlanTier, Workspace};

/// Client-storage key prefix for the persisted active-workspace pointer.
/// The user id is appended so a shared store never bleeds across identities.
pub const ACTIVE_WORKSPACE_KEY: &str = "directory.active_workspace";

/// One row of a user's workspace listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceListing {
    pub workspace: Workspace,
    pub role: WorkspaceRole,
}

/// Directory of workspaces and the per-user active-workspace context.
///
/// Listings are cached per user; a non-forced call while a cached list is
/// present never re-fetches (repeated mounts stay cheap), and `force` always
/// bypasses. The active-workspace pointer is mirrored to durable client
/// storage so it survives restart.
pub struct TenantDirectory {
    store: Arc<dyn WorkspaceStore>,
    client: Arc<dyn ClientStorage>,
    cache: RwLock<HashMap<UserId, Vec<WorkspaceListing>>>,
    active: RwLock<HashMap<UserId, WorkspaceId>>,
}

impl TenantDirectory {
    pub fn new(store: Arc<dyn WorkspaceStore>, client: Arc<dyn ClientStorage>) -> Self {
        Self {
            store,
            client,
            cache: RwLock::new(HashMap::new()),
            active: RwLock::new(HashMap::new()),
        }
    }

    /// List the user's workspaces with their role in each, ordered by name
    /// for display stability.
    pub fn list_workspaces(&self, user: UserId, force: bool) -> Vec<WorkspaceListing> {
        if !force {
            if let Some(cached) = self.read_cache(user) {
                return cached;
            }
        }

        let mut listings: Vec<WorkspaceListing> = self
            .store
            .memberships_of_user(user)
            .into_iter()
            .filter_map(|m| {
                self.store.get_workspace(m.workspace_id).map(|workspace| WorkspaceListing {
                    workspace,
                    role: m.role,
                })
            })
            .collect();
        listings.sort_by(|a, b| {
            a.workspace
                .name
                .cmp(&b.workspace.name)
                .then_with(|| a.workspace.id.as_uuid().cmp(b.workspace.id.as_uuid()))
        });

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(user, listings.clone());
        }
        listings
    }

    /// Create a workspace and its first (owner) membership as one logical
    /// transaction. If the membership write fails, the workspace row is
    /// rolled back with a compensating delete so no member-less workspace is
    /// left behind.
    pub fn create_workspace(
        &self,
        name: &str,
        plan: PlanTier,
        owner: UserId,
    ) -> DomainResult<Workspace> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("workspace name cannot be empty"));
        }

        let workspace = Workspace::new(name, plan, owner);
        let workspace_id = workspace.id;
        self.store.insert_workspace(workspace.clone())?;

        let membership = WorkspaceMembership::new(owner, workspace_id, WorkspaceRole::Owner);
        if let Err(e) = self.store.upsert_membership(membership) {
            self.store.delete_workspace(workspace_id);
            tracing::error!(workspace_id = %workspace_id, error = %e, "rolled back workspace creation");
            return Err(e);
        }

        self.invalidate(owner);
        tracing::info!(workspace_id = %workspace_id, owner = %owner, "workspace created");
        Ok(workspace)
    }

    /// Switch the user's active workspace. A no-op when the workspace is
    /// already active, so downstream refetch cascades don't fire twice.
    pub fn set_active_workspace(&self, user: UserId, workspace: WorkspaceId) -> DomainResult<()> {
        if self.active_workspace(user).ok() == Some(workspace) {
            return Ok(());
        }
        if self.store.membership(workspace, user).is_none() {
            return Err(DomainError::Forbidden);
        }

        if let Ok(mut active) = self.active.write() {
            active.insert(user, workspace);
        }
        self.client
            .set(&Self::pointer_key(user), &workspace.to_string());
        Ok(())
    }

    /// The currently active workspace for the user.
    pub fn active_workspace(&self, user: UserId) -> DomainResult<WorkspaceId> {
        self.active
            .read()
            .ok()
            .and_then(|map| map.get(&user).copied())
            .ok_or(DomainError::WorkspaceNotSelected)
    }

    /// Restore the last active workspace from durable storage on startup.
    ///
    /// A stored id that no longer resolves (workspace gone, user removed)
    /// is cleared and the first available membership is used instead.
    pub fn restore(&self, user: UserId) -> Option<WorkspaceId> {
        let key = Self::pointer_key(user);
        let stored = self
            .client
            .get(&key)
            .and_then(|raw| raw.parse::<WorkspaceId>().ok());

        if let Some(id) = stored {
            if self.store.membership(id, user).is_some() {
                if let Ok(mut active) = self.active.write() {
                    active.insert(user, id);
                }
                return Some(id);
            }
            tracing::debug!(user_id = %user, workspace_id = %id, "clearing stale active-workspace pointer");
            self.client.remove(&key);
        }

        let fallback = self.list_workspaces(user, true).first().map(|l| l.workspace.id)?;
        // set_active_workspace re-persists the pointer.
        self.set_active_workspace(user, fallback).ok()?;
        Some(fallback)
    }

    /// The user's role in a workspace, if any.
    pub fn role_of(&self, workspace: WorkspaceId, user: UserId) -> Option<WorkspaceRole> {
        self.store.membership(workspace, user).map(|m| m.role)
    }

    /// Add a member. Requires the actor to hold `admin` or better; granting
    /// `owner` requires the actor to be an `owner`.
    pub fn add_member(
        &self,
        actor: UserId,
        workspace: WorkspaceId,
        user: UserId,
        role: WorkspaceRole,
    ) -> DomainResult<()> {
        self.require_manager(workspace, actor, role)?;
        if self.store.membership(workspace, user).is_some() {
            return Err(DomainError::conflict("already a member"));
        }
        self.store
            .upsert_membership(WorkspaceMembership::new(user, workspace, role))?;
        self.invalidate(user);
        Ok(())
    }

    /// Change a member's role, guarded by the last-owner invariant.
    pub fn change_role(
        &self,
        actor: UserId,
        workspace: WorkspaceId,
        user: UserId,
        new_role: WorkspaceRole,
    ) -> DomainResult<()> {
        self.require_manager(workspace, actor, new_role)?;
        let current = self
            .store
            .membership(workspace, user)
            .ok_or(DomainError::NotFound)?;

        if current.role == WorkspaceRole::Owner && new_role < WorkspaceRole::Owner {
            // Demoting an owner also needs owner privileges.
            if self.role_of(workspace, actor) != Some(WorkspaceRole::Owner) {
                return Err(DomainError::Forbidden);
            }
            self.guard_last_owner(workspace)?;
        }

        let mut updated = current;
        updated.role = new_role;
        self.store.upsert_membership(updated)?;
        self.invalidate(user);
        Ok(())
    }

    /// Remove a member. Members may remove themselves (leave); otherwise the
    /// actor needs `admin` or better. The last owner can never be removed.
    pub fn remove_member(
        &self,
        actor: UserId,
        workspace: WorkspaceId,
        user: UserId,
    ) -> DomainResult<()> {
        let target = self
            .store
            .membership(workspace, user)
            .ok_or(DomainError::NotFound)?;

        if actor != user {
            let actor_role = self.role_of(workspace, actor);
            if !meets(actor_role, WorkspaceRole::Admin) {
                return Err(DomainError::Forbidden);
            }
            if target.role == WorkspaceRole::Owner && actor_role != Some(WorkspaceRole::Owner) {
                return Err(DomainError::Forbidden);
            }
        }

        if target.role == WorkspaceRole::Owner {
            self.guard_last_owner(workspace)?;
        }

        self.store.remove_membership(workspace, user);
        self.invalidate(user);

        // Don't leave the removed user pointing at a workspace they lost.
        if self.active_workspace(user).ok() == Some(workspace) {
            if let Ok(mut active) = self.active.write() {
                active.remove(&user);
            }
            self.client.remove(&Self::pointer_key(user));
        }
        Ok(())
    }

    /// Rename or archive a workspace. Owner only.
    pub fn update_workspace(
        &self,
        actor: UserId,
        workspace: WorkspaceId,
        name: Option<String>,
        archived: Option<bool>,
    ) -> DomainResult<Workspace> {
        if self.role_of(workspace, actor) != Some(WorkspaceRole::Owner) {
            return Err(DomainError::Forbidden);
        }
        let mut row = self
            .store
            .get_workspace(workspace)
            .ok_or(DomainError::NotFound)?;

        if let Some(name) = name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("workspace name cannot be empty"));
            }
            row.name = name;
        }
        if let Some(archived) = archived {
            row.archived = archived;
        }

        self.store.update_workspace(&row)?;
        // Workspace-level changes show up in every member's listing.
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
        Ok(row)
    }

    pub fn members(&self, workspace: WorkspaceId, actor: UserId) -> DomainResult<Vec<WorkspaceMembership>> {
        if self.store.membership(workspace, actor).is_none() {
            return Err(DomainError::NotFound);
        }
        let mut members = self.store.members_of_workspace(workspace);
        members.sort_by_key(|m| *m.user_id.as_uuid());
        Ok(members)
    }

    /// Remove a user from every workspace, for account deletion.
    ///
    /// Checked up front: if the user is the last owner of a workspace that
    /// still has other members, the whole purge is rejected before anything
    /// changes. A workspace where they are the sole member is deleted
    /// outright.
    pub fn purge_user(&self, user: UserId) -> DomainResult<()> {
        let memberships = self.store.memberships_of_user(user);
        for m in &memberships {
            if m.role == WorkspaceRole::Owner
                && self.store.count_role(m.workspace_id, WorkspaceRole::Owner) <= 1
                && self.store.members_of_workspace(m.workspace_id).len() > 1
            {
                return Err(DomainError::LastOwnerRemovalRejected);
            }
        }

        for m in memberships {
            let sole_owner = m.role == WorkspaceRole::Owner
                && self.store.count_role(m.workspace_id, WorkspaceRole::Owner) <= 1;
            if sole_owner {
                self.store.delete_workspace(m.workspace_id);
            } else {
                self.store.remove_membership(m.workspace_id, user);
            }
        }

        self.invalidate(user);
        if let Ok(mut active) = self.active.write() {
            active.remove(&user);
        }
        self.client.remove(&Self::pointer_key(user));
        Ok(())
    }

    fn require_manager(
        &self,
        workspace: WorkspaceId,
        actor: UserId,
        granting: WorkspaceRole,
    ) -> DomainResult<()> {
        let actor_role = self.role_of(workspace, actor);
        if !meets(actor_role, WorkspaceRole::Admin) {
            return Err(DomainError::Forbidden);
        }
        if granting == WorkspaceRole::Owner && actor_role != Some(WorkspaceRole::Owner) {
            return Err(DomainError::Forbidden);
        }
        Ok(())
    }

    fn guard_last_owner(&self, workspace: WorkspaceId) -> DomainResult<()> {
        if self.store.count_role(workspace, WorkspaceRole::Owner) <= 1 {
            return Err(DomainError::LastOwnerRemovalRejected);
        }
        Ok(())
    }

    fn read_cache(&self, user: UserId) -> Option<Vec<WorkspaceListing>> {
        self.cache.read().ok()?.get(&user).cloned()
    }

    fn invalidate(&self, user: UserId) {
        if let Ok(mut cache) = self.cache.write() {
            cache.remove(&user);
        }
    }

    fn pointer_key(user: UserId) -> String {
        format!("{ACTIVE_WORKSPACE_KEY}.{user}")
    }
}
