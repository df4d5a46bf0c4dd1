use stockroom_access::AccessContext;
use stockroom_core::{UserId, WorkspaceId};

/// Authenticated identity for a request, derived from the access token (plus
/// one user-row read for the superuser flag, which is never a token claim).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub is_admin: bool,
}

impl CurrentUser {
    pub fn access_context(&self, tenant: TenantContext) -> AccessContext {
        AccessContext {
            user: self.id,
            workspace: tenant.workspace_id(),
            is_admin: self.is_admin,
        }
    }
}

/// Tenant context for a request. Immutable; present on all workspace-scoped
/// routes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TenantContext {
    workspace_id: WorkspaceId,
}

impl TenantContext {
    pub fn new(workspace_id: WorkspaceId) -> Self {
        Self { workspace_id }
    }

    pub fn workspace_id(&self) -> WorkspaceId {
        self.workspace_id
    }
}
