//! Workspace membership: (user, workspace, role).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{UserId, WorkspaceId};

use crate::role::WorkspaceRole;

/// One user's membership in one workspace. A user may belong to any number
/// of workspaces, each with an independent role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceMembership {
    pub user_id: UserId,
    pub workspace_id: WorkspaceId,
    pub role: WorkspaceRole,
    pub joined_at: DateTime<Utc>,
}

impl WorkspaceMembership {
    pub fn new(user_id: UserId, workspace_id: WorkspaceId, role: WorkspaceRole) -> Self {
        Self {
            user_id,
            workspace_id,
            role,
            joined_at: Utc::now(),
        }
    }
}
