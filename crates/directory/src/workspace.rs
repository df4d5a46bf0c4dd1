//! Workspace: the tenant boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use stockroom_core::{UserId, WorkspaceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    #[default]
    Free,
    Team,
    Business,
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Free => "free",
            Self::Team => "team",
            Self::Business => "business",
        };
        f.write_str(s)
    }
}

/// Tenant boundary. All categories and items belong to exactly one workspace;
/// cross-workspace references are forbidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub plan: PlanTier,
    pub archived: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Workspace {
    pub fn new(name: impl Into<String>, plan: PlanTier, created_by: UserId) -> Self {
        Self {
            id: WorkspaceId::new(),
            name: name.into(),
            plan,
            archived: false,
            created_by,
            created_at: Utc::now(),
        }
    }
}
