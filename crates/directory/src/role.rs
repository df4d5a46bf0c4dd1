//! Workspace membership roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Membership role, totally ordered by privilege:
/// `owner > admin > member > viewer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceRole {
    Viewer = 1,
    Member = 2,
    Admin = 3,
    Owner = 4,
}

impl WorkspaceRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "viewer" => Some(Self::Viewer),
            "member" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Member => "member",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    /// Numeric privilege rank; a missing role ranks 0 and fails every check.
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn has_at_least(&self, required: WorkspaceRole) -> bool {
        *self >= required
    }
}

impl fmt::Display for WorkspaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role comparison over a possibly-absent membership: unknown/missing role
/// compares as rank 0.
pub fn meets(role: Option<WorkspaceRole>, required: WorkspaceRole) -> bool {
    role.map_or(0, |r| r.rank()) >= required.rank()
}
