//! Explicit per-category permission grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use stockroom_core::{CategoryId, UserId};

/// Level of an explicit grant, ordered `view < edit < admin`.
///
/// Grants start at `view`, which is why a grant can never lower the access a
/// public category already provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantLevel {
    View = 1,
    Edit = 2,
    Admin = 3,
}

impl GrantLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "view" => Some(Self::View),
            "edit" => Some(Self::Edit),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for GrantLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's explicit permission on one category. At most one grant exists
/// per (category, user) pair; writes are upserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPermission {
    pub category_id: CategoryId,
    pub user_id: UserId,
    pub level: GrantLevel,
    pub granted_by: UserId,
    pub granted_at: DateTime<Utc>,
}

impl CategoryPermission {
    pub fn new(
        category_id: CategoryId,
        user_id: UserId,
        level: GrantLevel,
        granted_by: UserId,
    ) -> Self {
        Self {
            category_id,
            user_id,
            level,
            granted_by,
            granted_at: Utc::now(),
        }
    }
}
