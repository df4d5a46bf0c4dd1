//! Category: a grouping of items with one owner and optional sharing.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, UserId, WorkspaceId};

/// Length of the opaque link-sharing token.
const SHARE_TOKEN_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    /// Exactly one owner. Ownership is what makes `resolve` yield `admin`.
    pub owner: UserId,
    /// Informational only; confers no rights.
    pub manager: Option<UserId>,
    /// Public categories are readable by any workspace member without a grant.
    pub public: bool,
    /// Opaque token for unauthenticated link-based read access.
    pub share_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(workspace_id: WorkspaceId, name: impl Into<String>, owner: UserId) -> Self {
        Self {
            id: CategoryId::new(),
            workspace_id,
            name: name.into(),
            owner,
            manager: None,
            public: false,
            share_token: None,
            created_at: Utc::now(),
        }
    }

    /// Issue (or re-issue) the share token. Regeneration revokes the old link.
    pub fn issue_share_token(&mut self) -> String {
        let token = generate_share_token();
        self.share_token = Some(token.clone());
        token
    }

    pub fn revoke_share_token(&mut self) {
        self.share_token = None;
    }
}

/// URL-safe random token.
pub fn generate_share_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHARE_TOKEN_LEN)
        .map(char::from)
        .collect()
}
