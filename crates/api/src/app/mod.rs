pub mod dto;
pub mod errors;
pub mod routes;

use std::sync::Arc;

use axum::{Extension, Router};

use stockroom_access::ResourceAccessGate;
use stockroom_auth::{
    CredentialHasher, SessionManager, TokenCodec, TokenConfig,
};
use stockroom_core::{DomainResult, UserId};
use stockroom_directory::TenantDirectory;
use stockroom_infra::{
    MemoryCategoryStore, MemoryClientStorage, MemoryItemStore, MemoryUserStore,
    MemoryVerificationStore, MemoryWorkspaceStore, TracingNotifier,
};

use crate::middleware;

/// Wired core components shared by every request.
pub struct AppServices {
    pub session: Arc<SessionManager>,
    pub directory: Arc<TenantDirectory>,
    pub gate: Arc<ResourceAccessGate>,
}

impl AppServices {
    /// Assemble the core over in-memory adapters.
    pub fn in_memory(token_config: TokenConfig) -> Arc<Self> {
        let users = Arc::new(MemoryUserStore::new());
        let verifications = Arc::new(MemoryVerificationStore::new());
        let workspaces = Arc::new(MemoryWorkspaceStore::new());
        let categories = Arc::new(MemoryCategoryStore::new());
        let items = Arc::new(MemoryItemStore::new());
        let client = Arc::new(MemoryClientStorage::new());

        let session = Arc::new(SessionManager::new(
            users,
            verifications,
            Arc::new(TracingNotifier),
            TokenCodec::new(token_config),
            CredentialHasher::new(),
        ));
        let directory = Arc::new(TenantDirectory::new(workspaces.clone(), client));
        let gate = Arc::new(ResourceAccessGate::new(workspaces, categories, items));

        Arc::new(Self {
            session,
            directory,
            gate,
        })
    }

    /// Delete an account and cascade its owned resources.
    ///
    /// Membership checks run first (the last-owner guard can reject the
    /// whole operation), then owned categories/items go, then the user row.
    pub fn delete_account(&self, user: UserId) -> DomainResult<()> {
        self.directory.purge_user(user)?;
        self.gate.purge_user_resources(user);
        self.session.delete_account(user)
    }
}

/// Build the full router.
///
/// Three layers of surface: public (register/login/refresh, shared links,
/// health), authenticated (account + workspace management), and
/// workspace-scoped (categories/items, which additionally need the
/// `X-Workspace-Id` header).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let public = Router::new()
        .merge(routes::auth::public_router())
        .merge(routes::shared::router())
        .merge(routes::system::router());

    let authenticated = Router::new()
        .merge(routes::auth::protected_router())
        .merge(routes::workspaces::router())
        .layer(axum::middleware::from_fn_with_state(
            services.clone(),
            middleware::auth_middleware,
        ));

    let scoped = Router::new()
        .merge(routes::categories::router())
        .merge(routes::items::router())
        .layer(axum::middleware::from_fn_with_state(
            services.clone(),
            middleware::workspace_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            services.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(scoped)
        .layer(Extension(services))
}
