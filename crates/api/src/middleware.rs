use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use stockroom_core::WorkspaceId;

use crate::app::{errors, AppServices};
use crate::context::{CurrentUser, TenantContext};

/// Name of the header carrying the active workspace id on scoped routes.
pub const WORKSPACE_HEADER: &str = "x-workspace-id";

/// Bearer-token authentication. Verifies the access token and inserts a
/// [`CurrentUser`] into the request extensions.
pub async fn auth_middleware(
    State(services): State<Arc<AppServices>>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())?;

    let claims = services
        .session
        .authenticate(token)
        .map_err(errors::domain_error_to_response)?;

    let is_admin = services.session.is_admin(claims.sub);
    req.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        username: claims.username,
        name: claims.name,
        is_admin,
    });

    Ok(next.run(req).await)
}

/// Workspace scoping for category/item routes: resolves `X-Workspace-Id`
/// into a [`TenantContext`]. Absent header means no workspace is selected;
/// a workspace the caller doesn't belong to is rejected outright.
pub async fn workspace_middleware(
    State(services): State<Arc<AppServices>>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .cloned()
        .ok_or_else(|| errors::domain_error_to_response(stockroom_core::DomainError::InvalidCredentials))?;

    let raw = req
        .headers()
        .get(WORKSPACE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            errors::domain_error_to_response(stockroom_core::DomainError::WorkspaceNotSelected)
        })?;

    let workspace: WorkspaceId = raw.parse().map_err(errors::domain_error_to_response)?;

    if !user.is_admin && services.directory.role_of(workspace, user.id).is_none() {
        return Err(errors::domain_error_to_response(
            stockroom_core::DomainError::Forbidden,
        ));
    }

    req.extensions_mut().insert(TenantContext::new(workspace));
    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, Response> {
    let unauthorized =
        || errors::domain_error_to_response(stockroom_core::DomainError::InvalidCredentials);

    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(unauthorized)?;

    let header = header.to_str().map_err(|_| unauthorized())?;

    let token = header.strip_prefix("Bearer ").ok_or_else(unauthorized)?.trim();
    if token.is_empty() {
        return Err(unauthorized());
    }

    Ok(token)
}
