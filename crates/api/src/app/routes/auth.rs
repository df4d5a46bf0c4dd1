use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use stockroom_auth::RegisterRequest;

use crate::app::{dto, errors, AppServices};
use crate::context::CurrentUser;

/// Routes reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Routes behind the auth middleware.
pub fn protected_router() -> Router {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/account", delete(delete_account))
        .route("/auth/email-change", post(request_email_change))
        .route("/auth/email-change/confirm", post(confirm_email_change))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterBody>,
) -> axum::response::Response {
    let request = RegisterRequest {
        username: body.username,
        name: body.name,
        secret: body.password,
        email: body.email,
    };

    match services.session.register(request) {
        Ok(response) => {
            (StatusCode::CREATED, Json(dto::auth_to_json(&response))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginBody>,
) -> axum::response::Response {
    match services.session.login(&body.username, &body.password) {
        Ok(response) => (StatusCode::OK, Json(dto::auth_to_json(&response))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RefreshBody>,
) -> axum::response::Response {
    match services.session.refresh(&body.refresh_token) {
        Ok(issued) => (StatusCode::OK, Json(dto::access_token_to_json(&issued))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> axum::response::Response {
    services.session.logout(user.id);
    StatusCode::NO_CONTENT.into_response()
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> axum::response::Response {
    match services.session.user_profile(user.id) {
        Some(profile) => (StatusCode::OK, Json(dto::user_to_json(&profile))).into_response(),
        None => errors::domain_error_to_response(stockroom_core::DomainError::NotFound),
    }
}

pub async fn delete_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> axum::response::Response {
    match services.delete_account(user.id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn request_email_change(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<dto::EmailChangeBody>,
) -> axum::response::Response {
    match services.session.request_email_change(user.id, &body.email) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn confirm_email_change(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<dto::EmailConfirmBody>,
) -> axum::response::Response {
    match services.session.confirm_email_change(user.id, &body.code) {
        Ok(profile) => (StatusCode::OK, Json(dto::user_to_json(&profile))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
