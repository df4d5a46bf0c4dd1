use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use stockroom_core::{UserId, WorkspaceId};
use stockroom_directory::{PlanTier, WorkspaceRole};

use crate::app::{dto, errors, AppServices};
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/workspaces", get(list_workspaces).post(create_workspace))
        .route("/workspaces/:id", axum::routing::patch(update_workspace))
        .route("/workspaces/:id/members", get(list_members).post(add_member))
        .route(
            "/workspaces/:id/members/:user_id",
            axum::routing::patch(change_role).delete(remove_member),
        )
        .route("/workspaces/:id/leave", post(leave))
}

pub async fn list_workspaces(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let listings = services.directory.list_workspaces(user.id, query.force);
    let body: Vec<_> = listings.iter().map(dto::listing_to_json).collect();
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn create_workspace(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<dto::CreateWorkspaceBody>,
) -> axum::response::Response {
    let plan = match body.plan.as_deref() {
        None => PlanTier::Free,
        Some("free") => PlanTier::Free,
        Some("team") => PlanTier::Team,
        Some("business") => PlanTier::Business,
        Some(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_plan",
                "plan must be one of: free, team, business",
            )
        }
    };

    match services.directory.create_workspace(&body.name, plan, user.id) {
        Ok(workspace) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "id": workspace.id,
                "name": workspace.name,
                "plan": workspace.plan,
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_workspace(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<WorkspaceId>,
    Json(body): Json<dto::UpdateWorkspaceBody>,
) -> axum::response::Response {
    match services
        .directory
        .update_workspace(user.id, id, body.name, body.archived)
    {
        Ok(workspace) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "id": workspace.id,
                "name": workspace.name,
                "archived": workspace.archived,
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_members(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<WorkspaceId>,
) -> axum::response::Response {
    match services.directory.members(id, user.id) {
        Ok(members) => {
            let body: Vec<_> = members
                .iter()
                .map(|m| {
                    serde_json::json!({
                        "user_id": m.user_id,
                        "role": m.role,
                        "joined_at": m.joined_at,
                    })
                })
                .collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn add_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<WorkspaceId>,
    Json(body): Json<dto::AddMemberBody>,
) -> axum::response::Response {
    let Some(role) = WorkspaceRole::parse(&body.role) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_role",
            "role must be one of: viewer, member, admin, owner",
        );
    };

    match services.directory.add_member(user.id, id, body.user_id, role) {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn change_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path((id, target)): Path<(WorkspaceId, UserId)>,
    Json(body): Json<dto::ChangeRoleBody>,
) -> axum::response::Response {
    let Some(role) = WorkspaceRole::parse(&body.role) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_role",
            "role must be one of: viewer, member, admin, owner",
        );
    };

    match services.directory.change_role(user.id, id, target, role) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn remove_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path((id, target)): Path<(WorkspaceId, UserId)>,
) -> axum::response::Response {
    match services.directory.remove_member(user.id, id, target) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn leave(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<WorkspaceId>,
) -> axum::response::Response {
    match services.directory.remove_member(user.id, id, user.id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
