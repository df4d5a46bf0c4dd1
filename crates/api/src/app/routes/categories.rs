use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use stockroom_access::{CategoryPatch, NewItem};
use stockroom_core::{CategoryId, UserId};
use stockroom_inventory::GrantLevel;

use crate::app::{dto, errors, AppServices};
use crate::context::{CurrentUser, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category)
                .patch(update_category)
                .delete(delete_category),
        )
        .route("/categories/:id/grants", get(list_grants))
        .route(
            "/categories/:id/grants/:user_id",
            put(put_grant).delete(remove_grant),
        )
        .route(
            "/categories/:id/share",
            post(issue_share_token).delete(revoke_share_token),
        )
        .route("/categories/:id/items", get(list_items).post(create_item))
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    let categories = services.gate.list_categories(&ctx);
    let body: Vec<_> = categories
        .iter()
        .map(|category| {
            let mut json = dto::category_to_json(category);
            json["permission"] =
                serde_json::json!(services.gate.effective_level(&ctx, category));
            json
        })
        .collect();
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Json(body): Json<dto::CreateCategoryBody>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    match services.gate.create_category(&ctx, &body.name, body.public) {
        Ok(category) => {
            (StatusCode::CREATED, Json(dto::category_to_json(&category))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<CategoryId>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    match services.gate.get_category(&ctx, id) {
        Ok(category) => {
            let mut json = dto::category_to_json(&category);
            json["permission"] =
                serde_json::json!(services.gate.effective_level(&ctx, &category));
            (StatusCode::OK, Json(json)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<CategoryId>,
    Json(body): Json<dto::UpdateCategoryBody>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    let patch = CategoryPatch {
        name: body.name,
        public: body.public,
        manager: if body.clear_manager {
            Some(None)
        } else {
            body.manager.map(Some)
        },
    };

    match services.gate.update_category(&ctx, id, patch) {
        Ok(category) => (StatusCode::OK, Json(dto::category_to_json(&category))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<CategoryId>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    match services.gate.delete_category(&ctx, id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_grants(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<CategoryId>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    match services.gate.list_grants(&ctx, id) {
        Ok(grants) => {
            let body: Vec<_> = grants.iter().map(dto::grant_to_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn put_grant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path((id, target)): Path<(CategoryId, UserId)>,
    Json(body): Json<dto::PutGrantBody>,
) -> axum::response::Response {
    let Some(level) = GrantLevel::parse(&body.level) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_level",
            "level must be one of: view, edit, admin",
        );
    };

    let ctx = user.access_context(tenant);
    match services.gate.put_grant(&ctx, id, target, level) {
        Ok(grant) => (StatusCode::OK, Json(dto::grant_to_json(&grant))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn remove_grant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path((id, target)): Path<(CategoryId, UserId)>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    match services.gate.remove_grant(&ctx, id, target) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn issue_share_token(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<CategoryId>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    match services.gate.issue_share_token(&ctx, id) {
        Ok(token) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "share_token": token })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn revoke_share_token(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<CategoryId>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    match services.gate.revoke_share_token(&ctx, id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<CategoryId>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    match services.gate.list_items(&ctx, id) {
        Ok(items) => {
            let body: Vec<_> = items.iter().map(dto::item_to_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<CategoryId>,
    Json(body): Json<dto::CreateItemBody>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    let new = NewItem {
        name: body.name,
        quantity: body.quantity,
        price: body.price,
        purchased_on: body.purchased_on,
        expires_on: body.expires_on,
    };

    match services.gate.create_item(&ctx, id, new) {
        Ok(item) => (StatusCode::CREATED, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
