use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use stockroom_access::ItemPatch;
use stockroom_core::ItemId;

use crate::app::{dto, errors, AppServices};
use crate::context::{CurrentUser, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route(
            "/items/:id",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .route("/items/:id/use", post(use_item))
        .route("/items/:id/restock", post(restock_item))
        .route("/items/:id/ledger", get(item_ledger))
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<ItemId>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    match services.gate.get_item(&ctx, id) {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<ItemId>,
    Json(body): Json<dto::UpdateItemBody>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    let patch = ItemPatch {
        name: body.name,
        quantity: body.quantity,
        price: body.price.map(Some),
        purchased_on: body.purchased_on.map(Some),
        expires_on: body.expires_on.map(Some),
    };

    match services.gate.update_item(&ctx, id, patch) {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<ItemId>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    match services.gate.delete_item(&ctx, id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn use_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<ItemId>,
    Json(body): Json<dto::QuantityBody>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    match services.gate.use_item(&ctx, id, body.quantity) {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn restock_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<ItemId>,
    Json(body): Json<dto::QuantityBody>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    match services.gate.restock_item(&ctx, id, body.quantity) {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn item_ledger(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<ItemId>,
) -> axum::response::Response {
    let ctx = user.access_context(tenant);
    match services.gate.item_ledger(&ctx, id) {
        Ok(records) => {
            let body: Vec<_> = records.iter().map(dto::record_to_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
