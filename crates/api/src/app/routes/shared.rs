use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::{dto, errors, AppServices};

pub fn router() -> Router {
    Router::new().route("/shared/:token", get(shared_category))
}

/// Unauthenticated link-based read: the share token is the entire
/// credential and yields a read-only view of exactly one category.
pub async fn shared_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(token): Path<String>,
) -> axum::response::Response {
    match services.gate.shared_category(&token) {
        Ok((category, items)) => {
            let items: Vec<_> = items.iter().map(dto::item_to_json).collect();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "category": dto::category_to_json(&category),
                    "items": items,
                })),
            )
                .into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
