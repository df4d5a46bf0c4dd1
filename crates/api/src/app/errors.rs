use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockroom_core::DomainError;

/// Map the domain taxonomy onto HTTP. The interesting cases: existence
/// masking already happened in the gate (`NotFound` may mean "forbidden and
/// none of your business"), and `access_token_expired` is a distinct code so
/// clients can run their single-refresh retry.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", message)
        }
        DomainError::AccessTokenExpired => {
            json_error(StatusCode::UNAUTHORIZED, "access_token_expired", message)
        }
        DomainError::RefreshTokenExpired => {
            json_error(StatusCode::UNAUTHORIZED, "refresh_token_expired", message)
        }
        DomainError::Superseded => json_error(StatusCode::UNAUTHORIZED, "superseded", message),
        DomainError::EmailTaken => json_error(StatusCode::CONFLICT, "email_taken", message),
        DomainError::UsernameTaken => json_error(StatusCode::CONFLICT, "username_taken", message),
        DomainError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", message),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::InsufficientQuantity { available, requested } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "insufficient_quantity",
                "message": message,
                "available": available,
                "requested": requested,
            })),
        )
            .into_response(),
        DomainError::WorkspaceNotSelected => {
            json_error(StatusCode::BAD_REQUEST, "workspace_not_selected", message)
        }
        DomainError::LastOwnerRemovalRejected => {
            json_error(StatusCode::CONFLICT, "last_owner", message)
        }
        DomainError::Validation(_) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", message)
        }
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
