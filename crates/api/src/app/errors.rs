use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use taskboard_infra::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    let status = match &err {
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ServiceError::InvalidToken(_) | ServiceError::ExpiredToken(_) | ServiceError::Validation(_) => {
            StatusCode::BAD_REQUEST
        }
        ServiceError::SendError { .. } => StatusCode::BAD_GATEWAY,
        ServiceError::Unhandled { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %err, detail = err.detail().unwrap_or_default(), "request failed");
    }

    match err.detail() {
        Some(detail) => json_error_with_detail(status, err.to_string(), detail),
        None => json_error(status, err.to_string()),
    }
}

/// Malformed or mistyped JSON bodies, reported in the same shape as service errors.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(rejection.status(), rejection.body_text())
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, axum::Json(json!({ "error": message.into() }))).into_response()
}

pub fn json_error_with_detail(
    status: StatusCode,
    message: impl Into<String>,
    detail: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": message.into(),
            "detail": detail.into(),
        })),
    )
        .into_response()
}
