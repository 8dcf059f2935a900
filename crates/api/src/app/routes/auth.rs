use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/authenticate", post(authenticate))
        .route("/forgot_password", post(forgot_password))
        .route("/reset_password", post(reset_password))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::RegisterRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.auth.register(body, Utc::now()).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn authenticate(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::AuthenticateRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.auth.authenticate(body, Utc::now()).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn forgot_password(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::ForgotPasswordRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.auth.forgot_password(body, Utc::now()).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn reset_password(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::ResetPasswordRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.auth.reset_password(body, Utc::now()).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
