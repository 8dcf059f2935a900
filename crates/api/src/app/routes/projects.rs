use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use taskboard_core::ProjectId;

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
}

fn parse_project_id(id: &str) -> Result<ProjectId, axum::response::Response> {
    id.parse::<ProjectId>()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid project id"))
}

pub async fn list_projects(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.projects.list().await {
        Ok(projects) => (StatusCode::OK, Json(projects)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_project_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.projects.get(id).await {
        Ok(project) => (StatusCode::OK, Json(project)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    body: Result<Json<dto::ProjectInput>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.projects.create(caller.user_id(), body, Utc::now()).await {
        Ok(project) => (StatusCode::OK, Json(dto::ProjectEnvelope { project })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::ProjectInput>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_project_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.projects.update(id, body, Utc::now()).await {
        Ok(project) => (StatusCode::OK, Json(dto::ProjectEnvelope { project })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_project_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.projects.delete(id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
