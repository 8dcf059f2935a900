use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use taskboard_auth::JwtValidator;

use crate::app::errors::json_error;
use crate::context::CallerContext;

pub const NO_TOKEN: &str = "No token provided";
pub const TOKEN_ERROR: &str = "Token error";
pub const TOKEN_MALFORMATTED: &str = "Token malformatted";
pub const TOKEN_INVALID: &str = "Token invalid";

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Session verifier: rejects the request with 401 unless it carries a valid
/// bearer token, otherwise attaches a [`CallerContext`].
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(token) => token,
        Err(msg) => return json_error(StatusCode::UNAUTHORIZED, msg),
    };

    let claims = match state.jwt.validate(token, Utc::now()) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "session token rejected");
            return json_error(StatusCode::UNAUTHORIZED, TOKEN_INVALID);
        }
    };

    req.extensions_mut().insert(CallerContext::new(claims.sub));

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(NO_TOKEN)?;

    let header = header.to_str().map_err(|_| TOKEN_ERROR)?;

    let mut parts = header.split_whitespace();
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(TOKEN_ERROR);
    };

    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(TOKEN_MALFORMATTED);
    }

    Ok(token)
}
