use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::warn;

use super::auth::CSRF_COOKIE;
use super::error::ApiError;
use super::extract::cookie;
use super::state::AppState;

pub const CSRF_HEADER: &str = "x-csrftoken";

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Double-submit check: unsafe methods must echo the `csrftoken` cookie in
/// the `X-CSRFToken` header. Only active when `csrf_protect` is set.
pub async fn csrf_guard(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    if !state.config.csrf_protect || is_safe(req.method()) {
        return next.run(req).await;
    }

    let expected = cookie(req.headers(), CSRF_COOKIE).unwrap_or_default();
    let supplied = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let matches = !expected.is_empty() && bool::from(expected.as_bytes().ct_eq(supplied.as_bytes()));
    if !matches {
        warn!(method = %req.method(), path = %req.uri().path(), "CSRF verification failed");
        return ApiError::Csrf.into_response();
    }

    next.run(req).await
}
