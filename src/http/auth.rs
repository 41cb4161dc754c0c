use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
};
use serde_json::json;
use tracing::{info, warn};

use super::error::ApiError;
use super::extract::{Fields, cookie};
use super::state::AppState;
use crate::core::auth::AuthLogic;
use crate::db::log::ttlog_quiet;
use crate::db::users::find_user;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const SESSION_COOKIE: &str = "sessionid";
const CSRF_COOKIE_AGE: i64 = 60 * 60 * 24 * 7 * 52;

pub fn csrf_cookie(token: &str) -> String {
    format!("{CSRF_COOKIE}={token}; Max-Age={CSRF_COOKIE_AGE}; Path=/; SameSite=Lax")
}

pub fn session_cookie(key: &str, max_age: i64) -> String {
    format!("{SESSION_COOKIE}={key}; HttpOnly; Max-Age={max_age}; Path=/; SameSite=Lax")
}

/// `GET /auth/csrf`: empty body, token in the `csrftoken` cookie.
pub async fn csrf_token(headers: HeaderMap) -> impl IntoResponse {
    let token = AuthLogic::csrf_token(cookie(&headers, CSRF_COOKIE).as_deref());

    (
        AppendHeaders([(SET_COOKIE, csrf_cookie(&token))]),
        Json(json!({})),
    )
}

/// `GET /auth/login`: where unauthenticated clients are sent.
pub async fn login_required() -> ApiError {
    ApiError::LoginRequired
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    Fields(fields): Fields,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(username), Some(password)) = (
        fields.get("username").cloned(),
        fields.get("password").cloned(),
    ) else {
        return Err(ApiError::MissingData);
    };

    let lookup = username.clone();
    let user = state
        .with_db(move |conn| Ok(find_user(conn, &lookup)?))
        .await?;

    // Hash verification is CPU bound: keep it off the runtime and outside the lock.
    let iterations = state.config.password_iterations;
    let user = tokio::task::spawn_blocking(move || {
        AuthLogic::check_credentials(user, &password, iterations)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    let Some(user) = user else {
        warn!(username = %username, "Invalid login");
        return Err(ApiError::InvalidLogin);
    };

    let session_age = state.config.session_age;
    let (user, session) = state
        .with_db(move |conn| {
            let session = AuthLogic::login(conn, &user, session_age)?;
            ttlog_quiet(conn, "login", &user.username, "Login success");
            Ok((user, session))
        })
        .await?;

    info!(username = %user.username, "User logged in");

    Ok((
        AppendHeaders([
            (
                SET_COOKIE,
                session_cookie(&session.session_key, state.config.session_age),
            ),
            (SET_COOKIE, csrf_cookie(&AuthLogic::rotate_csrf_token())),
        ]),
        Json(json!({ "info": "Login success" })),
    ))
}
