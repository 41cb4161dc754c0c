//! HTTP surface: `/auth/*` (CSRF cookie, session login) and the `/items`
//! JSON CRUD API.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{
        HeaderName, HeaderValue, Method,
        header::{CONTENT_TYPE, COOKIE},
    },
    middleware,
    routing::get,
};
use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub mod auth;
pub mod csrf;
pub mod error;
pub mod extract;
pub mod items;
pub mod state;

use crate::db::users::purge_expired_sessions;
use crate::errors::{AppError, AppResult};
use crate::utils::time;
use error::ApiError;
use state::AppState;

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, COOKIE, HeaderName::from_static(csrf::CSRF_HEADER)])
        .max_age(Duration::from_secs(60 * 60));

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {o}");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        cors
    } else {
        cors.allow_origin(AllowOrigin::list(allowed))
            .allow_credentials(true)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/auth/csrf",
            get(auth::csrf_token).fallback(method_not_allowed),
        )
        .route(
            "/auth/login",
            get(auth::login_required)
                .post(auth::login)
                .fallback(method_not_allowed),
        )
        .route(
            "/items",
            get(items::list_items)
                .post(items::create_item)
                .fallback(method_not_allowed),
        )
        .route(
            "/items/{id}",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item)
                .fallback(method_not_allowed),
        )
        .fallback(route_not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            csrf::csrf_guard,
        ))
        .layer(cors_layer(&state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C / SIGTERM.
pub async fn serve(state: Arc<AppState>) -> AppResult<()> {
    {
        let pool = state.db.lock().await;
        let purged = purge_expired_sessions(&pool.conn, &time::now())?;
        if purged > 0 {
            info!(purged, "Removed expired sessions");
        }
    }

    let app = router(state.clone());

    let address = format!("{}:{}", state.config.bind_address, state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Server(e.to_string()))?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
