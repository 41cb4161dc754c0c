use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use super::error::ApiError;
use super::extract::{Fields, parse_id};
use super::state::AppState;
use crate::core::items::ItemLogic;
use crate::db::log::ttlog_quiet;
use crate::db::repository::SqliteRepository;
use crate::models::productivity::{TracingReporter, WireRecord};

/// `GET /items`
pub async fn list_items(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<WireRecord>>, ApiError> {
    let items = state
        .with_db(|conn| Ok(ItemLogic::list(&SqliteRepository::new(conn))?))
        .await?;

    Ok(Json(
        items.iter().map(|p| p.serialize(&TracingReporter)).collect(),
    ))
}

/// `POST /items`
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Fields(fields): Fields,
) -> Result<(StatusCode, Json<WireRecord>), ApiError> {
    let entity = state
        .with_db(move |conn| {
            let mut repo = SqliteRepository::new(conn);
            let entity = ItemLogic::create(&mut repo, &fields)?;

            let id = entity.id.unwrap_or_default().to_string();
            ttlog_quiet(conn, "add", &id, &entity.format_display(&TracingReporter));
            Ok(entity)
        })
        .await?;

    info!(id = entity.id.unwrap_or_default(), "Item created");
    Ok((StatusCode::CREATED, Json(entity.serialize(&TracingReporter))))
}

/// `GET /items/{id}`
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<WireRecord>, ApiError> {
    let id = parse_id(&raw_id)?;

    let entity = state
        .with_db(move |conn| Ok(ItemLogic::get(&SqliteRepository::new(conn), id)?))
        .await?;

    Ok(Json(entity.serialize(&TracingReporter)))
}

/// `PUT /items/{id}`
///
/// An unknown id is reported before anything wrong with the body.
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    body: Result<Fields, ApiError>,
) -> Result<Json<WireRecord>, ApiError> {
    let id = parse_id(&raw_id)?;

    let entity = state
        .with_db(move |conn| {
            let mut repo = SqliteRepository::new(conn);
            ItemLogic::get(&repo, id)?;

            let Fields(fields) = body?;
            let entity = ItemLogic::update(&mut repo, id, &fields)?;

            ttlog_quiet(
                conn,
                "edit",
                &id.to_string(),
                &entity.format_display(&TracingReporter),
            );
            Ok(entity)
        })
        .await?;

    info!(id, "Item updated");
    Ok(Json(entity.serialize(&TracingReporter)))
}

/// `DELETE /items/{id}`
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;

    let removed = state
        .with_db(move |conn| {
            let removed = ItemLogic::delete(&mut SqliteRepository::new(conn), id)?;
            ttlog_quiet(conn, "del", &id.to_string(), "Item deleted");
            Ok(removed)
        })
        .await?;

    info!(id, removed, "Item deleted");
    Ok(StatusCode::NO_CONTENT)
}
