use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{instrument, warn};

use super::{
    dto::{ConsumeRequest, CreateItemRequest, UpdateItemRequest},
    repo_types::{ItemKey, ItemView},
    services,
};
use crate::{error::AppError, state::AppState};

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_items).post(create_item))
        .route(
            "/inventory/:id",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .route("/inventory/:id/consume", post(consume_item))
        .route(
            "/inventory/uuid/:uuid",
            get(get_item_by_uuid)
                .patch(update_item_by_uuid)
                .delete(delete_item_by_uuid),
        )
}

/// Empty inventory answers with a message instead of `[]`.
#[instrument(skip(state))]
pub async fn list_items(State(state): State<AppState>) -> Result<Response, AppError> {
    let items = services::list_items(&state.store).await?;
    if items.is_empty() {
        return Ok(Json(json!({ "message": "Inventory empty" })).into_response());
    }
    Ok(Json(items).into_response())
}

#[instrument(skip(state, payload))]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemView>), AppError> {
    let item = services::create_item(&state.store, state.config.inventory_mode, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ItemView>, AppError> {
    let key = ItemKey::Id(id);
    services::get_item(&state.store, &key)
        .await?
        .map(Json)
        .ok_or_else(|| item_not_found(&key))
}

#[instrument(skip(state))]
pub async fn get_item_by_uuid(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<ItemView>, AppError> {
    let key = ItemKey::Uuid(uuid);
    services::get_item(&state.store, &key)
        .await?
        .map(Json)
        .ok_or_else(|| item_not_found(&key))
}

#[instrument(skip(state, payload))]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<ItemView>, AppError> {
    services::update_item_by_id(&state.store, id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| item_not_found(&ItemKey::Id(id)))
}

#[instrument(skip(state, payload))]
pub async fn update_item_by_uuid(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<ItemView>, AppError> {
    services::update_item_by_uuid(&state.store, &uuid, payload)
        .await?
        .map(Json)
        .ok_or_else(|| item_not_found(&ItemKey::Uuid(uuid)))
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    delete_by_key(&state, ItemKey::Id(id)).await
}

#[instrument(skip(state))]
pub async fn delete_item_by_uuid(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<Value>, AppError> {
    delete_by_key(&state, ItemKey::Uuid(uuid)).await
}

async fn delete_by_key(state: &AppState, key: ItemKey) -> Result<Json<Value>, AppError> {
    if services::delete_item(&state.store, &key).await? {
        Ok(Json(json!({ "message": "Item deleted" })))
    } else {
        Err(item_not_found(&key))
    }
}

#[instrument(skip(state, payload))]
pub async fn consume_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ConsumeRequest>,
) -> Result<Json<ItemView>, AppError> {
    services::consume(&state.store, id, payload.amount)
        .await?
        .map(Json)
        .ok_or_else(|| item_not_found(&ItemKey::Id(id)))
}

fn item_not_found(key: &ItemKey) -> AppError {
    warn!(key = ?key, "inventory entry not found");
    AppError::not_found("Item not found")
}
