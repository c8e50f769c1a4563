use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{instrument, warn};

use super::{
    dto::{CreateProductRequest, UpdateProductRequest},
    repo_types::Product,
    services,
};
use crate::{error::AppError, state::AppState};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(services::list_products(&state.store).await?))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    services::get_product(&state.store, &id)
        .await?
        .map(Json)
        .ok_or_else(|| product_not_found(&id))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let product = services::create_product(&state.store, payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    services::update_product(&state.store, &id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| product_not_found(&id))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if services::delete_product(&state.store, &id).await? {
        Ok(Json(json!({ "message": "Product deleted" })))
    } else {
        Err(product_not_found(&id))
    }
}

fn product_not_found(id: &str) -> AppError {
    warn!(product_id = %id, "product not found");
    AppError::not_found("Product not found")
}
