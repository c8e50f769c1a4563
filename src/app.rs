use std::net::SocketAddr;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::instrument;

use crate::{error::AppError, inventory, products, state::AppState};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(inventory::router())
        .merge(products::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

/// Reads the inventory collection; a store failure surfaces as 500.
#[instrument(skip(state))]
async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.store.items.read_all().await?;
    Ok(Json(json!({ "status": "ok" })))
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "3000".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::{
        config::InventoryMode,
        inventory::repo_types::Item,
        products::repo_types::Product,
        storage::{memory::MemoryCollection, Collection, Store},
    };

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = app
            .clone()
            .oneshot(req.body(body).expect("request"))
            .await
            .expect("response");
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    fn app() -> Router {
        build_app(AppState::fake(InventoryMode::Flat))
    }

    async fn seed_product(app: &Router, name: &str, upc: &str) -> Value {
        let (status, product) = call(
            app,
            Method::POST,
            "/products",
            Some(json!({"name": name, "upc": upc, "nutrition": {"serving": {"calories": 50}}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        product
    }

    #[tokio::test]
    async fn health_ok() {
        let (status, body) = call(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    struct BrokenCollection;

    #[async_trait]
    impl Collection<Item> for BrokenCollection {
        async fn read_all(&self) -> anyhow::Result<Vec<Item>> {
            anyhow::bail!("disk unavailable")
        }
        async fn write_all(&self, _rows: &[Item]) -> anyhow::Result<()> {
            anyhow::bail!("disk unavailable")
        }
    }

    #[tokio::test]
    async fn health_fails_when_store_fails() {
        let mut state = AppState::fake(InventoryMode::Flat);
        state.store = Store::new(
            Arc::new(MemoryCollection::<Product>::default()),
            Arc::new(BrokenCollection),
        );
        let (status, _) = call(&build_app(state), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn inventory_crud_roundtrip() {
        let app = app();
        let bread = seed_product(&app, "Bread", "111").await;

        let (status, body) = call(&app, Method::GET, "/inventory", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Inventory empty"}));

        let (status, item) = call(
            &app,
            Method::POST,
            "/inventory",
            Some(json!({"product": bread["id"], "quantity": 1, "tags": ["baked"], "container_weight": 100})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(item["product"]["id"], bread["id"]);
        assert!(item.get("product_id").is_none());
        let id = item["id"].as_i64().unwrap();

        let (_, list) = call(&app, Method::GET, "/inventory", None).await;
        assert_eq!(list.as_array().map(Vec::len), Some(1));

        let (status, updated) = call(
            &app,
            Method::PATCH,
            &format!("/inventory/{id}"),
            Some(json!({"quantity": 2, "tags": ["baked", "fresh"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["quantity"], 2);
        assert_eq!(updated["tags"], json!(["baked", "fresh"]));
        assert_eq!(updated["container_weight"], 100);

        let (status, body) = call(&app, Method::DELETE, &format!("/inventory/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Item deleted");

        let (status, _) = call(&app, Method::DELETE, &format!("/inventory/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = call(&app, Method::GET, "/inventory", None).await;
        assert_eq!(body, json!({"message": "Inventory empty"}));
    }

    #[tokio::test]
    async fn create_validation_errors_are_400() {
        let app = app();
        let (status, body) =
            call(&app, Method::POST, "/inventory", Some(json!({"upc": "999", "quantity": 1}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Name required for unknown UPC");

        let (status, _) = call(&app, Method::POST, "/inventory", Some(json!({"quantity": 1}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, products) = call(&app, Method::GET, "/products", None).await;
        assert_eq!(products, json!([]));
    }

    #[tokio::test]
    async fn create_with_unknown_product_id_is_404() {
        let (status, body) =
            call(&app(), Method::POST, "/inventory", Some(json!({"product": "1"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Product not found");
    }

    #[tokio::test]
    async fn create_by_upc_reuses_catalog_entry() {
        let app = app();
        let apple = seed_product(&app, "Apple", "222").await;
        let (status, item) =
            call(&app, Method::POST, "/inventory", Some(json!({"upc": "222", "quantity": 2}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(item["product"]["id"], apple["id"]);
        assert_eq!(item["quantity"], 2);
        assert_eq!(item["opened"], false);
    }

    #[tokio::test]
    async fn uuid_routes() {
        let app = app();
        let juice = seed_product(&app, "Juice", "555").await;
        let (_, item) = call(
            &app,
            Method::POST,
            "/inventory",
            Some(json!({"product": juice["id"], "uuid": "abc"})),
        )
        .await;

        let (status, found) = call(&app, Method::GET, "/inventory/uuid/abc", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["id"], item["id"]);

        let (status, patched) = call(
            &app,
            Method::PATCH,
            "/inventory/uuid/abc",
            Some(json!({"quantity": 7})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["quantity"], 7);

        let (status, body) = call(&app, Method::DELETE, "/inventory/uuid/abc", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Item deleted");

        let (status, _) = call(&app, Method::GET, "/inventory/uuid/abc", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patch_missing_item_is_404() {
        let (status, body) = call(
            &app(),
            Method::PATCH,
            "/inventory/41",
            Some(json!({"quantity": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Item not found");
    }

    #[tokio::test]
    async fn consume_route() {
        let app = app();
        let soup = seed_product(&app, "Soup", "666").await;
        let (_, item) = call(
            &app,
            Method::POST,
            "/inventory",
            Some(json!({"product": soup["id"], "remaining": 1.0})),
        )
        .await;
        let id = item["id"].as_i64().unwrap();

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/inventory/{id}/consume"),
            Some(json!({"amount": 0.5})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["remaining"], 0.5);

        let (status, _) = call(
            &app,
            Method::POST,
            "/inventory/999/consume",
            Some(json!({"amount": 0.5})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn product_crud() {
        let app = app();
        let tea = seed_product(&app, "Tea", "777").await;
        let id = tea["id"].as_str().unwrap().to_string();
        assert_eq!(tea["nutrition"], json!({"serving": {"calories": 50}}));

        let (status, got) = call(&app, Method::GET, &format!("/products/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(got["name"], "Tea");

        let (status, patched) = call(
            &app,
            Method::PATCH,
            &format!("/products/{id}"),
            Some(json!({"name": "Green tea", "nutrition": {"caffeine": 30}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["name"], "Green tea");
        assert_eq!(patched["upc"], "777");
        assert_eq!(patched["nutrition"], Value::Null);

        let (status, _) = call(
            &app,
            Method::POST,
            "/products",
            Some(json!({"name": "Other", "upc": "777"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, Method::DELETE, &format!("/products/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Product deleted");

        let (status, _) = call(&app, Method::GET, &format!("/products/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn grouped_mode_over_http() {
        let app = build_app(AppState::fake(InventoryMode::Grouped));
        let (status, first) = call(
            &app,
            Method::POST,
            "/inventory",
            Some(json!({"upc": "8", "name": "Tuna", "quantity": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, second) =
            call(&app, Method::POST, "/inventory", Some(json!({"upc": "8"}))).await;
        assert_eq!(first["id"], second["id"]);
        assert_eq!(second["quantity"], 3);
        assert_eq!(second["units"].as_array().map(Vec::len), Some(3));
    }
}
