use std::sync::Arc;

use tracing::info;

use crate::{config::AppConfig, storage::Store};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = Store::jsonl(&config.product_path, &config.inventory_path);
        info!(
            data_dir = %config.data_dir.display(),
            inventory = %config.inventory_path.display(),
            products = %config.product_path.display(),
            mode = ?config.inventory_mode,
            "jsonl store ready"
        );

        Ok(Self { config, store })
    }
}

#[cfg(test)]
impl AppState {
    pub fn fake(mode: crate::config::InventoryMode) -> Self {
        let config = Arc::new(AppConfig {
            data_dir: "fake".into(),
            inventory_path: "fake/inventory.jsonl".into(),
            product_path: "fake/products.jsonl".into(),
            inventory_mode: mode,
        });
        Self {
            config,
            store: Store::in_memory(),
        }
    }
}
