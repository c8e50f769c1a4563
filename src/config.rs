use std::{path::PathBuf, str::FromStr};

/// How `POST /inventory` records new containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InventoryMode {
    /// One inventory entry per create call.
    #[default]
    Flat,
    /// One entry per catalog product, with a unit per physical container.
    Grouped,
}

impl FromStr for InventoryMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "grouped" => Ok(Self::Grouped),
            other => anyhow::bail!("unknown INVENTORY_MODE {other:?} (expected flat or grouped)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub inventory_path: PathBuf,
    pub product_path: PathBuf,
    pub inventory_mode: InventoryMode,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let data_dir = PathBuf::from(var("DATA_DIR").unwrap_or_else(|| "./data".into()));
        let inventory_path = var("INVENTORY_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("inventory.jsonl"));
        let product_path = var("PRODUCT_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("products.jsonl"));
        let inventory_mode = var("INVENTORY_MODE")
            .map(|v| v.parse::<InventoryMode>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            data_dir,
            inventory_path,
            product_path,
            inventory_mode,
        })
    }
}
