use std::{marker::PhantomData, path::PathBuf, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Mutex, MutexGuard};

use crate::{inventory::repo_types::Item, products::repo_types::Product};

/// A whole-collection record store: full scan in, full replacement out.
#[async_trait]
pub trait Collection<T: Send + Sync>: Send + Sync {
    async fn read_all(&self) -> anyhow::Result<Vec<T>>;
    async fn write_all(&self, rows: &[T]) -> anyhow::Result<()>;
}

/// Newline-delimited JSON file, one record per line.
pub struct JsonlFile<T> {
    path: PathBuf,
    _rows: PhantomData<fn() -> T>,
}

impl<T> JsonlFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _rows: PhantomData,
        }
    }
}

#[async_trait]
impl<T> Collection<T> for JsonlFile<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn read_all(&self) -> anyhow::Result<Vec<T>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("read {}", self.path.display()));
            }
        };

        let mut rows = Vec::new();
        for (n, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let at = || format!("{}:{}", self.path.display(), n + 1);
            // a bare JSON array (e.g. "[]") is accepted and flattened
            if line.starts_with('[') {
                let batch: Vec<T> = serde_json::from_str(line).with_context(at)?;
                rows.extend(batch);
            } else {
                rows.push(serde_json::from_str(line).with_context(at)?);
            }
        }
        Ok(rows)
    }

    async fn write_all(&self, rows: &[T]) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create dir {}", dir.display()))?;
        }

        let mut body = String::new();
        for row in rows {
            body.push_str(&serde_json::to_string(row).context("encode record")?);
            body.push('\n');
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replace {}", self.path.display()))?;
        Ok(())
    }
}

/// Catalog and inventory collections behind one write lock.
///
/// Every read-modify-write cycle holds the lock, so two concurrent writers
/// can no longer lose each other's update.
#[derive(Clone)]
pub struct Store {
    pub products: Arc<dyn Collection<Product>>,
    pub items: Arc<dyn Collection<Item>>,
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    pub fn new(products: Arc<dyn Collection<Product>>, items: Arc<dyn Collection<Item>>) -> Self {
        Self {
            products,
            items,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn jsonl(product_path: impl Into<PathBuf>, inventory_path: impl Into<PathBuf>) -> Self {
        Self::new(
            Arc::new(JsonlFile::<Product>::new(product_path)),
            Arc::new(JsonlFile::<Item>::new(inventory_path)),
        )
    }

    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }
}
