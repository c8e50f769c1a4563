use super::repo_types::{Item, ItemKey};
use crate::storage::Collection;

pub type Inventory = dyn Collection<Item>;

pub async fn list(db: &Inventory) -> anyhow::Result<Vec<Item>> {
    db.read_all().await
}

pub async fn find(db: &Inventory, key: &ItemKey) -> anyhow::Result<Option<Item>> {
    Ok(db.read_all().await?.into_iter().find(|i| key.matches(i)))
}

/// Persist the whole collection. Callers hold the store write lock.
pub async fn save(db: &Inventory, rows: &[Item]) -> anyhow::Result<()> {
    db.write_all(rows).await
}
