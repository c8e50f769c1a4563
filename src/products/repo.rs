use super::repo_types::Product;
use crate::storage::Collection;

pub type Catalog = dyn Collection<Product>;

pub async fn list(db: &Catalog) -> anyhow::Result<Vec<Product>> {
    db.read_all().await
}

pub async fn find_by_id(db: &Catalog, id: &str) -> anyhow::Result<Option<Product>> {
    Ok(db.read_all().await?.into_iter().find(|p| p.id == id))
}

pub async fn find_by_upc(db: &Catalog, upc: &str) -> anyhow::Result<Option<Product>> {
    Ok(db
        .read_all()
        .await?
        .into_iter()
        .find(|p| p.upc.as_deref() == Some(upc)))
}

/// Append a new entry. Callers hold the store write lock.
pub async fn insert(db: &Catalog, product: Product) -> anyhow::Result<Product> {
    let mut rows = db.read_all().await?;
    rows.push(product.clone());
    db.write_all(&rows).await?;
    Ok(product)
}

/// Replace the entry with the same id, if present.
pub async fn replace(db: &Catalog, product: Product) -> anyhow::Result<Option<Product>> {
    let mut rows = db.read_all().await?;
    let Some(slot) = rows.iter_mut().find(|p| p.id == product.id) else {
        return Ok(None);
    };
    *slot = product.clone();
    db.write_all(&rows).await?;
    Ok(Some(product))
}

pub async fn delete(db: &Catalog, id: &str) -> anyhow::Result<bool> {
    let rows = db.read_all().await?;
    let before = rows.len();
    let kept: Vec<Product> = rows.into_iter().filter(|p| p.id != id).collect();
    if kept.len() == before {
        return Ok(false);
    }
    db.write_all(&kept).await?;
    Ok(true)
}
