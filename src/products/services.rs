use tracing::{debug, info};

use super::{
    dto::{CreateProductRequest, ProductRef, UpdateProductRequest},
    repo::{self, Catalog},
    repo_types::{non_blank, Product, ProductFields},
};
use crate::{error::AppError, ids::short_uuid, patch, storage::Store};

/// Catalog entry picked for a new inventory entry, plus the product fields
/// the entry should carry (caller-supplied first, backfilled from the catalog).
#[derive(Debug, Clone)]
pub struct ResolvedProduct {
    pub product: Product,
    pub fields: ProductFields,
}

impl ResolvedProduct {
    pub fn unit_weight_g(&self) -> Option<i64> {
        self.fields.unit_weight_g()
    }
}

/// Reconcile a product reference against the catalog.
///
/// An unknown UPC with a name creates a new catalog entry as a side effect.
/// Callers must hold the store write lock.
pub async fn resolve_product(
    catalog: &Catalog,
    reference: Option<ProductRef>,
    supplied: ProductFields,
) -> Result<ResolvedProduct, AppError> {
    match reference {
        Some(ProductRef::ById(id)) => resolve_by_id(catalog, &id, supplied).await,
        Some(ProductRef::Embedded(embedded)) => {
            resolve_by_upc(catalog, supplied.or(embedded)).await
        }
        None => resolve_by_upc(catalog, supplied).await,
    }
}

async fn resolve_by_id(
    catalog: &Catalog,
    id: &str,
    supplied: ProductFields,
) -> Result<ResolvedProduct, AppError> {
    let product = repo::find_by_id(catalog, id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    let fields = supplied.or(product.fields());
    Ok(ResolvedProduct { product, fields })
}

async fn resolve_by_upc(
    catalog: &Catalog,
    supplied: ProductFields,
) -> Result<ResolvedProduct, AppError> {
    // `or` with an empty set drops blank strings
    let supplied = supplied.or(ProductFields::default());
    let upc = supplied
        .upc
        .clone()
        .ok_or_else(|| AppError::validation("UPC required for new item"))?;

    if let Some(product) = repo::find_by_upc(catalog, &upc).await? {
        debug!(product_id = %product.id, %upc, "upc matched catalog entry");
        let fields = supplied.or(product.fields());
        return Ok(ResolvedProduct { product, fields });
    }

    let name = supplied
        .name
        .clone()
        .ok_or_else(|| AppError::validation("Name required for unknown UPC"))?;

    let product = repo::insert(
        catalog,
        Product {
            id: short_uuid(),
            name: Some(name),
            upc: Some(upc),
            nutrition: supplied.nutrition,
            tags: supplied.tags,
            container_info: supplied.container_info,
        },
    )
    .await?;
    info!(product_id = %product.id, upc = ?product.upc, "catalog entry auto-created");

    let fields = product.fields();
    Ok(ResolvedProduct { product, fields })
}

pub async fn list_products(store: &Store) -> Result<Vec<Product>, AppError> {
    Ok(repo::list(&*store.products).await?)
}

pub async fn get_product(store: &Store, id: &str) -> Result<Option<Product>, AppError> {
    Ok(repo::find_by_id(&*store.products, id).await?)
}

pub async fn create_product(
    store: &Store,
    req: CreateProductRequest,
) -> Result<Product, AppError> {
    let fields = req.fields.or(ProductFields::default());
    let _guard = store.lock().await;

    if let Some(upc) = fields.upc.as_deref() {
        ensure_upc_free(&*store.products, upc, None).await?;
    }

    let product = repo::insert(
        &*store.products,
        Product {
            id: short_uuid(),
            name: fields.name,
            upc: fields.upc,
            nutrition: fields.nutrition,
            tags: fields.tags,
            container_info: fields.container_info,
        },
    )
    .await?;
    info!(product_id = %product.id, "catalog entry created");
    Ok(product)
}

/// Merge-patch a catalog entry; `None` if no entry has that id.
pub async fn update_product(
    store: &Store,
    id: &str,
    req: UpdateProductRequest,
) -> Result<Option<Product>, AppError> {
    let _guard = store.lock().await;

    let Some(mut product) = repo::find_by_id(&*store.products, id).await? else {
        return Ok(None);
    };

    // blank strings clear the field, as they count as unset on create
    let upc = req.upc.map(non_blank);
    let name = req.name.map(non_blank);
    if let Some(Some(upc)) = upc.as_ref() {
        ensure_upc_free(&*store.products, upc, Some(id)).await?;
    }

    patch::apply(&mut product.name, name);
    patch::apply(&mut product.upc, upc);
    patch::apply(&mut product.tags, req.tags);
    patch::apply(&mut product.container_info, req.container_info);
    patch::apply(&mut product.nutrition, req.nutrition);

    Ok(repo::replace(&*store.products, product).await?)
}

/// Does not cascade to inventory entries referencing the product.
pub async fn delete_product(store: &Store, id: &str) -> Result<bool, AppError> {
    let _guard = store.lock().await;
    let removed = repo::delete(&*store.products, id).await?;
    if removed {
        info!(product_id = %id, "catalog entry deleted");
    }
    Ok(removed)
}

async fn ensure_upc_free(
    catalog: &Catalog,
    upc: &str,
    owner: Option<&str>,
) -> Result<(), AppError> {
    match repo::find_by_upc(catalog, upc).await? {
        Some(existing) if Some(existing.id.as_str()) != owner => Err(AppError::validation(
            format!("UPC {upc} already belongs to product {}", existing.id),
        )),
        _ => Ok(()),
    }
}
