use std::collections::HashMap;

use tracing::info;

use super::{
    dto::{CreateItemRequest, UpdateItemRequest},
    repo,
    repo_types::{Item, ItemKey, ItemView, Unit},
};
use crate::{
    config::InventoryMode,
    error::AppError,
    ids::{next_id, short_uuid},
    patch,
    products::{
        dto::ProductRef,
        repo::{self as catalog, Catalog},
        repo_types::Product,
        services::{resolve_product, ResolvedProduct},
    },
    storage::Store,
};

/// Create an inventory entry (flat) or add units to one (grouped).
///
/// Product resolution may insert a catalog entry for an unknown UPC.
pub async fn create_item(
    store: &Store,
    mode: InventoryMode,
    mut req: CreateItemRequest,
) -> Result<ItemView, AppError> {
    let quantity = req.quantity.unwrap_or(1);
    if mode == InventoryMode::Grouped && quantity < 1 {
        return Err(AppError::validation("quantity must be at least 1"));
    }

    let _guard = store.lock().await;
    let mut items = repo::list(&*store.items).await?;

    if let Some(uuid) = req.uuid.as_deref() {
        ensure_uuid_free(&items, uuid)?;
    }

    let supplied = req.product_fields();
    let resolved = resolve_product(&*store.products, req.product.take(), supplied).await?;
    let weight = req.container_weight.or_else(|| resolved.unit_weight_g());

    let idx = match mode {
        InventoryMode::Flat => {
            items.push(Item {
                id: next_id(items.iter().map(|i| i.id)),
                product_id: resolved.product.id.clone(),
                quantity,
                opened: req.opened.unwrap_or(false),
                remaining: req.remaining,
                uuid: req.uuid.take().unwrap_or_else(short_uuid),
                expiration_date: req.expiration_date.take(),
                location: req.location.take(),
                tags: resolved.fields.tags.clone(),
                container_weight: weight,
                name: None,
                upc: None,
                container_info: None,
                nutrition: None,
                units: Vec::new(),
            });
            items.len() - 1
        }
        InventoryMode::Grouped => add_units(&mut items, &resolved, req, quantity, weight),
    };

    repo::save(&*store.items, &items).await?;

    let item = items.swap_remove(idx);
    info!(
        item_id = item.id,
        product_id = %item.product_id,
        quantity = item.quantity,
        "inventory entry created"
    );
    Ok(ItemView::new(item, Some(resolved.product)))
}

/// Append `quantity` units to the entry keyed by the resolved product,
/// creating that entry first if needed. Returns the entry index.
fn add_units(
    items: &mut Vec<Item>,
    resolved: &ResolvedProduct,
    req: CreateItemRequest,
    quantity: i64,
    weight: Option<i64>,
) -> usize {
    let mut first_uuid = req.uuid.unwrap_or_else(short_uuid);

    let idx = match items.iter().position(|i| i.product_id == resolved.product.id) {
        Some(idx) => idx,
        None => {
            let fields = resolved.fields.clone();
            items.push(Item {
                id: next_id(items.iter().map(|i| i.id)),
                product_id: resolved.product.id.clone(),
                quantity: 0,
                opened: false,
                remaining: req.remaining,
                uuid: short_uuid(),
                expiration_date: None,
                location: req.location,
                tags: fields.tags,
                container_weight: weight,
                name: fields.name,
                upc: fields.upc,
                container_info: fields.container_info,
                nutrition: fields.nutrition,
                units: Vec::new(),
            });
            items.len() - 1
        }
    };

    let entry = &mut items[idx];
    for _ in 0..quantity {
        let uuid = std::mem::replace(&mut first_uuid, short_uuid());
        entry.units.push(Unit {
            uuid,
            opened: req.opened.unwrap_or(false),
            weight_g: weight,
            expiration_date: req.expiration_date.clone(),
        });
    }
    entry.quantity = entry.units.len() as i64;
    idx
}

/// Every entry with its catalog entry embedded.
pub async fn list_items(store: &Store) -> Result<Vec<ItemView>, AppError> {
    let items = repo::list(&*store.items).await?;
    let products = catalog::list(&*store.products).await?;
    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();
    Ok(items
        .into_iter()
        .map(|item| {
            let product = by_id.get(item.product_id.as_str()).map(|p| (*p).clone());
            ItemView::new(item, product)
        })
        .collect())
}

pub async fn get_item(store: &Store, key: &ItemKey) -> Result<Option<ItemView>, AppError> {
    match repo::find(&*store.items, key).await? {
        Some(item) => Ok(Some(view(&*store.products, item).await?)),
        None => Ok(None),
    }
}

pub async fn update_item_by_id(
    store: &Store,
    id: i64,
    patch: UpdateItemRequest,
) -> Result<Option<ItemView>, AppError> {
    update_item(store, &ItemKey::Id(id), patch).await
}

pub async fn update_item_by_uuid(
    store: &Store,
    uuid: &str,
    patch: UpdateItemRequest,
) -> Result<Option<ItemView>, AppError> {
    update_item(store, &ItemKey::Uuid(uuid.to_string()), patch).await
}

/// Merge-patch: only keys present in the request overwrite the stored entry.
///
/// A unit uuid of a grouped entry targets that unit: `uuid`, `opened`,
/// `expiration_date` and `container_weight` land on the unit, the rest on
/// the entry.
async fn update_item(
    store: &Store,
    key: &ItemKey,
    req: UpdateItemRequest,
) -> Result<Option<ItemView>, AppError> {
    let _guard = store.lock().await;
    let mut items = repo::list(&*store.items).await?;
    let Some((idx, unit)) = locate(&items, key) else {
        return Ok(None);
    };

    if req.quantity.is_some() && !items[idx].units.is_empty() {
        return Err(AppError::validation(
            "quantity of a grouped entry follows its unit count",
        ));
    }
    if let Some(uuid) = req.uuid.as_deref() {
        let current = match unit {
            Some(u) => &items[idx].units[u].uuid,
            None => &items[idx].uuid,
        };
        if current != uuid {
            ensure_uuid_free(&items, uuid)?;
        }
    }
    if let Some(product) = req.product {
        items[idx].product_id = existing_product_id(&*store.products, product).await?;
    }

    let item = &mut items[idx];
    if let Some(quantity) = req.quantity {
        item.quantity = quantity;
    }
    patch::apply(&mut item.remaining, req.remaining);
    patch::apply(&mut item.location, req.location);
    patch::apply(&mut item.tags, req.tags);

    match unit {
        Some(u) => {
            let unit = &mut item.units[u];
            if let Some(uuid) = req.uuid {
                unit.uuid = uuid;
            }
            if let Some(opened) = req.opened {
                unit.opened = opened;
            }
            patch::apply(&mut unit.expiration_date, req.expiration_date);
            patch::apply(&mut unit.weight_g, req.container_weight);
        }
        None => {
            if let Some(uuid) = req.uuid {
                item.uuid = uuid;
            }
            if let Some(opened) = req.opened {
                item.opened = opened;
            }
            patch::apply(&mut item.expiration_date, req.expiration_date);
            patch::apply(&mut item.container_weight, req.container_weight);
        }
    }

    repo::save(&*store.items, &items).await?;
    let item = items.swap_remove(idx);
    Ok(Some(view(&*store.products, item).await?))
}

/// `false` when nothing matched; repeating a delete is a no-op.
///
/// A unit uuid removes just that unit; the grouped entry goes with its last unit.
pub async fn delete_item(store: &Store, key: &ItemKey) -> Result<bool, AppError> {
    let _guard = store.lock().await;
    let mut items = repo::list(&*store.items).await?;
    let Some((idx, unit)) = locate(&items, key) else {
        return Ok(false);
    };

    match unit {
        Some(u) => {
            let entry = &mut items[idx];
            entry.units.remove(u);
            entry.quantity = entry.units.len() as i64;
            info!(key = ?key, left = entry.quantity, "inventory unit deleted");
            if entry.units.is_empty() {
                items.remove(idx);
            }
        }
        None => {
            items.remove(idx);
            info!(key = ?key, "inventory entry deleted");
        }
    }
    repo::save(&*store.items, &items).await?;
    Ok(true)
}

/// Subtract `amount` from `remaining` (unset counts as 0), floored at 0.
pub async fn consume(store: &Store, id: i64, amount: f64) -> Result<Option<ItemView>, AppError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::validation("amount must be a non-negative number"));
    }

    let _guard = store.lock().await;
    let mut items = repo::list(&*store.items).await?;
    let Some(idx) = items.iter().position(|i| i.id == id) else {
        return Ok(None);
    };

    let item = &mut items[idx];
    let remaining = (item.remaining.unwrap_or(0.0) - amount).max(0.0);
    item.remaining = Some(remaining);

    repo::save(&*store.items, &items).await?;
    info!(item_id = id, amount, remaining, "inventory entry consumed");
    let item = items.swap_remove(idx);
    Ok(Some(view(&*store.products, item).await?))
}

async fn view(products: &Catalog, item: Item) -> Result<ItemView, AppError> {
    let product = catalog::find_by_id(products, &item.product_id).await?;
    Ok(ItemView::new(item, product))
}

async fn existing_product_id(
    products: &Catalog,
    reference: Option<ProductRef>,
) -> Result<String, AppError> {
    match reference {
        Some(ProductRef::ById(id)) => match catalog::find_by_id(products, &id).await? {
            Some(product) => Ok(product.id),
            None => Err(AppError::not_found("Product not found")),
        },
        Some(ProductRef::Embedded(_)) => Err(AppError::validation("product id required")),
        None => Err(AppError::validation("product cannot be null")),
    }
}

/// Entry index for `key`, plus the unit index when a unit uuid matched.
fn locate(items: &[Item], key: &ItemKey) -> Option<(usize, Option<usize>)> {
    let idx = items.iter().position(|i| key.matches(i))?;
    let unit = match key {
        ItemKey::Uuid(uuid) => items[idx].unit_position(uuid),
        ItemKey::Id(_) => None,
    };
    Some((idx, unit))
}

fn ensure_uuid_free(items: &[Item], uuid: &str) -> Result<(), AppError> {
    if items.iter().any(|item| item.has_uuid(uuid)) {
        return Err(AppError::validation(format!("uuid {uuid} already in use")));
    }
    Ok(())
}
