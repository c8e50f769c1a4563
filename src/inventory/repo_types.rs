use serde::{Deserialize, Serialize};

use crate::{
    ids,
    nutrition::{self, Nutrition},
    products::repo_types::{ContainerInfo, Product},
};

/// One physical container inside a grouped inventory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub uuid: String,
    #[serde(default)]
    pub opened: bool,
    #[serde(default)]
    pub weight_g: Option<i64>,
    #[serde(default)]
    pub expiration_date: Option<String>,
}

/// Inventory entry, one line of the inventory file.
///
/// `product_id` is a weak reference; the catalog entry is resolved at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    #[serde(deserialize_with = "ids::deserialize_id")]
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub opened: bool,
    #[serde(default)]
    pub remaining: Option<f64>,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub container_weight: Option<i64>,

    // catalog snapshot, grouped mode only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_info: Option<ContainerInfo>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nutrition::deserialize_normalized"
    )]
    pub nutrition: Option<Nutrition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<Unit>,
}

fn default_quantity() -> i64 {
    1
}

impl Item {
    /// Matches the entry uuid or any unit uuid.
    pub fn has_uuid(&self, uuid: &str) -> bool {
        self.uuid == uuid || self.units.iter().any(|u| u.uuid == uuid)
    }

    /// Index of the unit carrying `uuid`. The entry's own uuid is not a unit.
    pub fn unit_position(&self, uuid: &str) -> Option<usize> {
        if self.uuid == uuid {
            return None;
        }
        self.units.iter().position(|u| u.uuid == uuid)
    }
}

/// How a caller addresses an inventory entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKey {
    Id(i64),
    Uuid(String),
}

impl ItemKey {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            ItemKey::Id(id) => item.id == *id,
            ItemKey::Uuid(uuid) => item.has_uuid(uuid),
        }
    }
}

/// Inventory entry as returned to clients: `product_id` swapped for the
/// embedded catalog entry (`None` if it has since been deleted).
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub id: i64,
    pub product: Option<Product>,
    pub quantity: i64,
    pub opened: bool,
    pub remaining: Option<f64>,
    pub uuid: String,
    pub expiration_date: Option<String>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub container_weight: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_info: Option<ContainerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<Unit>,
}

impl ItemView {
    pub fn new(item: Item, product: Option<Product>) -> Self {
        Self {
            id: item.id,
            product,
            quantity: item.quantity,
            opened: item.opened,
            remaining: item.remaining,
            uuid: item.uuid,
            expiration_date: item.expiration_date,
            location: item.location,
            tags: item.tags,
            container_weight: item.container_weight,
            name: item.name,
            upc: item.upc,
            container_info: item.container_info,
            nutrition: item.nutrition,
            units: item.units,
        }
    }
}
