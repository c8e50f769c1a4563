use serde::Deserialize;

use crate::{
    nutrition::{self, Nutrition},
    patch::double_option,
    products::{
        dto::ProductRef,
        repo_types::{ContainerInfo, ProductFields},
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct CreateItemRequest {
    #[serde(default)]
    pub product: Option<ProductRef>,
    #[serde(default)]
    pub upc: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub container_info: Option<ContainerInfo>,
    #[serde(default, deserialize_with = "nutrition::deserialize_normalized")]
    pub nutrition: Option<Nutrition>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,

    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub opened: Option<bool>,
    #[serde(default)]
    pub remaining: Option<f64>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "weight_g")]
    pub container_weight: Option<i64>,
}

impl CreateItemRequest {
    /// Product fields given directly on the request body.
    pub fn product_fields(&mut self) -> ProductFields {
        ProductFields {
            upc: self.upc.take(),
            name: self.name.take(),
            tags: self.tags.take(),
            container_info: self.container_info.take(),
            nutrition: self.nutrition.take(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub product: Option<Option<ProductRef>>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub opened: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub remaining: Option<Option<f64>>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub expiration_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tags: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub container_weight: Option<Option<i64>>,
}

#[derive(Debug, Deserialize)]
pub struct ConsumeRequest {
    pub amount: f64,
}
