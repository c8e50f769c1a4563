use serde::Deserialize;

use super::repo_types::{ContainerInfo, ProductFields};
use crate::{
    ids::IdValue,
    nutrition::{self, Nutrition},
    patch::double_option,
};

/// How a create request names its product.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawProductRef")]
pub enum ProductRef {
    /// Bare id, or an embedded object carrying `id` / `product_id`.
    ById(String),
    /// Embedded object without an id: its fields are fallbacks for a UPC lookup.
    Embedded(ProductFields),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProductRef {
    Id(IdValue),
    Object(EmbeddedProduct),
}

#[derive(Deserialize)]
struct EmbeddedProduct {
    #[serde(default, alias = "product_id")]
    id: Option<IdValue>,
    #[serde(flatten)]
    fields: ProductFields,
}

impl From<RawProductRef> for ProductRef {
    fn from(raw: RawProductRef) -> Self {
        match raw {
            RawProductRef::Id(id) => ProductRef::ById(id.into()),
            RawProductRef::Object(EmbeddedProduct { id: Some(id), .. }) => {
                ProductRef::ById(id.into())
            }
            RawProductRef::Object(EmbeddedProduct { id: None, fields }) => {
                ProductRef::Embedded(fields)
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateProductRequest {
    #[serde(flatten)]
    pub fields: ProductFields,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub upc: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tags: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub container_info: Option<Option<ContainerInfo>>,
    #[serde(default, deserialize_with = "patch_nutrition")]
    pub nutrition: Option<Option<Nutrition>>,
}

fn patch_nutrition<'de, D>(de: D) -> Result<Option<Option<Nutrition>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    nutrition::deserialize_normalized(de).map(Some)
}
