use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ids, nutrition::{self, Nutrition}};

/// Packaging metadata for a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_weight_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_container_weight_g: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContainerInfo {
    /// Full container weight, when both parts are known.
    pub fn unit_weight_g(&self) -> Option<i64> {
        match (self.net_weight_g, self.empty_container_weight_g) {
            (Some(net), Some(empty)) => Some((net + empty).round() as i64),
            _ => None,
        }
    }
}

/// Catalog entry, one line of the product file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "ids::deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub upc: Option<String>,
    #[serde(default, deserialize_with = "nutrition::deserialize_normalized")]
    pub nutrition: Option<Nutrition>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_info: Option<ContainerInfo>,
}

impl Product {
    pub fn fields(&self) -> ProductFields {
        ProductFields {
            upc: self.upc.clone(),
            name: self.name.clone(),
            tags: self.tags.clone(),
            container_info: self.container_info.clone(),
            nutrition: self.nutrition.clone(),
        }
    }
}

/// The descriptive part of a product, as supplied by a client or read off an entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductFields {
    #[serde(default)]
    pub upc: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub container_info: Option<ContainerInfo>,
    #[serde(default, deserialize_with = "nutrition::deserialize_normalized")]
    pub nutrition: Option<Nutrition>,
}

impl ProductFields {
    /// Keep every field already set; fill the rest from `other`.
    /// Blank strings and empty lists count as unset.
    pub fn or(self, other: ProductFields) -> ProductFields {
        ProductFields {
            upc: non_blank(self.upc).or_else(|| non_blank(other.upc)),
            name: non_blank(self.name).or_else(|| non_blank(other.name)),
            tags: self.tags.filter(|t| !t.is_empty()).or(other.tags),
            container_info: self.container_info.or(other.container_info),
            nutrition: self.nutrition.or(other.nutrition),
        }
    }

    pub fn unit_weight_g(&self) -> Option<i64> {
        self.container_info.as_ref().and_then(ContainerInfo::unit_weight_g)
    }
}

pub(crate) fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unit_weight_needs_both_parts() {
        let full = ContainerInfo {
            net_weight_g: Some(453.0),
            empty_container_weight_g: Some(40.4),
            ..Default::default()
        };
        assert_eq!(full.unit_weight_g(), Some(493));
        let partial = ContainerInfo {
            net_weight_g: Some(453.0),
            ..Default::default()
        };
        assert_eq!(partial.unit_weight_g(), None);
    }

    #[test]
    fn container_info_keeps_extra_keys() {
        let info: ContainerInfo =
            serde_json::from_value(json!({"net_weight_g": 100, "material": "glass"})).unwrap();
        assert_eq!(info.net_weight_g, Some(100.0));
        assert_eq!(serde_json::to_value(&info).unwrap()["material"], "glass");
    }

    #[test]
    fn or_prefers_supplied_fields() {
        let supplied = ProductFields {
            name: Some("Oats".into()),
            upc: Some("  ".into()),
            ..Default::default()
        };
        let stored = ProductFields {
            name: Some("Rolled oats".into()),
            upc: Some("0123".into()),
            tags: Some(vec!["grain".into()]),
            ..Default::default()
        };
        let merged = supplied.or(stored);
        assert_eq!(merged.name.as_deref(), Some("Oats"));
        assert_eq!(merged.upc.as_deref(), Some("0123"));
        assert_eq!(merged.tags, Some(vec!["grain".to_string()]));
    }

    #[test]
    fn product_line_with_integer_id_and_legacy_nutrition() {
        let p: Product = serde_json::from_str(
            r#"{"id": 7, "name": "Bread", "upc": "111", "nutrition": {"calories": 50, "x": 1}}"#,
        )
        .unwrap();
        assert_eq!(p.id, "7");
        assert_eq!(
            serde_json::to_value(p.nutrition).unwrap(),
            json!({"serving": {"calories": 50}})
        );
        assert!(p.tags.is_none());
    }
}
