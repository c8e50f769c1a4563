use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

const SERVING_FIELDS: &[&str] = &["size_g", "calories"];

const MACRO_FIELDS: &[&str] = &[
    "total_fat",
    "saturated_fat",
    "trans_fat",
    "cholesterol",
    "protein",
    "total_carbohydrate",
    "dietary_fiber",
    "sugars",
    "added_sugars",
    "sodium",
    "potassium",
];

const MICRO_FIELDS: &[&str] = &[
    "iron",
    "calcium",
    "vitamin_d",
    "vitamin_e",
    "niacin",
    "biotin",
    "chromium",
    "copper",
    "folate",
    "iodine",
    "magnesium",
    "manganese",
    "molybdenum",
    "pantothenic_acid",
    "phosphorus",
    "riboflavin",
    "selenium",
    "thiamin",
    "vitamin_a",
    "vitamin_b12",
    "vitamin_b6",
    "vitamin_c",
    "vitamin_k",
    "zinc",
];

const SECTION_KEYS: &[&str] = &["serving", "macros", "micronutrients"];

/// Nutrition facts restricted to recognised nutrient keys.
///
/// Values are kept as supplied; empty sections are omitted when serialised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub serving: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub macros: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub micronutrients: Map<String, Value>,
}

impl Nutrition {
    pub fn is_empty(&self) -> bool {
        self.serving.is_empty() && self.macros.is_empty() && self.micronutrients.is_empty()
    }
}

/// Filter an arbitrary nutrition payload into the sectioned shape.
///
/// Accepts either the sectioned shape (`serving` / `macros` / `micronutrients`)
/// or the flat legacy shape. Unknown keys are dropped; an empty result is `None`.
pub fn normalize(raw: Option<&Value>) -> Option<Nutrition> {
    let info = raw?.as_object()?;

    let nutrition = if SECTION_KEYS.iter().any(|k| info.contains_key(*k)) {
        Nutrition {
            serving: filter_section(info.get("serving"), SERVING_FIELDS),
            macros: filter_section(info.get("macros"), MACRO_FIELDS),
            micronutrients: filter_section(info.get("micronutrients"), MICRO_FIELDS),
        }
    } else {
        let mut out = Nutrition::default();
        for (key, value) in info {
            match key.as_str() {
                "serving_size" | "size_g" => {
                    out.serving.insert("size_g".into(), value.clone());
                }
                "calories" => {
                    out.serving.insert("calories".into(), value.clone());
                }
                k if MACRO_FIELDS.contains(&k) => {
                    out.macros.insert(key.clone(), value.clone());
                }
                k if MICRO_FIELDS.contains(&k) => {
                    out.micronutrients.insert(key.clone(), value.clone());
                }
                _ => {}
            }
        }
        out
    };

    (!nutrition.is_empty()).then_some(nutrition)
}

fn filter_section(section: Option<&Value>, allowed: &[&str]) -> Map<String, Value> {
    section
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .filter(|(k, _)| allowed.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Serde hook: read any nutrition payload and normalise it on the way in.
pub fn deserialize_normalized<'de, D>(de: D) -> Result<Option<Nutrition>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(de)?;
    Ok(normalize(raw.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drops_unknown_flat_keys() {
        let n = normalize(Some(&json!({"calories": 80, "unknown_field": 1}))).unwrap();
        assert_eq!(n.serving.get("calories"), Some(&json!(80)));
        let out = serde_json::to_value(&n).unwrap();
        assert!(!out.to_string().contains("unknown_field"));
        assert_eq!(out, json!({"serving": {"calories": 80}}));
    }

    #[test]
    fn flat_shape_is_sectioned() {
        let n = normalize(Some(&json!({
            "serving_size": 30,
            "protein": 4,
            "iron": "2mg",
        })))
        .unwrap();
        assert_eq!(n.serving.get("size_g"), Some(&json!(30)));
        assert_eq!(n.macros.get("protein"), Some(&json!(4)));
        assert_eq!(n.micronutrients.get("iron"), Some(&json!("2mg")));
    }

    #[test]
    fn sectioned_shape_filters_each_section() {
        let n = normalize(Some(&json!({
            "serving": {"calories": 50, "iron": 1},
            "macros": {"sugars": 3, "bogus": 9},
        })))
        .unwrap();
        assert_eq!(n.serving.len(), 1);
        assert_eq!(n.macros.get("sugars"), Some(&json!(3)));
        assert!(n.micronutrients.is_empty());
        let out = serde_json::to_value(&n).unwrap();
        assert!(out.get("micronutrients").is_none());
    }

    #[test]
    fn empty_or_missing_input_is_none() {
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some(&Value::Null)), None);
        assert_eq!(normalize(Some(&json!({}))), None);
        assert_eq!(normalize(Some(&json!({"junk": true}))), None);
        assert_eq!(normalize(Some(&json!({"macros": {}}))), None);
    }

    #[test]
    fn deserializer_normalizes_stored_legacy_shape() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "deserialize_normalized")]
            nutrition: Option<Nutrition>,
        }
        let row: Row = serde_json::from_str(r#"{"nutrition": {"calories": 10}}"#).unwrap();
        assert_eq!(row.nutrition.unwrap().serving.get("calories"), Some(&json!(10)));
        let row: Row = serde_json::from_str("{}").unwrap();
        assert!(row.nutrition.is_none());
    }
}
