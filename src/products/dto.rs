use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::Date;

use crate::meals::dto::{MealItemDraft, MealSlot};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutriments {
    #[serde(rename = "energyKcal100g", skip_serializing_if = "Option::is_none", default)]
    pub energy_kcal_100g: Option<f64>,
    #[serde(rename = "proteins100g", skip_serializing_if = "Option::is_none", default)]
    pub proteins_100g: Option<f64>,
    #[serde(rename = "fat100g", skip_serializing_if = "Option::is_none", default)]
    pub fat_100g: Option<f64>,
    #[serde(rename = "carbs100g", skip_serializing_if = "Option::is_none", default)]
    pub carbs_100g: Option<f64>,
}

/// Product candidate returned by a lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub code: String,
    pub name: String,
    pub brands: String,
    pub image_url: String,
    pub nutriments: Nutriments,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub quantity_unit: Option<String>,
}

impl Product {
    /// Turns a lookup result into a loggable draft; missing numbers count as zero.
    pub fn into_draft(self, date: Date, meal_slot: MealSlot) -> MealItemDraft {
        MealItemDraft {
            date,
            meal_slot,
            product_name: self.name,
            product_brand: Some(self.brands).filter(|b| !b.is_empty()),
            energy_kcal_per_100: self.nutriments.energy_kcal_100g.unwrap_or(0.0),
            proteins_per_100: self.nutriments.proteins_100g.unwrap_or(0.0),
            fat_per_100: self.nutriments.fat_100g.unwrap_or(0.0),
            carbs_per_100: self.nutriments.carbs_100g.unwrap_or(0.0),
            quantity: self.quantity.filter(|q| q.is_finite()).unwrap_or(0.0).max(0.0),
            quantity_unit: self.quantity_unit.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub items: Vec<Product>,
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// --- OpenFoodFacts payloads ---
//
// Numeric fields arrive as numbers or numeric strings, so they are kept as raw
// JSON values and coerced when mapped.

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OffNutriments {
    #[serde(rename = "energy-kcal_100g")]
    pub energy_kcal_100g: Option<Value>,
    pub proteins_100g: Option<Value>,
    pub fat_100g: Option<Value>,
    pub carbohydrates_100g: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OffProduct {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(flatten)]
    pub names: serde_json::Map<String, Value>,
    pub brands: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub nutriments: Option<OffNutriments>,
    pub product_quantity: Option<Value>,
    pub product_quantity_unit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OffSearchResponse {
    #[serde(default)]
    pub products: Vec<OffProduct>,
    pub count: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OffProductResponse {
    #[serde(default)]
    pub status: Option<Value>,
    pub product: Option<OffProduct>,
}

pub(crate) fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

impl OffProduct {
    /// Prefers the localized product name (`product_name_<lang>`).
    pub(crate) fn into_product(self, language: &str) -> Product {
        let localized = format!("product_name_{language}");
        let name = [localized.as_str(), "product_name"]
            .iter()
            .find_map(|key| match self.names.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
            .unwrap_or_default();
        let nutriments = self.nutriments.unwrap_or_default();

        Product {
            code: coerce_string(self.code.as_ref()),
            name,
            brands: self.brands.unwrap_or_default(),
            image_url: self.image_url.unwrap_or_default(),
            nutriments: Nutriments {
                energy_kcal_100g: coerce_number(nutriments.energy_kcal_100g.as_ref()),
                proteins_100g: coerce_number(nutriments.proteins_100g.as_ref()),
                fat_100g: coerce_number(nutriments.fat_100g.as_ref()),
                carbs_100g: coerce_number(nutriments.carbohydrates_100g.as_ref()),
            },
            quantity: coerce_number(self.product_quantity.as_ref()),
            quantity_unit: self.product_quantity_unit.filter(|u| !u.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    #[test]
    fn maps_off_product_with_coercion_and_localized_name() {
        let raw: OffProduct = serde_json::from_value(json!({
            "code": 5900512300108u64,
            "product_name": "Milk",
            "product_name_pl": "Mleko",
            "brands": "Mlekovita",
            "nutriments": {
                "energy-kcal_100g": "64",
                "proteins_100g": 3.2,
                "fat_100g": "n/a"
            },
            "product_quantity": "1000",
            "product_quantity_unit": "ml"
        }))
        .unwrap();

        let product = raw.into_product("pl");
        assert_eq!(product.code, "5900512300108");
        assert_eq!(product.name, "Mleko");
        assert_eq!(product.nutriments.energy_kcal_100g, Some(64.0));
        assert_eq!(product.nutriments.proteins_100g, Some(3.2));
        assert_eq!(product.nutriments.fat_100g, None);
        assert_eq!(product.nutriments.carbs_100g, None);
        assert_eq!(product.quantity, Some(1000.0));
        assert_eq!(product.quantity_unit.as_deref(), Some("ml"));
    }

    #[test]
    fn falls_back_to_generic_name() {
        let raw: OffProduct =
            serde_json::from_value(json!({ "code": "1", "product_name": "Bread" })).unwrap();
        let product = raw.into_product("pl");
        assert_eq!(product.name, "Bread");
        assert_eq!(product.brands, "");
        assert_eq!(product.nutriments, Nutriments::default());
    }

    #[test]
    fn drafts_default_missing_numbers_to_zero() {
        let product = Product {
            code: "1".into(),
            name: "Apple".into(),
            brands: String::new(),
            image_url: String::new(),
            nutriments: Nutriments {
                energy_kcal_100g: Some(52.0),
                ..Nutriments::default()
            },
            quantity: None,
            quantity_unit: None,
        };
        let draft = product.into_draft(date!(2024 - 01 - 01), MealSlot::Snack);
        assert_eq!(draft.energy_kcal_per_100, 52.0);
        assert_eq!(draft.proteins_per_100, 0.0);
        assert_eq!(draft.quantity, 0.0);
        assert_eq!(draft.quantity_unit, "");
        assert_eq!(draft.product_brand, None);
    }
}
