use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::AppError;
use crate::nutrition::summary::{DaySummary, ItemContribution};

const PENDING_PREFIX: &str = "optimistic-";

/// Meal a logged item belongs to within its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MealSlot {
    Breakfast,
    SecondBreakfast,
    Lunch,
    Snack,
    Dinner,
}

impl MealSlot {
    pub const ALL: [MealSlot; 5] = [
        MealSlot::Breakfast,
        MealSlot::SecondBreakfast,
        MealSlot::Lunch,
        MealSlot::Snack,
        MealSlot::Dinner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::SecondBreakfast => "second-breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Snack => "snack",
            MealSlot::Dinner => "dinner",
        }
    }
}

impl FromStr for MealSlot {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealSlot::ALL
            .into_iter()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| AppError::validation("invalid_meal_type", format!("unknown meal type {s:?}")))
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a logged item: assigned by the store, or a local placeholder
/// (`optimistic-<n>`) while a create is still in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ItemId {
    Stored(Uuid),
    Pending(u64),
}

impl ItemId {
    pub fn is_pending(&self) -> bool {
        matches!(self, ItemId::Pending(_))
    }

    pub fn stored(&self) -> Option<Uuid> {
        match self {
            ItemId::Stored(id) => Some(*id),
            ItemId::Pending(_) => None,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Stored(id) => write!(f, "{id}"),
            ItemId::Pending(n) => write!(f, "{PENDING_PREFIX}{n}"),
        }
    }
}

impl FromStr for ItemId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(n) = s.strip_prefix(PENDING_PREFIX) {
            return n
                .parse()
                .map(ItemId::Pending)
                .map_err(|_| AppError::validation("invalid_params", format!("bad placeholder id {s:?}")));
        }
        Uuid::parse_str(s)
            .map(ItemId::Stored)
            .map_err(|_| AppError::validation("invalid_params", format!("bad item id {s:?}")))
    }
}

impl TryFrom<String> for ItemId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.to_string()
    }
}

impl From<Uuid> for ItemId {
    fn from(id: Uuid) -> Self {
        ItemId::Stored(id)
    }
}

/// One product consumed within a meal. Nutrients are per 100 base units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedItem {
    pub id: ItemId,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    #[serde(rename = "mealType")]
    pub meal_slot: MealSlot,
    pub product_name: String,
    #[serde(rename = "productBrands")]
    pub product_brand: Option<String>,
    #[serde(rename = "productEnergyKcal")]
    pub energy_kcal_per_100: f64,
    #[serde(rename = "productProteins100g")]
    pub proteins_per_100: f64,
    #[serde(rename = "productFat100g")]
    pub fat_per_100: f64,
    #[serde(rename = "productCarbs100g")]
    pub carbs_per_100: f64,
    #[serde(rename = "productQuantity")]
    pub quantity: f64,
    #[serde(rename = "productQuantityUnit")]
    pub quantity_unit: String,
}

/// Validated input for logging a product; becomes a `LoggedItem` once an id is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealItemDraft {
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    #[serde(rename = "mealType")]
    pub meal_slot: MealSlot,
    pub product_name: String,
    #[serde(rename = "productBrands")]
    pub product_brand: Option<String>,
    #[serde(rename = "productEnergyKcal")]
    pub energy_kcal_per_100: f64,
    #[serde(rename = "productProteins100g")]
    pub proteins_per_100: f64,
    #[serde(rename = "productFat100g")]
    pub fat_per_100: f64,
    #[serde(rename = "productCarbs100g")]
    pub carbs_per_100: f64,
    #[serde(rename = "productQuantity")]
    pub quantity: f64,
    #[serde(rename = "productQuantityUnit")]
    pub quantity_unit: String,
}

impl MealItemDraft {
    pub fn into_item(self, id: ItemId, created_at: Option<OffsetDateTime>) -> LoggedItem {
        LoggedItem {
            id,
            created_at,
            date: self.date,
            meal_slot: self.meal_slot,
            product_name: self.product_name,
            product_brand: self.product_brand,
            energy_kcal_per_100: self.energy_kcal_per_100,
            proteins_per_100: self.proteins_per_100,
            fat_per_100: self.fat_per_100,
            carbs_per_100: self.carbs_per_100,
            quantity: self.quantity,
            quantity_unit: self.quantity_unit,
        }
    }
}

/// Kcal-only projection of a stored item, as returned by range queries.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyRow {
    pub date: Date,
    pub energy_kcal: f64,
    pub quantity: f64,
    pub quantity_unit: String,
}

// --- request bodies (validated in services) ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMealItemRequest {
    pub meal_type: String,
    pub date: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_brands: Option<String>,
    #[serde(default)]
    pub product_energy_kcal: f64,
    #[serde(default)]
    pub product_proteins_100g: f64,
    #[serde(default)]
    pub product_fat_100g: f64,
    #[serde(default)]
    pub product_carbs_100g: f64,
    #[serde(default)]
    pub product_quantity: f64,
    #[serde(default)]
    pub product_quantity_unit: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub product_quantity: f64,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: String,
    pub to: String,
}

// --- responses ---

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemResponse {
    pub item: LoggedItem,
}

#[derive(Debug, Serialize)]
pub struct ListedItem {
    #[serde(flatten)]
    pub item: LoggedItem,
    pub contribution: ItemContribution,
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub items: Vec<ListedItem>,
    pub totals: DaySummary,
}
