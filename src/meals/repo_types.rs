use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::AppError;
use crate::meals::dto::{ItemId, LoggedItem};

#[derive(Debug, FromRow)]
pub struct MealItemRow {
    pub id: Uuid,
    pub created_at: OffsetDateTime,
    pub date: Date,
    pub meal_type: String,
    pub product_name: String,
    pub product_brands: Option<String>,
    pub product_energy_kcal: f64,
    pub product_proteins_100g: f64,
    pub product_fat_100g: f64,
    pub product_carbs_100g: f64,
    pub product_quantity: f64,
    pub product_quantity_unit: String,
}

impl TryFrom<MealItemRow> for LoggedItem {
    type Error = AppError;

    fn try_from(r: MealItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ItemId::Stored(r.id),
            created_at: Some(r.created_at),
            date: r.date,
            meal_slot: r.meal_type.parse()?,
            product_name: r.product_name,
            product_brand: r.product_brands,
            energy_kcal_per_100: r.product_energy_kcal,
            proteins_per_100: r.product_proteins_100g,
            fat_per_100: r.product_fat_100g,
            carbs_per_100: r.product_carbs_100g,
            quantity: r.product_quantity,
            quantity_unit: r.product_quantity_unit,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct EnergyRowRecord {
    pub date: Date,
    pub product_energy_kcal: f64,
    pub product_quantity: f64,
    pub product_quantity_unit: String,
}

impl From<EnergyRowRecord> for crate::meals::dto::EnergyRow {
    fn from(r: EnergyRowRecord) -> Self {
        Self {
            date: r.date,
            energy_kcal: r.product_energy_kcal,
            quantity: r.product_quantity,
            quantity_unit: r.product_quantity_unit,
        }
    }
}
