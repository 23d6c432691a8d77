use time::Date;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dates::parse_date;
use crate::error::AppError;
use crate::meals::dto::{
    CreateMealItemRequest, ItemsResponse, ListedItem, LoggedItem, MealItemDraft, RangeQuery,
};
use crate::meals::store::MealStore;
use crate::nutrition::summary::{aggregate_day, aggregate_range, item_contribution, RangeSummary};

/// Longest summary range served, in days (a leap year).
pub const MAX_RANGE_DAYS: i64 = 366;

/// Quantities are clamped to zero at entry; non-finite values are rejected.
pub fn clamp_quantity(quantity: f64) -> Result<f64, AppError> {
    if !quantity.is_finite() {
        return Err(AppError::validation(
            "invalid_body",
            "productQuantity must be a finite number",
        ));
    }
    Ok(quantity.max(0.0))
}

fn nutrient(name: &str, value: f64) -> Result<f64, AppError> {
    if !value.is_finite() {
        return Err(AppError::validation(
            "invalid_body",
            format!("{name} must be a finite number"),
        ));
    }
    Ok(value)
}

fn body_error(e: AppError) -> AppError {
    AppError::validation("invalid_body", e.to_string())
}

pub fn validate_draft(req: CreateMealItemRequest) -> Result<MealItemDraft, AppError> {
    let date = parse_date(&req.date).map_err(body_error)?;
    let meal_slot = req.meal_type.parse().map_err(body_error)?;

    Ok(MealItemDraft {
        date,
        meal_slot,
        product_name: req.product_name,
        product_brand: req.product_brands.filter(|b| !b.trim().is_empty()),
        energy_kcal_per_100: nutrient("productEnergyKcal", req.product_energy_kcal)?,
        proteins_per_100: nutrient("productProteins100g", req.product_proteins_100g)?,
        fat_per_100: nutrient("productFat100g", req.product_fat_100g)?,
        carbs_per_100: nutrient("productCarbs100g", req.product_carbs_100g)?,
        quantity: clamp_quantity(req.product_quantity)?,
        quantity_unit: req.product_quantity_unit,
    })
}

pub fn parse_item_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::validation("invalid_params", format!("invalid meal item id {raw:?}")))
}

pub fn parse_day(raw: &str) -> Result<Date, AppError> {
    parse_date(raw).map_err(|e| AppError::validation("invalid_query_parameters", e.to_string()))
}

pub fn parse_range(q: &RangeQuery) -> Result<(Date, Date), AppError> {
    let from = parse_day(&q.from)?;
    let to = parse_day(&q.to)?;
    if from > to {
        warn!(%from, %to, "inverted date range");
        return Err(AppError::validation(
            "invalid_date_range",
            format!("from {from} is after to {to}"),
        ));
    }
    let days = (to - from).whole_days() + 1;
    if days > MAX_RANGE_DAYS {
        warn!(%from, %to, days, "date range too long");
        return Err(AppError::validation(
            "invalid_date_range",
            format!("range spans {days} days, at most {MAX_RANGE_DAYS} allowed"),
        ));
    }
    Ok((from, to))
}

pub fn listed_day(date: Date, items: Vec<LoggedItem>) -> ItemsResponse {
    let totals = aggregate_day(date, &items);
    let items = items
        .into_iter()
        .map(|item| ListedItem {
            contribution: item_contribution(&item),
            item,
        })
        .collect();
    ItemsResponse { items, totals }
}

pub async fn list_day(store: &dyn MealStore, date: Date) -> Result<ItemsResponse, AppError> {
    let items = store.list(date).await?;
    debug!(%date, count = items.len(), "listed meal items");
    Ok(listed_day(date, items))
}

pub async fn summarize_range(
    store: &dyn MealStore,
    from: Date,
    to: Date,
) -> Result<RangeSummary, AppError> {
    let rows = store.list_range(from, to).await?;
    debug!(%from, %to, rows = rows.len(), "summarizing range");
    aggregate_range(&rows, from, to)
}
