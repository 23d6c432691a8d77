//! Per-item, per-day and per-range nutrition totals.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::error::AppError;
use crate::meals::dto::{EnergyRow, LoggedItem};
use crate::nutrition::units::scale_factor;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Totals {
    energy_kcal: f64,
    proteins: f64,
    fat: f64,
    carbs: f64,
}

impl Totals {
    fn of_item(item: &LoggedItem) -> Self {
        let factor = scale_factor(&item.quantity_unit, item.quantity);
        Self {
            energy_kcal: contribution(item.energy_kcal_per_100, factor),
            proteins: contribution(item.proteins_per_100, factor),
            fat: contribution(item.fat_per_100, factor),
            carbs: contribution(item.carbs_per_100, factor),
        }
    }

    fn add(&mut self, other: Totals) {
        self.energy_kcal += other.energy_kcal;
        self.proteins += other.proteins;
        self.fat += other.fat;
        self.carbs += other.carbs;
    }
}

/// Malformed values contribute nothing instead of poisoning the sum.
fn contribution(per_100: f64, factor: f64) -> f64 {
    let value = per_100 * factor;
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

pub fn round_kcal(value: f64) -> i64 {
    value.round() as i64
}

pub fn round_macro(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// What one item contributes at its logged quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemContribution {
    pub energy_kcal: i64,
    pub proteins: f64,
    pub fat: f64,
    pub carbs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    pub total_energy_kcal: i64,
    pub total_proteins: f64,
    pub total_fat: f64,
    pub total_carbs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCalories {
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    pub calories: i64,
}

/// Calories for every day of an inclusive range, in date order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeSummary {
    pub days: Vec<DayCalories>,
}

pub fn item_contribution(item: &LoggedItem) -> ItemContribution {
    let totals = Totals::of_item(item);
    ItemContribution {
        energy_kcal: round_kcal(totals.energy_kcal),
        proteins: round_macro(totals.proteins),
        fat: round_macro(totals.fat),
        carbs: round_macro(totals.carbs),
    }
}

pub fn aggregate_day(date: Date, items: &[LoggedItem]) -> DaySummary {
    let mut totals = Totals::default();
    for item in items {
        totals.add(Totals::of_item(item));
    }
    DaySummary {
        date,
        total_energy_kcal: round_kcal(totals.energy_kcal),
        total_proteins: round_macro(totals.proteins),
        total_fat: round_macro(totals.fat),
        total_carbs: round_macro(totals.carbs),
    }
}

/// Sums kcal per day over `[from, to]`.
///
/// The store omits days without rows, so every day of the range is emitted
/// explicitly with `0` as the default. Rows outside the range are ignored.
pub fn aggregate_range(rows: &[EnergyRow], from: Date, to: Date) -> Result<RangeSummary, AppError> {
    if from > to {
        return Err(AppError::validation(
            "invalid_date_range",
            format!("range start {from} is after its end {to}"),
        ));
    }

    let mut totals: HashMap<Date, f64> = HashMap::new();
    for row in rows.iter().filter(|row| row.date >= from && row.date <= to) {
        let factor = scale_factor(&row.quantity_unit, row.quantity);
        *totals.entry(row.date).or_default() += contribution(row.energy_kcal, factor);
    }

    let mut days = Vec::new();
    let mut cursor = Some(from);
    while let Some(date) = cursor.filter(|d| *d <= to) {
        days.push(DayCalories {
            date,
            calories: round_kcal(totals.get(&date).copied().unwrap_or(0.0)),
        });
        cursor = date.next_day();
    }

    Ok(RangeSummary { days })
}

/// Monday through Sunday of the week containing `date`.
pub fn week_range(date: Date) -> (Date, Date) {
    let monday = date - Duration::days(i64::from(date.weekday().number_days_from_monday()));
    (monday, monday + Duration::days(6))
}
