//! Quantity unit classification.
//!
//! Nutrient values are always stored per 100 base units. A logged quantity only
//! rescales them when its unit belongs to the gram or milliliter family; any
//! other unit (pieces, servings, an empty string) uses the values unscaled.

const PER_HUNDRED_UNITS: [&str; 6] = ["g", "gram", "grams", "ml", "milliliter", "milliliters"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    PerHundredBase,
    PerItem,
}

pub fn classify(unit: &str) -> UnitKind {
    if PER_HUNDRED_UNITS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(unit))
    {
        UnitKind::PerHundredBase
    } else {
        UnitKind::PerItem
    }
}

/// Multiplier applied to per-100 nutrient values for a logged quantity.
///
/// Never negative or non-finite: anything that cannot be scaled yields `1`.
pub fn scale_factor(unit: &str, quantity: f64) -> f64 {
    match classify(unit) {
        UnitKind::PerHundredBase if quantity.is_finite() && quantity > 0.0 => quantity / 100.0,
        _ => 1.0,
    }
}
