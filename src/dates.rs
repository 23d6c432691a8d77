//! Calendar dates on the wire (`YYYY-MM-DD`).

use lazy_static::lazy_static;
use regex::Regex;
use time::{macros::format_description, Date};

use crate::error::AppError;

pub(crate) fn is_date_shaped(value: &str) -> bool {
    lazy_static! {
        static ref DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    }
    DATE_RE.is_match(value)
}

/// Parses a date-only string, rejecting anything that is not a real calendar day.
pub fn parse_date(value: &str) -> Result<Date, AppError> {
    if !is_date_shaped(value) {
        return Err(AppError::validation(
            "invalid_date",
            format!("expected YYYY-MM-DD, got {value:?}"),
        ));
    }
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|e| AppError::validation("invalid_date", format!("{value}: {e}")))
}

pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Serde adapter for `time::Date` as `YYYY-MM-DD`.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(serde::de::Error::custom)
    }
}
