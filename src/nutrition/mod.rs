pub mod summary;
pub mod units;

pub use summary::{
    aggregate_day, aggregate_range, item_contribution, week_range, DaySummary,
    RangeSummary,
};
pub use units::{classify, scale_factor, UnitKind};
