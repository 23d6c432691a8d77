//! Client-held query cache.
//!
//! Entries are keyed by the query that produced them. Invalidation marks an
//! entry stale but keeps its value readable until the next fetch replaces it.

use std::collections::HashMap;

use time::Date;

use crate::meals::LoggedItem;
use crate::nutrition::{aggregate_day, DaySummary, RangeSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Day(Date),
    Range { from: Date, to: Date },
}

impl QueryKey {
    /// Whether a change to items on `date` affects this query.
    pub fn covers(&self, date: Date) -> bool {
        match *self {
            QueryKey::Day(day) => day == date,
            QueryKey::Range { from, to } => from <= date && date <= to,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Items(Vec<LoggedItem>),
    Summary(RangeSummary),
}

#[derive(Debug, Clone)]
struct Entry {
    value: CachedValue,
    stale: bool,
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, Entry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QueryKey) -> Option<&CachedValue> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// Stores a fresh value.
    pub fn set(&mut self, key: QueryKey, value: CachedValue) {
        self.entries.insert(key, Entry { value, stale: false });
    }

    /// Returns `false` when the key was not cached.
    pub fn invalidate(&mut self, key: &QueryKey) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }

    /// Marks the day view for `date` and every range covering it stale.
    pub fn invalidate_date(&mut self, date: Date) -> usize {
        let mut count = 0;
        for (key, entry) in self.entries.iter_mut() {
            if key.covers(date) {
                entry.stale = true;
                count += 1;
            }
        }
        count
    }

    /// Missing entries count as stale.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries.get(key).map_or(true, |e| e.stale)
    }

    pub fn day_items(&self, date: Date) -> Option<&[LoggedItem]> {
        match self.get(&QueryKey::Day(date)) {
            Some(CachedValue::Items(items)) => Some(items),
            _ => None,
        }
    }

    pub fn set_day_items(&mut self, date: Date, items: Vec<LoggedItem>) {
        self.set(QueryKey::Day(date), CachedValue::Items(items));
    }

    pub fn range_summary(&self, from: Date, to: Date) -> Option<&RangeSummary> {
        match self.get(&QueryKey::Range { from, to }) {
            Some(CachedValue::Summary(summary)) => Some(summary),
            _ => None,
        }
    }

    /// Totals derived from whatever is currently visible for `date`.
    pub fn day_summary(&self, date: Date) -> Option<DaySummary> {
        self.day_items(date).map(|items| aggregate_day(date, items))
    }
}
