//! Pantry freshness and category grouping.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AppData, Category, ListItem, PantryItem};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Freshness bucket for a pantry item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessStatus {
    Fresh,
    Warning,
    Critical,
    Expired,
}

impl FreshnessStatus {
    pub fn from_days_remaining(days: u32) -> Self {
        match days {
            0 => FreshnessStatus::Expired,
            1 => FreshnessStatus::Critical,
            2 | 3 => FreshnessStatus::Warning,
            _ => FreshnessStatus::Fresh,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FreshnessStatus::Fresh => "fresh",
            FreshnessStatus::Warning => "warning",
            FreshnessStatus::Critical => "critical",
            FreshnessStatus::Expired => "expired",
        }
    }
}

/// Estimated expiry instant, saturating at the latest representable date.
pub fn expires_at(item: &PantryItem) -> DateTime<Utc> {
    item.purchase_date
        .checked_add_signed(TimeDelta::days(i64::from(item.estimated_lifespan_days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Whole days until expiry, rounded up, never negative.
pub fn days_remaining(item: &PantryItem, now: DateTime<Utc>) -> u32 {
    let remaining_ms = (expires_at(item) - now).num_milliseconds();
    if remaining_ms <= 0 {
        return 0;
    }
    let days = (remaining_ms + MS_PER_DAY - 1) / MS_PER_DAY;
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Anything that belongs to a category.
pub trait Categorized {
    fn category(&self) -> Category;
}

impl Categorized for ListItem {
    fn category(&self) -> Category {
        self.category
    }
}

impl Categorized for PantryItem {
    fn category(&self) -> Category {
        self.category
    }
}

/// Group items by category in display order, skipping empty groups.
/// Item order within a group is preserved.
pub fn group_by_category<T: Categorized>(items: &[T]) -> Vec<(Category, Vec<&T>)> {
    Category::ALL
        .iter()
        .filter_map(|category| {
            let members: Vec<&T> = items.iter().filter(|i| i.category() == *category).collect();
            (!members.is_empty()).then_some((*category, members))
        })
        .collect()
}

/// One row of the pantry overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PantryEntry {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub purchase_date: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub days_remaining: u32,
    pub status: FreshnessStatus,
}

impl PantryEntry {
    pub fn new(item: &PantryItem, now: DateTime<Utc>) -> Self {
        let days = days_remaining(item, now);
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            category: item.category,
            purchase_date: item.purchase_date,
            expires_at: expires_at(item),
            days_remaining: days,
            status: FreshnessStatus::from_days_remaining(days),
        }
    }
}

/// Pantry rows grouped by category in display order.
pub fn pantry_report(data: &AppData, now: DateTime<Utc>) -> Vec<(Category, Vec<PantryEntry>)> {
    group_by_category(&data.pantry)
        .into_iter()
        .map(|(category, items)| {
            let rows = items.into_iter().map(|i| PantryEntry::new(i, now)).collect();
            (category, rows)
        })
        .collect()
}
