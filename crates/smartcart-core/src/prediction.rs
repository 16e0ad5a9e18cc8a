//! Predicted-reorder engine.
//!
//! Estimates how often each item is bought from the purchase history of
//! every list item sharing its name, and flags names whose next purchase
//! is overdue and that are not currently stocked in the pantry.
//!
//! Names are the join key between lists and the pantry, not ids: a pantry
//! entry outlives deletion of the list item it came from. Names are matched
//! after trimming and lowercasing; the first spelling encountered is the one
//! reported.

use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::AppData;

/// Maximum number of names returned by [`predict`] and [`predicted_items`].
pub const MAX_PREDICTIONS: usize = 5;

/// A name that is due for repurchase, with the figures behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub name: String,
    pub purchase_count: usize,
    /// Mean gap between consecutive purchases, in milliseconds.
    pub average_interval_ms: i64,
    pub last_purchase: DateTime<Utc>,
    pub next_purchase: DateTime<Utc>,
}

impl Prediction {
    pub fn average_interval(&self) -> TimeDelta {
        TimeDelta::milliseconds(self.average_interval_ms)
    }

    /// How far past the predicted purchase time `now` is.
    pub fn overdue_by(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.next_purchase
    }
}

/// Purchase cadence derived from one name's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub purchase_count: usize,
    pub average_interval: TimeDelta,
    pub last_purchase: DateTime<Utc>,
}

impl Cadence {
    /// Derive a cadence from unordered timestamps. Needs at least two
    /// purchases to have an interval.
    pub fn from_history(history: &[DateTime<Utc>]) -> Option<Self> {
        if history.len() < 2 {
            return None;
        }
        let mut sorted = history.to_vec();
        sorted.sort_unstable();

        // The consecutive differences of a sorted sequence sum to its span.
        let first = *sorted.first()?;
        let last_purchase = *sorted.last()?;
        let intervals = i32::try_from(sorted.len() - 1).ok()?;

        Some(Self {
            purchase_count: sorted.len(),
            average_interval: (last_purchase - first) / intervals,
            last_purchase,
        })
    }

    /// `None` when the date falls outside the representable range.
    pub fn next_purchase(&self) -> Option<DateTime<Utc>> {
        self.last_purchase.checked_add_signed(self.average_interval)
    }

    /// Strictly past the predicted purchase time.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_purchase().is_some_and(|next| now > next)
    }
}

/// Join key for names across lists and the pantry.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

struct NameHistory {
    display: String,
    history: Vec<DateTime<Utc>>,
}

/// Union of purchase history per normalized name, in first-encountered
/// order (list order, then item order).
fn aggregate_history(data: &AppData) -> IndexMap<String, NameHistory> {
    let mut by_name: IndexMap<String, NameHistory> = IndexMap::new();
    for list in &data.lists {
        for item in &list.items {
            let entry = by_name
                .entry(normalize_name(&item.name))
                .or_insert_with(|| NameHistory {
                    display: item.name.trim().to_string(),
                    history: Vec::new(),
                });
            entry.history.extend(item.purchase_history.iter().copied());
        }
    }
    by_name
}

/// Every due name, unranked, at most `limit` entries and never more than
/// [`MAX_PREDICTIONS`].
pub fn predict(data: &AppData, now: DateTime<Utc>, limit: usize) -> Vec<Prediction> {
    let stocked: HashSet<String> = data
        .pantry
        .iter()
        .map(|p| normalize_name(&p.name))
        .collect();

    aggregate_history(data)
        .into_iter()
        .filter(|(key, _)| !stocked.contains(key))
        .filter_map(|(_, entry)| {
            let cadence = Cadence::from_history(&entry.history)?;
            let next_purchase = cadence.next_purchase()?;
            cadence.is_due(now).then(|| Prediction {
                name: entry.display,
                purchase_count: cadence.purchase_count,
                average_interval_ms: cadence.average_interval.num_milliseconds(),
                last_purchase: cadence.last_purchase,
                next_purchase,
            })
        })
        .take(limit.min(MAX_PREDICTIONS))
        .collect()
}

/// Names due for repurchase, deduplicated and capped at [`MAX_PREDICTIONS`].
pub fn predicted_items(data: &AppData, now: DateTime<Utc>) -> Vec<String> {
    predict(data, now, MAX_PREDICTIONS)
        .into_iter()
        .map(|p| p.name)
        .collect()
}
