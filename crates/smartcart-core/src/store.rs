//! The state store: owns [`AppData`] and is its only write path.
//!
//! Every mutation clones the current document, applies a pure transform,
//! persists the result and only then swaps it in. A failed save leaves the
//! in-memory state untouched and is returned to the caller. Mutations that
//! find nothing to change do not write.
//!
//! Mutating methods take `&mut self`, so a mutation (including its oracle
//! round trips) runs to completion before the next one can start.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{Result, ValidationError};
use crate::model::{AppData, Category, ItemUpdate, ListItem, PantryItem, ShoppingList};
use crate::oracle::{resolve_category, resolve_lifespan, Oracle, DEFAULT_TIMEOUT};
use crate::pantry::{pantry_report, PantryEntry};
use crate::prediction::{predict, predicted_items, Prediction};
use crate::storage::{Persistence, DEFAULT_STORAGE_KEY};

pub struct ShoppingStore<P, O> {
    data: AppData,
    persistence: P,
    oracle: O,
    key: String,
    oracle_timeout: Duration,
    clock: fn() -> DateTime<Utc>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn non_empty(name: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName { field });
    }
    Ok(trimmed.to_string())
}

impl<P: Persistence, O: Oracle> ShoppingStore<P, O> {
    /// Load the document under the default key, or start empty.
    pub fn open(persistence: P, oracle: O) -> Result<Self> {
        Self::open_with_key(persistence, oracle, DEFAULT_STORAGE_KEY)
    }

    /// Load the document under `key`, or start empty.
    pub fn open_with_key(persistence: P, oracle: O, key: &str) -> Result<Self> {
        let data = persistence.load(key)?.unwrap_or_default();
        tracing::debug!(
            key,
            lists = data.lists.len(),
            pantry = data.pantry.len(),
            "loaded shopping data"
        );
        Ok(Self {
            data,
            persistence,
            oracle,
            key: key.to_string(),
            oracle_timeout: DEFAULT_TIMEOUT,
            clock: Utc::now,
        })
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Bound each oracle request to `timeout`.
    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    pub fn data(&self) -> &AppData {
        &self.data
    }

    pub fn list(&self, list_id: &str) -> Option<&ShoppingList> {
        self.data.list(list_id)
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn commit(&mut self, next: AppData) -> Result<()> {
        if let Err(e) = self.persistence.save(&self.key, &next) {
            tracing::error!(key = %self.key, error = %e, "failed to persist shopping data");
            return Err(e.into());
        }
        self.data = next;
        Ok(())
    }

    /// Apply `transform` to a copy of the data. `None` means nothing
    /// changed and nothing is written.
    fn mutate<T>(&mut self, transform: impl FnOnce(&mut AppData) -> Option<T>) -> Result<Option<T>> {
        let mut next = self.data.clone();
        match transform(&mut next) {
            Some(value) => {
                self.commit(next)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Create an empty list and return its id.
    pub fn add_list(&mut self, name: &str) -> Result<String> {
        let name = non_empty(name, "list name")?;
        let list = ShoppingList {
            id: new_id(),
            name,
            items: Vec::new(),
            created_at: self.now(),
        };
        let id = list.id.clone();
        self.mutate(|data| {
            data.lists.push(list);
            Some(())
        })?;
        tracing::debug!(list_id = %id, "list added");
        Ok(id)
    }

    /// Remove a list. Returns whether it existed.
    pub fn delete_list(&mut self, list_id: &str) -> Result<bool> {
        let removed = self.mutate(|data| {
            let before = data.lists.len();
            data.lists.retain(|l| l.id != list_id);
            (data.lists.len() != before).then_some(())
        })?;
        Ok(removed.is_some())
    }

    /// Append an unchecked item with no history. Returns the new item id,
    /// or `None` if the list does not exist.
    pub fn add_item_to_list(
        &mut self,
        list_id: &str,
        name: &str,
        category: Category,
    ) -> Result<Option<String>> {
        let name = non_empty(name, "item name")?;
        let item = ListItem::new(new_id(), name, category);
        let id = item.id.clone();
        let added = self.mutate(|data| {
            let list = data.lists.iter_mut().find(|l| l.id == list_id)?;
            list.items.push(item);
            Some(())
        })?;
        if added.is_some() {
            tracing::debug!(list_id, item_id = %id, %category, "item added");
        }
        Ok(added.map(|()| id))
    }

    /// Categorize `name` through the oracle, then add it to the list. The
    /// oracle is not queried when the list does not exist.
    pub async fn add_item(&mut self, list_id: &str, name: &str) -> Result<Option<String>> {
        let name = non_empty(name, "item name")?;
        if self.data.list(list_id).is_none() {
            return Ok(None);
        }
        let category = resolve_category(&self.oracle, &name, self.oracle_timeout).await;
        self.add_item_to_list(list_id, &name, category)
    }

    /// Merge `update` into an item. Returns whether the item was found.
    pub fn update_item_in_list(
        &mut self,
        list_id: &str,
        item_id: &str,
        update: &ItemUpdate,
    ) -> Result<bool> {
        if update.is_empty() {
            return Ok(self.data.list(list_id).and_then(|l| l.item(item_id)).is_some());
        }
        let mut update = update.clone();
        if let Some(name) = &update.name {
            update.name = Some(non_empty(name, "item name")?);
        }
        let updated = self.mutate(|data| {
            let list = data.lists.iter_mut().find(|l| l.id == list_id)?;
            let item = list.items.iter_mut().find(|i| i.id == item_id)?;
            update.apply_to(item);
            Some(())
        })?;
        Ok(updated.is_some())
    }

    pub fn set_checked(&mut self, list_id: &str, item_id: &str, is_checked: bool) -> Result<bool> {
        self.update_item_in_list(list_id, item_id, &ItemUpdate::checked(is_checked))
    }

    /// Remove an item from a list. Returns whether it existed.
    pub fn delete_item_from_list(&mut self, list_id: &str, item_id: &str) -> Result<bool> {
        let removed = self.mutate(|data| {
            let list = data.lists.iter_mut().find(|l| l.id == list_id)?;
            let before = list.items.len();
            list.items.retain(|i| i.id != item_id);
            (list.items.len() != before).then_some(())
        })?;
        Ok(removed.is_some())
    }

    /// Record a purchase of `item`: stamp its history wherever it appears
    /// and upsert its pantry entry with an estimated lifespan.
    pub async fn move_item_to_pantry(&mut self, item: &ListItem) -> Result<()> {
        let fallback = self.data.settings.fallback_lifespan();
        let lifespan =
            resolve_lifespan(&self.oracle, &item.name, self.oracle_timeout, fallback).await;
        let now = self.now();
        let entry = pantry_entry(item, now, lifespan);

        self.mutate(|data| {
            let ids = HashSet::from([item.id.as_str()]);
            for list in &mut data.lists {
                stamp_purchases(list, &ids, now);
            }
            upsert_pantry(data, vec![entry]);
            Some(())
        })?;
        tracing::debug!(item_id = %item.id, lifespan, "item moved to pantry");
        Ok(())
    }

    /// Move every checked item of a list to the pantry in one update.
    /// Lifespans are estimated concurrently; each failure falls back on its
    /// own. Returns the number of items moved.
    pub async fn move_checked_to_pantry(&mut self, list_id: &str) -> Result<usize> {
        let Some(list) = self.data.list(list_id) else {
            return Ok(0);
        };
        let to_move: Vec<ListItem> = list.checked_items().cloned().collect();
        if to_move.is_empty() {
            return Ok(0);
        }

        let fallback = self.data.settings.fallback_lifespan();
        let timeout = self.oracle_timeout;
        let oracle = &self.oracle;
        let lifespans = join_all(
            to_move
                .iter()
                .map(|item| resolve_lifespan(oracle, &item.name, timeout, fallback)),
        )
        .await;

        let now = self.now();
        let entries: Vec<PantryItem> = to_move
            .iter()
            .zip(lifespans)
            .map(|(item, lifespan)| pantry_entry(item, now, lifespan))
            .collect();
        let moved = entries.len();

        self.mutate(|data| {
            let ids: HashSet<&str> = to_move.iter().map(|i| i.id.as_str()).collect();
            let list = data.lists.iter_mut().find(|l| l.id == list_id)?;
            stamp_purchases(list, &ids, now);
            upsert_pantry(data, entries);
            Some(())
        })?;
        tracing::debug!(list_id, moved, "checked items moved to pantry");
        Ok(moved)
    }

    /// Remove a pantry entry. Returns whether it existed.
    pub fn delete_item_from_pantry(&mut self, item_id: &str) -> Result<bool> {
        let removed = self.mutate(|data| {
            let before = data.pantry.len();
            data.pantry.retain(|p| p.id != item_id);
            (data.pantry.len() != before).then_some(())
        })?;
        Ok(removed.is_some())
    }

    /// Change the lifespan used when the oracle cannot answer.
    pub fn set_default_lifespan(&mut self, days: u32) -> Result<()> {
        if days == 0 {
            return Err(ValidationError::InvalidValue {
                field: "defaultLifespan".into(),
                message: "must be at least one day".into(),
            }
            .into());
        }
        self.mutate(|data| {
            (data.settings.default_lifespan != days).then(|| {
                data.settings.default_lifespan = days;
            })
        })?;
        Ok(())
    }

    /// Names due for repurchase as of the store clock.
    pub fn predicted_items(&self) -> Vec<String> {
        predicted_items(&self.data, self.now())
    }

    /// Due predictions with their figures, at most `limit`.
    pub fn predictions(&self, limit: usize) -> Vec<Prediction> {
        predict(&self.data, self.now(), limit)
    }

    pub fn pantry_report(&self) -> Vec<(Category, Vec<PantryEntry>)> {
        pantry_report(&self.data, self.now())
    }
}

fn pantry_entry(item: &ListItem, now: DateTime<Utc>, lifespan: u32) -> PantryItem {
    PantryItem {
        id: item.id.clone(),
        name: item.name.clone(),
        category: item.category,
        purchase_date: now,
        estimated_lifespan_days: lifespan,
    }
}

fn stamp_purchases(list: &mut ShoppingList, ids: &HashSet<&str>, now: DateTime<Utc>) {
    for item in list.items.iter_mut().filter(|i| ids.contains(i.id.as_str())) {
        item.purchase_history.push(now);
    }
}

/// Last write wins per id; replaced entries move to the end.
fn upsert_pantry(data: &mut AppData, entries: Vec<PantryItem>) {
    let ids: HashSet<String> = entries.iter().map(|p| p.id.clone()).collect();
    data.pantry.retain(|p| !ids.contains(&p.id));
    data.pantry.extend(entries);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, OracleError, StorageError};
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct Stub;

    #[async_trait]
    impl Oracle for Stub {
        async fn categorize(&self, item_name: &str) -> std::result::Result<Category, OracleError> {
            match item_name {
                "Milk" => Ok(Category::DairyEggs),
                _ => Err(OracleError::InvalidResponse("?".into())),
            }
        }

        async fn estimate_lifespan_days(&self, _item_name: &str) -> std::result::Result<u32, OracleError> {
            Ok(5)
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap()
    }

    fn store() -> ShoppingStore<MemoryStorage, Stub> {
        ShoppingStore::open(MemoryStorage::new(), Stub)
            .unwrap()
            .with_clock(fixed_now)
    }

    #[test]
    fn add_list_trims_and_persists() {
        let mut store = store();
        let id = store.add_list("  Weekly  ").unwrap();
        let list = store.list(&id).unwrap();
        assert_eq!(list.name, "Weekly");
        assert_eq!(list.created_at, fixed_now());
        assert_eq!(store.persistence().save_count(), 1);
    }

    #[test]
    fn add_list_rejects_blank_name() {
        let mut store = store();
        let err = store.add_list("   ").unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::EmptyName { .. })));
        assert!(store.data().lists.is_empty());
        assert_eq!(store.persistence().save_count(), 0);
    }

    #[test]
    fn missing_targets_do_not_write() {
        let mut store = store();
        let list_id = store.add_list("Weekly").unwrap();
        let before = store.data().clone();

        assert!(!store.delete_list("nope").unwrap());
        assert!(!store.delete_item_from_list(&list_id, "nope").unwrap());
        assert!(!store.delete_item_from_pantry("nope").unwrap());
        assert!(!store.set_checked(&list_id, "nope", true).unwrap());
        assert_eq!(store.add_item_to_list("nope", "Milk", Category::Other).unwrap(), None);

        assert_eq!(store.data(), &before);
        assert_eq!(store.persistence().save_count(), 1);
    }

    #[tokio::test]
    async fn add_item_uses_oracle_category_or_other() {
        let mut store = store();
        let list_id = store.add_list("Weekly").unwrap();
        let milk = store.add_item(&list_id, "Milk").await.unwrap().unwrap();
        let kite = store.add_item(&list_id, "Kite").await.unwrap().unwrap();
        let list = store.list(&list_id).unwrap();
        assert_eq!(list.item(&milk).unwrap().category, Category::DairyEggs);
        assert_eq!(list.item(&kite).unwrap().category, Category::Other);
        assert!(!list.item(&milk).unwrap().is_checked);
        assert!(list.item(&milk).unwrap().purchase_history.is_empty());
    }

    #[tokio::test]
    async fn move_stamps_history_and_upserts_pantry() {
        let mut store = store();
        let list_id = store.add_list("Weekly").unwrap();
        let id = store
            .add_item_to_list(&list_id, "Milk", Category::DairyEggs)
            .unwrap()
            .unwrap();
        let item = store.list(&list_id).unwrap().item(&id).unwrap().clone();

        store.move_item_to_pantry(&item).await.unwrap();
        store.move_item_to_pantry(&item).await.unwrap();

        let history = &store.list(&list_id).unwrap().item(&id).unwrap().purchase_history;
        assert_eq!(history, &vec![fixed_now(), fixed_now()]);
        assert_eq!(store.data().pantry.len(), 1);
        let entry = store.data().pantry_item(&id).unwrap();
        assert_eq!(entry.estimated_lifespan_days, 5);
        assert_eq!(entry.purchase_date, fixed_now());
    }

    #[tokio::test]
    async fn failed_save_keeps_previous_state() {
        let seeded = {
            let mut data = AppData::default();
            data.lists.push(ShoppingList {
                id: "l".into(),
                name: "Weekly".into(),
                items: vec![ListItem::new("i", "Milk", Category::DairyEggs)],
                created_at: fixed_now(),
            });
            data
        };
        let storage = MemoryStorage::read_only()
            .with_document(DEFAULT_STORAGE_KEY, &seeded)
            .unwrap();
        let mut store = ShoppingStore::open(storage, Stub).unwrap();

        let err = store.add_list("Party").unwrap_err();
        assert!(matches!(err, CoreError::Storage(StorageError::WriteRejected(_))));
        let item = seeded.lists[0].items[0].clone();
        assert!(store.move_item_to_pantry(&item).await.is_err());
        assert_eq!(store.data(), &seeded);
    }

    #[tokio::test]
    async fn single_move_stamps_every_list_holding_the_item() {
        let shared = ListItem::new("i", "Milk", Category::DairyEggs);
        let seeded = {
            let mut data = AppData::default();
            for (id, name) in [("a", "Weekly"), ("b", "Party")] {
                data.lists.push(ShoppingList {
                    id: id.into(),
                    name: name.into(),
                    items: vec![shared.clone(), ListItem::new(format!("{id}-other"), "Salt", Category::Pantry)],
                    created_at: fixed_now(),
                });
            }
            data
        };
        let storage = MemoryStorage::new()
            .with_document(DEFAULT_STORAGE_KEY, &seeded)
            .unwrap();
        let mut store = ShoppingStore::open(storage, Stub)
            .unwrap()
            .with_clock(fixed_now);

        store.move_item_to_pantry(&shared).await.unwrap();

        for list_id in ["a", "b"] {
            let list = store.list(list_id).unwrap();
            assert_eq!(list.item("i").unwrap().purchase_history, vec![fixed_now()]);
            assert!(list.item(&format!("{list_id}-other")).unwrap().purchase_history.is_empty());
        }
        assert_eq!(store.data().pantry.len(), 1);
        assert_eq!(store.persistence().save_count(), 1);
    }

    #[test]
    fn empty_update_finds_item_without_writing() {
        let mut store = store();
        let list_id = store.add_list("Weekly").unwrap();
        let id = store
            .add_item_to_list(&list_id, "Milk", Category::DairyEggs)
            .unwrap()
            .unwrap();

        assert!(store.update_item_in_list(&list_id, &id, &ItemUpdate::default()).unwrap());
        assert!(!store.update_item_in_list(&list_id, "nope", &ItemUpdate::default()).unwrap());
        assert_eq!(store.persistence().save_count(), 2);
    }

    #[test]
    fn set_default_lifespan_validates_and_skips_unchanged() {
        let mut store = store();
        assert!(store.set_default_lifespan(0).is_err());
        store.set_default_lifespan(7).unwrap();
        assert_eq!(store.persistence().save_count(), 0);
        store.set_default_lifespan(10).unwrap();
        assert_eq!(store.data().settings.default_lifespan, 10);
        assert_eq!(store.persistence().save_count(), 1);
    }
}
