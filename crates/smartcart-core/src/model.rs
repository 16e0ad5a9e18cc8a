//! Domain types for shopping lists and the pantry.
//!
//! The persisted document uses camelCase field names and RFC 3339
//! timestamps, with categories stored as their display labels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Lifespan used whenever no better estimate is available.
pub const DEFAULT_LIFESPAN_DAYS: u32 = 7;

/// Grocery category. The set is closed; `Other` is the universal fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Produce,
    DairyEggs,
    MeatSeafood,
    BakeryBread,
    Pantry,
    FrozenFoods,
    Snacks,
    Beverages,
    Household,
    PersonalCare,
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 11] = [
        Category::Produce,
        Category::MeatSeafood,
        Category::DairyEggs,
        Category::BakeryBread,
        Category::Pantry,
        Category::FrozenFoods,
        Category::Snacks,
        Category::Beverages,
        Category::Household,
        Category::PersonalCare,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Produce => "Produce",
            Category::DairyEggs => "Dairy & Eggs",
            Category::MeatSeafood => "Meat & Seafood",
            Category::BakeryBread => "Bakery & Bread",
            Category::Pantry => "Pantry",
            Category::FrozenFoods => "Frozen Foods",
            Category::Snacks => "Snacks",
            Category::Beverages => "Beverages",
            Category::Household => "Household",
            Category::PersonalCare => "Personal Care",
            Category::Other => "Other",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Category::Produce => "🍎",
            Category::DairyEggs => "🥚",
            Category::MeatSeafood => "🥩",
            Category::BakeryBread => "🥖",
            Category::Pantry => "🥫",
            Category::FrozenFoods => "🧊",
            Category::Snacks => "🍿",
            Category::Beverages => "🥤",
            Category::Household => "🧼",
            Category::PersonalCare => "🧴",
            Category::Other => "🛒",
        }
    }

    /// Parse an exact label. Surrounding whitespace is ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Other
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// Unknown labels load as `Other` rather than failing the whole document.
impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Category::from_label(&label).unwrap_or_default())
    }
}

fn default_quantity() -> u32 {
    1
}

/// An entry on a shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub is_checked: bool,
    /// One timestamp per move into the pantry. Append-only.
    #[serde(default)]
    pub purchase_history: Vec<DateTime<Utc>>,
}

impl ListItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            quantity: 1,
            is_checked: false,
            purchase_history: Vec::new(),
        }
    }
}

/// A named collection of list items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ListItem>,
    pub created_at: DateTime<Utc>,
}

impl ShoppingList {
    pub fn item(&self, item_id: &str) -> Option<&ListItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn checked_items(&self) -> impl Iterator<Item = &ListItem> {
        self.items.iter().filter(|i| i.is_checked)
    }

    pub fn checked_count(&self) -> usize {
        self.checked_items().count()
    }
}

/// Current household stock of an item. Shares its id with the originating
/// list item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PantryItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Category,
    pub purchase_date: DateTime<Utc>,
    pub estimated_lifespan_days: u32,
}

fn default_lifespan() -> u32 {
    DEFAULT_LIFESPAN_DAYS
}

/// User settings stored alongside the lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Fallback lifespan when the oracle cannot provide one.
    #[serde(default = "default_lifespan")]
    pub default_lifespan: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_lifespan: DEFAULT_LIFESPAN_DAYS,
        }
    }
}

impl Settings {
    /// Fallback lifespan, never zero.
    pub fn fallback_lifespan(&self) -> u32 {
        if self.default_lifespan > 0 {
            self.default_lifespan
        } else {
            DEFAULT_LIFESPAN_DAYS
        }
    }
}

/// Root aggregate persisted as one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppData {
    #[serde(default)]
    pub lists: Vec<ShoppingList>,
    #[serde(default)]
    pub pantry: Vec<PantryItem>,
    #[serde(default)]
    pub settings: Settings,
}

impl AppData {
    pub fn list(&self, list_id: &str) -> Option<&ShoppingList> {
        self.lists.iter().find(|l| l.id == list_id)
    }

    pub fn pantry_item(&self, item_id: &str) -> Option<&PantryItem> {
        self.pantry.iter().find(|p| p.id == item_id)
    }
}

/// Partial update for a list item. Category, id and history are not
/// updatable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub is_checked: Option<bool>,
}

impl ItemUpdate {
    pub fn checked(is_checked: bool) -> Self {
        Self {
            is_checked: Some(is_checked),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.quantity.is_none() && self.is_checked.is_none()
    }

    /// Merge the present fields into `item`.
    pub fn apply_to(&self, item: &mut ListItem) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(is_checked) = self.is_checked {
            item.is_checked = is_checked;
        }
    }
}
