//! # SmartCart Core Library
//!
//! Core logic for a personal shopping-list and pantry tracker. Checking an
//! item off a list moves it into the pantry with an estimated shelf life,
//! and purchase timestamps feed a reorder prediction.
//!
//! ## Architecture
//!
//! - **State Store**: owns the persisted document and is its only write path
//! - **Prediction Engine**: pure functions over the document that flag items
//!   due for repurchase
//! - **Oracle**: categorization and shelf-life estimation via an external
//!   text-generation service, always with a fallback
//! - **Storage**: SQLite key-value document storage and TOML configuration
//!
//! ## Key Components
//!
//! - [`ShoppingStore`]: mutations over lists and the pantry
//! - [`predicted_items`]: names due for repurchase
//! - [`Oracle`]: trait for the categorization/lifespan service
//! - [`Database`]: document persistence
//! - [`Config`]: application configuration

pub mod error;
pub mod model;
pub mod oracle;
pub mod pantry;
pub mod prediction;
pub mod storage;
pub mod store;

pub use error::{ConfigError, CoreError, OracleError, StorageError, ValidationError};
pub use model::{
    AppData, Category, ItemUpdate, ListItem, PantryItem, Settings, ShoppingList,
    DEFAULT_LIFESPAN_DAYS,
};
pub use oracle::{GeminiOracle, OfflineOracle, Oracle};
pub use pantry::{FreshnessStatus, PantryEntry};
pub use prediction::{predict, predicted_items, Prediction, MAX_PREDICTIONS};
pub use storage::{Config, Database, MemoryStorage, Persistence, DEFAULT_STORAGE_KEY};
pub use store::ShoppingStore;
