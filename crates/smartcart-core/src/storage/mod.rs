mod config;
pub mod database;
pub mod memory;

pub use config::{Config, OracleConfig, PredictionConfig, StorageConfig};
pub use database::Database;
pub use memory::MemoryStorage;

use std::path::PathBuf;

use crate::error::StorageError;
use crate::model::AppData;

/// Key the document is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "smartcart-data";

/// Key-value persistence for the whole [`AppData`] document.
pub trait Persistence {
    /// Load the document stored under `key`, or `None` if nothing is stored.
    fn load(&self, key: &str) -> Result<Option<AppData>, StorageError>;

    /// Replace the document stored under `key`.
    fn save(&self, key: &str, data: &AppData) -> Result<(), StorageError>;
}

impl<P: Persistence + ?Sized> Persistence for &P {
    fn load(&self, key: &str) -> Result<Option<AppData>, StorageError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, data: &AppData) -> Result<(), StorageError> {
        (**self).save(key, data)
    }
}

/// Returns the data directory, creating it if needed.
///
/// `SMARTCART_DATA_DIR` overrides the location. Otherwise this is
/// `~/.config/smartcart[-dev]/`, with `SMARTCART_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("SMARTCART_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("SMARTCART_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("smartcart-dev")
            } else {
                base_dir.join("smartcart")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(StorageError::DataDir)?;
    Ok(dir)
}
