//! External text-generation oracle: item categorization and shelf-life
//! estimation.
//!
//! Oracle answers are untrusted. Callers go through [`resolve_category`]
//! and [`resolve_lifespan`], which bound every request with a timeout and
//! turn any failure into a fallback value.

pub mod gemini;

pub use gemini::GeminiOracle;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::OracleError;
use crate::model::Category;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Queried by item name; returns a category or a shelf life in days.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Classify an item into one of the fixed categories.
    async fn categorize(&self, item_name: &str) -> Result<Category, OracleError>;

    /// Typical shelf life of an item, in days.
    async fn estimate_lifespan_days(&self, item_name: &str) -> Result<u32, OracleError>;
}

#[async_trait]
impl<T: Oracle + ?Sized> Oracle for Box<T> {
    async fn categorize(&self, item_name: &str) -> Result<Category, OracleError> {
        (**self).categorize(item_name).await
    }

    async fn estimate_lifespan_days(&self, item_name: &str) -> Result<u32, OracleError> {
        (**self).estimate_lifespan_days(item_name).await
    }
}

/// An oracle that is never available. Every item falls back to defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineOracle;

#[async_trait]
impl Oracle for OfflineOracle {
    async fn categorize(&self, _item_name: &str) -> Result<Category, OracleError> {
        Err(OracleError::NotConfigured("offline mode".into()))
    }

    async fn estimate_lifespan_days(&self, _item_name: &str) -> Result<u32, OracleError> {
        Err(OracleError::NotConfigured("offline mode".into()))
    }
}

async fn bounded<T, F>(timeout: Duration, request: F) -> Result<T, OracleError>
where
    F: std::future::Future<Output = Result<T, OracleError>>,
{
    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => Err(OracleError::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// Category for `item_name`, or `Other` on any failure.
pub async fn resolve_category<O: Oracle + ?Sized>(
    oracle: &O,
    item_name: &str,
    timeout: Duration,
) -> Category {
    match bounded(timeout, oracle.categorize(item_name)).await {
        Ok(category) => category,
        Err(e) => {
            tracing::warn!(item = item_name, error = %e, "categorization failed, using Other");
            Category::Other
        }
    }
}

/// Shelf life for `item_name`, or `fallback_days` on any failure or a
/// non-positive answer.
pub async fn resolve_lifespan<O: Oracle + ?Sized>(
    oracle: &O,
    item_name: &str,
    timeout: Duration,
    fallback_days: u32,
) -> u32 {
    match bounded(timeout, oracle.estimate_lifespan_days(item_name)).await {
        Ok(days) if days > 0 => days,
        Ok(days) => {
            tracing::warn!(item = item_name, days, "non-positive lifespan, using {fallback_days} days");
            fallback_days
        }
        Err(e) => {
            tracing::warn!(item = item_name, error = %e, "lifespan estimate failed, using {fallback_days} days");
            fallback_days
        }
    }
}

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    const SERVICE: &str = "smartcart";

    pub fn get(key: &str) -> Result<Option<String>, keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)
    }

    pub fn delete(key: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        category: Result<Category, ()>,
        lifespan: Result<u32, ()>,
    }

    #[async_trait]
    impl Oracle for Fixed {
        async fn categorize(&self, _item_name: &str) -> Result<Category, OracleError> {
            self.category
                .map_err(|()| OracleError::InvalidResponse("Toys".into()))
        }

        async fn estimate_lifespan_days(&self, _item_name: &str) -> Result<u32, OracleError> {
            self.lifespan
                .map_err(|()| OracleError::InvalidResponse("a while".into()))
        }
    }

    struct Stalled;

    #[async_trait]
    impl Oracle for Stalled {
        async fn categorize(&self, _item_name: &str) -> Result<Category, OracleError> {
            std::future::pending().await
        }

        async fn estimate_lifespan_days(&self, _item_name: &str) -> Result<u32, OracleError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn successful_answers_pass_through() {
        let oracle = Fixed {
            category: Ok(Category::Produce),
            lifespan: Ok(5),
        };
        assert_eq!(resolve_category(&oracle, "Apples", DEFAULT_TIMEOUT).await, Category::Produce);
        assert_eq!(resolve_lifespan(&oracle, "Apples", DEFAULT_TIMEOUT, 7).await, 5);
    }

    #[tokio::test]
    async fn failures_fall_back() {
        let oracle = Fixed {
            category: Err(()),
            lifespan: Err(()),
        };
        assert_eq!(resolve_category(&oracle, "Kite", DEFAULT_TIMEOUT).await, Category::Other);
        assert_eq!(resolve_lifespan(&oracle, "Kite", DEFAULT_TIMEOUT, 7).await, 7);
    }

    #[tokio::test]
    async fn zero_days_falls_back() {
        let oracle = Fixed {
            category: Ok(Category::Other),
            lifespan: Ok(0),
        };
        assert_eq!(resolve_lifespan(&oracle, "Salt", DEFAULT_TIMEOUT, 7).await, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_fall_back() {
        let timeout = Duration::from_secs(2);
        assert_eq!(resolve_category(&Stalled, "Milk", timeout).await, Category::Other);
        assert_eq!(resolve_lifespan(&Stalled, "Milk", timeout, 7).await, 7);
    }

    #[tokio::test]
    async fn offline_oracle_always_falls_back() {
        assert_eq!(resolve_category(&OfflineOracle, "Milk", DEFAULT_TIMEOUT).await, Category::Other);
        assert_eq!(resolve_lifespan(&OfflineOracle, "Milk", DEFAULT_TIMEOUT, 9).await, 9);
    }
}
