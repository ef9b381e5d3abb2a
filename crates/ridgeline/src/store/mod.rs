//! Namespaced JSON key-value store consumed by every workflow.
//!
//! Keys are plain strings namespaced by a `kind:` prefix (`permit:`,
//! `admin:`, `tour:`...). Values are JSON documents so each workflow owns
//! its own schema.

mod memory;

pub use memory::InMemoryKeyValueStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Storage abstraction so workflows can be exercised against any backend.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// One slot per requested key, in request order; `None` where the key is absent.
    fn mget(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StoreError>;

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Every entry whose key starts with `prefix`, ordered by key.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, StoreError>;

    /// Atomically writes `value` under `key` only when no key starts with
    /// `prefix`. Returns `true` when the write happened.
    fn set_if_prefix_empty(&self, prefix: &str, key: &str, value: Value)
        -> Result<bool, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("value under '{key}' does not match the expected shape: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("value could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Typed helpers layered over the raw JSON operations.
pub trait KeyValueStoreExt: KeyValueStore {
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.get(key)?
            .map(|value| decode(key, value))
            .transpose()
    }

    fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let encoded = serde_json::to_value(value).map_err(StoreError::Encode)?;
        self.set(key, encoded)
    }

    fn scan_prefix_as<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, StoreError> {
        self.scan_prefix(prefix)?
            .into_iter()
            .map(|(key, value)| decode(&key, value))
            .collect()
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

pub(crate) fn decode<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|source| StoreError::Malformed {
        key: key.to_string(),
        source,
    })
}

/// JavaScript-style truthiness, used for flag documents such as admin grants.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
