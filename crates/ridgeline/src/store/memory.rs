use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use super::{KeyValueStore, StoreError};

/// Process-local store backed by an ordered map.
///
/// Every operation holds the single lock for its whole duration, which is
/// what makes [`KeyValueStore::set_if_prefix_empty`] atomic.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyValueStore {
    entries: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl InMemoryKeyValueStore {
    fn entries(&self) -> Result<MutexGuard<'_, BTreeMap<String, Value>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries().map(|guard| guard.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn mget(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StoreError> {
        let guard = self.entries()?;
        Ok(keys.iter().map(|key| guard.get(key).cloned()).collect())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries()?.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let guard = self.entries()?;
        Ok(guard
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn set_if_prefix_empty(
        &self,
        prefix: &str,
        key: &str,
        value: Value,
    ) -> Result<bool, StoreError> {
        let mut guard = self.entries()?;
        let occupied = guard
            .range(prefix.to_string()..)
            .next()
            .is_some_and(|(existing, _)| existing.starts_with(prefix));
        if occupied {
            return Ok(false);
        }
        guard.insert(key.to_string(), value);
        Ok(true)
    }
}
