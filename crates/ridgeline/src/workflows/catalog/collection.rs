use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::domain::{FleetItem, MapPoint, Tour};
use crate::store::{decode, KeyValueStore, KeyValueStoreExt, StoreError};

/// A document type kept as one store entry per item plus an ordered index
/// of identifiers.
pub trait CatalogEntry: Serialize + DeserializeOwned + Send + Sync {
    const ITEM_PREFIX: &'static str;
    const INDEX_KEY: &'static str;
    /// Human-readable name used in responses, e.g. "Tour".
    const LABEL: &'static str;

    fn key(&self) -> &str;
}

impl CatalogEntry for Tour {
    const ITEM_PREFIX: &'static str = "tour:";
    const INDEX_KEY: &'static str = "tours_list";
    const LABEL: &'static str = "Tour";

    fn key(&self) -> &str {
        &self.slug
    }
}

impl CatalogEntry for FleetItem {
    const ITEM_PREFIX: &'static str = "fleet:";
    const INDEX_KEY: &'static str = "fleet_list";
    const LABEL: &'static str = "Fleet item";

    fn key(&self) -> &str {
        &self.id
    }
}

impl CatalogEntry for MapPoint {
    const ITEM_PREFIX: &'static str = "map_point:";
    const INDEX_KEY: &'static str = "map_points_list";
    const LABEL: &'static str = "Map point";

    fn key(&self) -> &str {
        &self.id
    }
}

pub struct CatalogCollection<S, T> {
    store: Arc<S>,
    _entry: PhantomData<fn() -> T>,
}

impl<S, T> CatalogCollection<S, T>
where
    S: KeyValueStore + 'static,
    T: CatalogEntry,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _entry: PhantomData,
        }
    }

    fn item_key(id: &str) -> String {
        format!("{}{id}", T::ITEM_PREFIX)
    }

    /// Identifiers in insertion order; a missing or non-array index reads as empty.
    pub fn index(&self) -> Result<Vec<String>, StoreError> {
        match self.store.get(T::INDEX_KEY)? {
            Some(value @ Value::Array(_)) => decode(T::INDEX_KEY, value),
            _ => Ok(Vec::new()),
        }
    }

    /// Items in index order. Identifiers whose item is gone are skipped.
    pub fn list(&self) -> Result<Vec<T>, StoreError> {
        let keys: Vec<String> = self
            .index()?
            .iter()
            .map(|id| Self::item_key(id))
            .collect();
        let values = self.store.mget(&keys)?;
        keys.iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|value| decode(key, value)))
            .collect()
    }

    pub fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.store.get_as(&Self::item_key(id))
    }

    /// Writes the item and appends its identifier to the index when new.
    pub fn upsert(&self, item: &T) -> Result<(), StoreError> {
        self.store.set_as(&Self::item_key(item.key()), item)?;

        let mut index = self.index()?;
        if !index.iter().any(|id| id == item.key()) {
            index.push(item.key().to_string());
            self.store.set_as(T::INDEX_KEY, &index)?;
        }
        Ok(())
    }

    /// Removes the item and its index entry. Deleting an absent item succeeds.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(&Self::item_key(id))?;

        let mut index = self.index()?;
        index.retain(|existing| existing != id);
        self.store.set_as(T::INDEX_KEY, &index)
    }

    /// Writes every item and replaces the index with their identifiers.
    pub fn replace_all(&self, items: &[T]) -> Result<(), StoreError> {
        for item in items {
            self.store.set_as(&Self::item_key(item.key()), item)?;
        }
        let index: Vec<&str> = items.iter().map(T::key).collect();
        self.store.set_as(T::INDEX_KEY, &index)
    }
}

impl<S, T> Clone for CatalogCollection<S, T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entry: PhantomData,
        }
    }
}
