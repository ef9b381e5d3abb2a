use std::sync::Arc;

use super::domain::{PermitApplication, PermitId};
use crate::store::{KeyValueStore, KeyValueStoreExt, StoreError};

pub const PERMIT_PREFIX: &str = "permit:";

fn permit_key(id: &PermitId) -> String {
    format!("{PERMIT_PREFIX}{id}")
}

/// Permit records kept in the shared key-value store.
pub struct PermitRepository<S> {
    store: Arc<S>,
}

impl<S> PermitRepository<S>
where
    S: KeyValueStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn insert(&self, record: PermitApplication) -> Result<PermitApplication, RepositoryError> {
        let key = permit_key(&record.id);
        if self.store.get(&key)?.is_some() {
            return Err(RepositoryError::Conflict);
        }
        self.store.set_as(&key, &record)?;
        Ok(record)
    }

    /// Overwrites the stored record; concurrent writers race and the last one wins.
    pub fn update(&self, record: &PermitApplication) -> Result<(), RepositoryError> {
        self.store.set_as(&permit_key(&record.id), record)?;
        Ok(())
    }

    pub fn fetch(&self, id: &PermitId) -> Result<Option<PermitApplication>, RepositoryError> {
        Ok(self.store.get_as(&permit_key(id))?)
    }

    pub fn all(&self) -> Result<Vec<PermitApplication>, RepositoryError> {
        Ok(self.store.scan_prefix_as(PERMIT_PREFIX)?)
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}
