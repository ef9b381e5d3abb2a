use std::sync::Arc;

use tracing::info;

use super::collection::{CatalogCollection, CatalogEntry};
use super::domain::{FleetCategory, FleetItem, MapPoint, MapPointKind, NearbyPoint, Tour};
use super::geo::{nearest, Coordinates};
use super::query::{TourFilter, TourQuery};
use super::seed::{SeedCatalog, SeedOutcome, SEED_MARKER};
use crate::identity::IdentityProvider;
use crate::store::{is_truthy, KeyValueStore, StoreError};
use crate::workflows::access::{AccessControl, AccessError};

/// Public reads and admin-gated curation of tours, fleet items and map points.
pub struct CatalogService<S, I> {
    store: Arc<S>,
    tours: CatalogCollection<S, Tour>,
    fleet: CatalogCollection<S, FleetItem>,
    map_points: CatalogCollection<S, MapPoint>,
    access: AccessControl<S, I>,
}

impl<S, I> CatalogService<S, I>
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(store: Arc<S>, access: AccessControl<S, I>) -> Self {
        Self {
            tours: CatalogCollection::new(store.clone()),
            fleet: CatalogCollection::new(store.clone()),
            map_points: CatalogCollection::new(store.clone()),
            store,
            access,
        }
    }

    /// Load the bundled launch catalog once; later calls are no-ops.
    pub fn seed(&self) -> Result<SeedOutcome, CatalogError> {
        if self
            .store
            .get(SEED_MARKER)?
            .as_ref()
            .is_some_and(is_truthy)
        {
            return Ok(SeedOutcome::AlreadySeeded);
        }

        let catalog = SeedCatalog::bundled().map_err(CatalogError::Seed)?;
        self.tours.replace_all(&catalog.tours)?;
        self.fleet.replace_all(&catalog.fleet)?;
        self.map_points.replace_all(&catalog.map_points)?;
        self.store.set(SEED_MARKER, serde_json::Value::Bool(true))?;

        let outcome = SeedOutcome::Seeded {
            tours: catalog.tours.len(),
            fleet: catalog.fleet.len(),
            map_points: catalog.map_points.len(),
        };
        info!(?outcome, "catalog seeded");
        Ok(outcome)
    }

    pub fn tours(&self, query: TourQuery) -> Result<Vec<Tour>, CatalogError> {
        let filter = TourFilter::try_from(query).map_err(CatalogError::Validation)?;
        Ok(filter.apply(self.tours.list()?))
    }

    pub fn tour(&self, slug: &str) -> Result<Tour, CatalogError> {
        self.tours
            .get(slug)?
            .ok_or(CatalogError::NotFound(Tour::LABEL))
    }

    pub fn save_tour(&self, token: Option<&str>, tour: Tour) -> Result<Tour, CatalogError> {
        self.access.require_admin(token)?;
        require_key(&tour)?;
        self.tours.upsert(&tour)?;
        info!(slug = %tour.slug, "tour saved");
        Ok(tour)
    }

    pub fn delete_tour(&self, token: Option<&str>, slug: &str) -> Result<(), CatalogError> {
        self.access.require_admin(token)?;
        self.tours.delete(slug)?;
        info!(%slug, "tour deleted");
        Ok(())
    }

    pub fn fleet(&self, category: Option<FleetCategory>) -> Result<Vec<FleetItem>, CatalogError> {
        let mut items = self.fleet.list()?;
        if let Some(category) = category {
            items.retain(|item| item.category == category);
        }
        Ok(items)
    }

    pub fn save_fleet_item(&self, token: Option<&str>, item: FleetItem) -> Result<(), CatalogError> {
        self.access.require_admin(token)?;
        require_key(&item)?;
        self.fleet.upsert(&item)?;
        info!(id = %item.id, "fleet item saved");
        Ok(())
    }

    pub fn delete_fleet_item(&self, token: Option<&str>, id: &str) -> Result<(), CatalogError> {
        self.access.require_admin(token)?;
        self.fleet.delete(id)?;
        info!(%id, "fleet item deleted");
        Ok(())
    }

    pub fn map_points(&self, kind: Option<MapPointKind>) -> Result<Vec<MapPoint>, CatalogError> {
        let mut points = self.map_points.list()?;
        if let Some(kind) = kind {
            points.retain(|point| point.kind == kind);
        }
        Ok(points)
    }

    pub fn nearest_points(
        &self,
        origin: Coordinates,
        limit: usize,
    ) -> Result<Vec<NearbyPoint>, CatalogError> {
        if !origin.is_valid() {
            return Err(CatalogError::Validation(
                "lat must be within [-90, 90] and lng within [-180, 180]".to_string(),
            ));
        }
        Ok(nearest(self.map_points.list()?, origin, limit))
    }

    pub fn save_map_point(&self, token: Option<&str>, point: MapPoint) -> Result<(), CatalogError> {
        self.access.require_admin(token)?;
        require_key(&point)?;
        let position = Coordinates {
            lat: point.lat,
            lng: point.lng,
        };
        if !position.is_valid() {
            return Err(CatalogError::Validation(format!(
                "map point '{}' has coordinates outside the globe",
                point.id
            )));
        }
        self.map_points.upsert(&point)?;
        info!(id = %point.id, "map point saved");
        Ok(())
    }

    pub fn delete_map_point(&self, token: Option<&str>, id: &str) -> Result<(), CatalogError> {
        self.access.require_admin(token)?;
        self.map_points.delete(id)?;
        info!(%id, "map point deleted");
        Ok(())
    }
}

fn require_key<T: CatalogEntry>(item: &T) -> Result<(), CatalogError> {
    let key = item.key();
    if key.trim().is_empty() {
        return Err(CatalogError::Validation(format!(
            "{} identifier is required",
            T::LABEL
        )));
    }
    if key.contains(['/', ':']) {
        return Err(CatalogError::Validation(format!(
            "{} identifier '{key}' may not contain '/' or ':'",
            T::LABEL
        )));
    }
    Ok(())
}

/// Error raised by the catalog service.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("bundled seed catalog is invalid: {0}")]
    Seed(#[source] serde_json::Error),
}
