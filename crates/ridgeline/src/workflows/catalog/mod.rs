//! Public expedition catalog: tours, the fleet advisory and pit-stop map
//! points, with admin-gated curation.

pub mod collection;
pub mod domain;
pub mod geo;
pub mod query;
pub mod router;
pub mod seed;
pub mod service;

pub use collection::{CatalogCollection, CatalogEntry};
pub use domain::{
    Difficulty, Elevation, FleetCategory, FleetItem, ItineraryDay, MapPoint, MapPointKind,
    NearbyPoint, Tour,
};
pub use geo::{haversine_km, Coordinates};
pub use query::{DurationBand, TourFilter, TourQuery, TourSort};
pub use router::catalog_router;
pub use seed::{SeedCatalog, SeedOutcome, SEED_MARKER};
pub use service::{CatalogError, CatalogService};
