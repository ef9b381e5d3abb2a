use serde::Deserialize;

use super::domain::{FleetItem, MapPoint, Tour};

/// Marker written once the launch catalog has been loaded.
pub const SEED_MARKER: &str = "tours_seeded_v2";

const SEED_DOCUMENT: &str = include_str!("seed.json");

/// Launch catalog: five expeditions, the fleet advisory and the Ladakh /
/// Spiti pit-stop map.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedCatalog {
    pub tours: Vec<Tour>,
    pub fleet: Vec<FleetItem>,
    pub map_points: Vec<MapPoint>,
}

impl SeedCatalog {
    pub fn bundled() -> Result<Self, serde_json::Error> {
        serde_json::from_str(SEED_DOCUMENT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    AlreadySeeded,
    Seeded {
        tours: usize,
        fleet: usize,
        map_points: usize,
    },
}
