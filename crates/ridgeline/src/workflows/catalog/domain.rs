use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Published riding difficulty of an expedition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Moderate,
    Hard,
    Extreme,
}

impl Difficulty {
    pub const fn label(self) -> &'static str {
        match self {
            Difficulty::Moderate => "MODERATE",
            Difficulty::Hard => "HARD",
            Difficulty::Extreme => "EXTREME",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MODERATE" => Ok(Difficulty::Moderate),
            "HARD" => Ok(Difficulty::Hard),
            "EXTREME" => Ok(Difficulty::Extreme),
            _ => Err(format!("unknown difficulty '{raw}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elevation {
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryDay {
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Highest point of the day, in metres.
    #[serde(default)]
    pub elevation: i32,
    /// Riding distance, in kilometres.
    #[serde(default)]
    pub distance: u32,
}

/// A guided expedition, keyed by its slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    pub difficulty: Difficulty,
    /// Length in days.
    pub duration: u32,
    pub terrain: String,
    pub price: u64,
    pub max_group_size: u32,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub next_departure: Option<NaiveDate>,
    #[serde(default)]
    pub image: String,
    pub elevation: Elevation,
    /// Support vehicles and equipment that travel with the group.
    #[serde(default)]
    pub shadow_fleet: Vec<String>,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
}

/// Curation forms submit an unset date as `""`.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FleetCategory {
    Bike,
    Gear,
    Advisory,
}

/// Motorcycle review, gear checklist or riding advisory. Which list
/// fields are populated depends on the category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetItem {
    pub id: String,
    pub category: FleetCategory,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terrain: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pros: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cons: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub essentials: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapPointKind {
    Mechanic,
    Fuel,
    Stay,
}

/// Pit-stop on the riders' map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MapPointKind,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// A map point annotated with its great-circle distance from the rider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyPoint {
    #[serde(flatten)]
    pub point: MapPoint,
    pub distance_km: f64,
}
