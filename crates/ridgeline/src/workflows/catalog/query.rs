use std::cmp::Reverse;
use std::str::FromStr;

use serde::Deserialize;

use super::domain::{Difficulty, Tour};

/// Raw `/tours` query string. `ALL` or an empty value disables a filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TourQuery {
    pub difficulty: Option<String>,
    pub terrain: Option<String>,
    pub duration: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
}

/// Trip length buckets offered by the expeditions page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationBand {
    /// Up to 8 days.
    Short,
    /// 9 to 12 days.
    Medium,
    /// 13 days or more.
    Long,
}

impl DurationBand {
    pub fn contains(self, days: u32) -> bool {
        match self {
            DurationBand::Short => days <= 8,
            DurationBand::Medium => (9..=12).contains(&days),
            DurationBand::Long => days >= 13,
        }
    }
}

impl FromStr for DurationBand {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SHORT" => Ok(DurationBand::Short),
            "MEDIUM" => Ok(DurationBand::Medium),
            "LONG" => Ok(DurationBand::Long),
            _ => Err(format!("unknown duration '{raw}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourSort {
    PriceAsc,
    PriceDesc,
    DurationAsc,
    DurationDesc,
    /// Highest maximum elevation first.
    Altitude,
}

impl FromStr for TourSort {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "price-asc" => Ok(TourSort::PriceAsc),
            "price-desc" => Ok(TourSort::PriceDesc),
            "duration-asc" => Ok(TourSort::DurationAsc),
            "duration-desc" => Ok(TourSort::DurationDesc),
            "altitude" => Ok(TourSort::Altitude),
            _ => Err(format!("unknown sort '{raw}'")),
        }
    }
}

/// Parsed, validated form of [`TourQuery`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TourFilter {
    pub difficulty: Option<Difficulty>,
    pub terrain: Option<String>,
    pub duration: Option<DurationBand>,
    pub search: Option<String>,
    pub sort: Option<TourSort>,
}

fn active(value: Option<String>, disabled: &[&str]) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty() && !disabled.iter().any(|d| raw.eq_ignore_ascii_case(d)))
}

impl TryFrom<TourQuery> for TourFilter {
    type Error = String;

    fn try_from(query: TourQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            difficulty: active(query.difficulty, &["ALL"])
                .map(|raw| raw.parse::<Difficulty>())
                .transpose()?,
            terrain: active(query.terrain, &["ALL"]),
            duration: active(query.duration, &["ALL"])
                .map(|raw| raw.parse::<DurationBand>())
                .transpose()?,
            search: active(query.q, &[]).map(|q| q.to_lowercase()),
            sort: active(query.sort, &["default"])
                .map(|raw| raw.parse::<TourSort>())
                .transpose()?,
        })
    }
}

impl TourFilter {
    fn matches(&self, tour: &Tour) -> bool {
        if self.difficulty.is_some_and(|wanted| wanted != tour.difficulty) {
            return false;
        }
        if let Some(terrain) = &self.terrain {
            if !tour.terrain.eq_ignore_ascii_case(terrain) {
                return false;
            }
        }
        if self.duration.is_some_and(|band| !band.contains(tour.duration)) {
            return false;
        }
        if let Some(needle) = &self.search {
            let haystacks = [
                tour.title.as_str(),
                tour.subtitle.as_str(),
                tour.terrain.as_str(),
                tour.difficulty.label(),
            ];
            if !haystacks
                .iter()
                .any(|text| text.to_lowercase().contains(needle.as_str()))
            {
                return false;
            }
        }
        true
    }

    /// Filter, then stable-sort; unsorted results keep catalog order.
    pub fn apply(&self, tours: Vec<Tour>) -> Vec<Tour> {
        let mut selected: Vec<Tour> = tours.into_iter().filter(|t| self.matches(t)).collect();
        match self.sort {
            Some(TourSort::PriceAsc) => selected.sort_by_key(|t| t.price),
            Some(TourSort::PriceDesc) => selected.sort_by_key(|t| Reverse(t.price)),
            Some(TourSort::DurationAsc) => selected.sort_by_key(|t| t.duration),
            Some(TourSort::DurationDesc) => selected.sort_by_key(|t| Reverse(t.duration)),
            Some(TourSort::Altitude) => selected.sort_by_key(|t| Reverse(t.elevation.max)),
            None => {}
        }
        selected
    }
}
