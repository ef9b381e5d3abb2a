use super::domain::{MapPoint, NearbyPoint};

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const DEFAULT_NEAREST_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// The `limit` points closest to `origin`, nearest first.
pub fn nearest(points: Vec<MapPoint>, origin: Coordinates, limit: usize) -> Vec<NearbyPoint> {
    let mut ranked: Vec<NearbyPoint> = points
        .into_iter()
        .map(|point| {
            let distance_km = haversine_km(
                origin,
                Coordinates {
                    lat: point.lat,
                    lng: point.lng,
                },
            );
            NearbyPoint { point, distance_km }
        })
        .collect();
    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked.truncate(limit);
    ranked
}
