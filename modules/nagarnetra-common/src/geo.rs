//! Great-circle distance and the duplicate-radius predicate.

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Two same-type reports closer than this are treated as the same
/// real-world issue.
pub const DUPLICATE_RADIUS_METERS: f64 = 100.0;

/// Haversine distance between two lat/lng points in meters.
pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Distance in meters, or `+infinity` when any coordinate is absent.
/// Missing data is never an error and never reads as zero distance.
pub fn distance_meters(
    lat1: Option<f64>,
    lng1: Option<f64>,
    lat2: Option<f64>,
    lng2: Option<f64>,
) -> f64 {
    match (lat1, lng1, lat2, lng2) {
        (Some(a), Some(b), Some(c), Some(d)) => haversine_meters(a, b, c, d),
        _ => f64::INFINITY,
    }
}

pub fn within_duplicate_radius(distance_meters: f64) -> bool {
    distance_meters <= DUPLICATE_RADIUS_METERS
}
