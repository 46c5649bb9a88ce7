//! Geographic distance primitives.
//!
//! Two great-circle variants are provided:
//! - [`haversine_distance_km`] - the exact haversine formula, used by the
//!   density estimator's kernel.
//! - [`chord_distance_km`] - a simplified approximation used by the travel
//!   aggregator for consecutive GPS pings.
//!
//! Neither variant applies an antimeridian wraparound correction; a pair of
//! points straddling the ±180° meridian is measured the long way around.

use crate::GeoPoint;

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Exact haversine great-circle distance between two points, in kilometers.
///
/// Inputs are in degrees. `d(A, A)` is exactly 0 and the function is
/// symmetric in its arguments.
///
/// # Example
/// ```
/// use geo_insights::{GeoPoint, geo_utils::haversine_distance_km};
///
/// let london = GeoPoint::new(51.5074, -0.1278);
/// let paris = GeoPoint::new(48.8566, 2.3522);
/// let d = haversine_distance_km(&london, &paris);
/// assert!(d > 330.0 && d < 360.0);
/// ```
pub fn haversine_distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Haversine great-circle angle between two points, in degrees of arc.
///
/// Same formula as [`haversine_distance_km`] but left as a central angle
/// instead of scaling by the Earth radius. The density kernel uses this
/// variant so its distances share units with the Silverman bandwidth,
/// which is computed on degree coordinates.
pub fn haversine_angle_deg(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
}

/// Simplified chord distance between two points, in kilometers.
///
/// This is the haversine identity applied to the half-angle differences
/// without the `cos(lat1) * cos(lat2)` longitude scaling:
///
/// ```text
/// 2R * asin(sqrt(sin²(Δlat/2) + sin²(Δlon/2)))
/// ```
///
/// It is symmetric and zero at identical points, but overstates east-west
/// distance away from the equator and is not a true metric (the triangle
/// inequality is not guaranteed). The travel aggregator uses it as-is; do
/// not substitute the exact formula without re-validating the segment
/// filter thresholds against it.
pub fn chord_distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}
