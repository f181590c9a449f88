// src/geo.rs
//
// Great-circle helpers shared by every pipeline stage.

use crate::types::LatLng;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two points, in meters.
pub fn distance_m(a: LatLng, b: LatLng) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Two-decimal rounding for confidence-like presentation fields.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// One-decimal rounding for meter and minute presentation fields.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
