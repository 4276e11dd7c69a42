//! # Geo Utility
//!
//! Haversine distance between two points and the `Location` type clients
//! report. A `Location` can only be obtained through validation, so every
//! distance computed from one is taken between real coordinates.

/// Client-reported coordinates and their validation.
pub mod location;

pub use location::{Location, LocationError};

/// Mean Earth radius used by the haversine formula, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two (lat, lng) pairs in degrees.
///
/// Pure function. Out-of-range input yields a number that means nothing;
/// validating coordinates is the caller's job.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance in kilometers between two validated locations.
pub fn distance_km(a: Location, b: Location) -> f64 {
    haversine_km(a.lat, a.lng, b.lat, b.lng)
}
