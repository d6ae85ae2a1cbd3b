//! Spherical-Earth geodesy.
//!
//! All angles are in degrees and all lengths in meters.  Bearings follow the
//! compass convention: 0 = true north, 90 = east, normalised to `[0, 360)`.
//!
//! # Example
//!
//! ```rust
//! use usv_nav::geo::{bearing, destination, distance};
//! use usv_types::Position;
//!
//! let origin = Position::new(0.0, 0.0);
//! let east = destination(origin, 90.0, 1_000.0);
//!
//! assert!((distance(origin, east) - 1_000.0).abs() < 1e-6);
//! assert!((bearing(origin, east) - 90.0).abs() < 1e-6);
//! ```

use usv_types::Position;

/// Mean Earth radius used by every calculation in this module.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between `a` and `b` (haversine formula).
pub fn distance(a: Position, b: Position) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Initial great-circle bearing from `a` towards `b`, in `[0, 360)`.
///
/// Coincident points yield 0.
pub fn bearing(a: Position, b: Position) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    wrap_360(y.atan2(x).to_degrees())
}

/// The point reached by travelling `distance_m` from `origin` along the
/// initial bearing `bearing_deg`.
pub fn destination(origin: Position, bearing_deg: f64, distance_m: f64) -> Position {
    let lat = origin.latitude.to_radians();
    let lon = origin.longitude.to_radians();
    let brg = bearing_deg.to_radians();
    let angular = distance_m / EARTH_RADIUS_M;

    let new_lat = (lat.sin() * angular.cos() + lat.cos() * angular.sin() * brg.cos()).asin();
    let new_lon = lon
        + (brg.sin() * angular.sin() * lat.cos()).atan2(angular.cos() - lat.sin() * new_lat.sin());

    Position::new(new_lat.to_degrees(), new_lon.to_degrees())
}

/// Normalise an angle to `[0, 360)`.
pub fn wrap_360(angle_deg: f64) -> f64 {
    let wrapped = angle_deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Normalise an angle to `(-180, 180]`.
pub fn wrap_180(angle_deg: f64) -> f64 {
    let wrapped = wrap_360(angle_deg);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Smallest absolute angular difference between two headings, in `[0, 180]`.
pub fn heading_error(current_deg: f64, desired_deg: f64) -> f64 {
    let cw = wrap_360(current_deg - desired_deg);
    let ccw = wrap_360(desired_deg - current_deg);
    cw.min(ccw)
}
