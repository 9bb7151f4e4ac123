// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Mean radius of Earth, in kilometers.
const EARTH_RADIUS: f64 = 6371.0;

/// Calculates the great-circle distance between two lat-lon positions
/// on Earth using the [spherical law of cosines](https://en.wikipedia.org/wiki/Great-circle_distance#Formulae).
/// Inputs are in degrees, the result is in kilometers.
///
/// The argument to the arccosine is clamped to `[-1, 1]`, as rounding errors
/// for identical or antipodal points may push it slightly out of the domain.
pub fn earth_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lon1 = lon1.to_radians();
    let lat2 = lat2.to_radians();
    let lon2 = lon2.to_radians();

    let cos_angle = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * (lon2 - lon1).cos();

    EARTH_RADIUS * cos_angle.clamp(-1.0, 1.0).acos()
}
