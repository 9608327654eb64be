//! Spherical (web) Mercator to WGS84 conversion.
//!
//! The boundary topology is published in projected meters. Map rendering and
//! point lookups work in degrees, so every polygon coordinate passes through
//! [`reproject`] after arc stitching.

use std::f64::consts::PI;

use geo::Coord;

/// Half the equatorial circumference of the spherical Mercator projection in
/// meters. Projected coordinates fall roughly within `±` this value.
pub const MERCATOR_HALF_EXTENT: f64 = 20_037_508.34;

/// Converts a projected `(x, y)` pair in meters to `(longitude, latitude)` in
/// degrees.
///
/// Non-finite input produces non-finite output; it never panics.
#[must_use]
pub fn reproject(x: f64, y: f64) -> (f64, f64) {
    let lon = x * 180.0 / MERCATOR_HALF_EXTENT;
    let lat = (y * PI / MERCATOR_HALF_EXTENT).exp().atan() * 360.0 / PI - 90.0;
    (lon, lat)
}

/// Forward projection: `(longitude, latitude)` in degrees to `(x, y)` meters.
///
/// Inverse of [`reproject`]. Latitudes at the poles map to infinity.
#[must_use]
pub fn project(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon * MERCATOR_HALF_EXTENT / 180.0;
    let y = ((90.0 + lat) * PI / 360.0).tan().ln() * MERCATOR_HALF_EXTENT / PI;
    (x, y)
}

/// [`reproject`] over a [`Coord`], for use with `geo::MapCoords`.
#[must_use]
pub fn reproject_coord(coord: Coord<f64>) -> Coord<f64> {
    let (x, y) = reproject(coord.x, coord.y);
    Coord { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE_M: f64 = 1e-6;

    #[test]
    fn origin_maps_to_null_island() {
        let (lon, lat) = reproject(0.0, 0.0);
        assert!(lon.abs() < 1e-12);
        assert!(lat.abs() < 1e-12);
    }

    #[test]
    fn x_extent_maps_to_antimeridian() {
        let (lon, _) = reproject(MERCATOR_HALF_EXTENT, 0.0);
        assert!((lon - 180.0).abs() < 1e-9);
        let (lon, _) = reproject(-MERCATOR_HALF_EXTENT, 0.0);
        assert!((lon + 180.0).abs() < 1e-9);
    }

    #[test]
    fn y_extent_maps_to_mercator_latitude_limit() {
        let (_, lat) = reproject(0.0, MERCATOR_HALF_EXTENT);
        assert!((lat - 85.051_128_78).abs() < 1e-6);
    }

    #[test]
    fn bangkok_round_trips() {
        // Bangkok city hall, roughly 100.50E 13.75N
        let (x, y) = project(100.5018, 13.7563);
        let (lon, lat) = reproject(x, y);
        assert!((lon - 100.5018).abs() < 1e-9);
        assert!((lat - 13.7563).abs() < 1e-9);
    }

    #[test]
    fn projected_points_recover_through_forward_projection() {
        let samples = [
            (0.0, 0.0),
            (11_187_000.0, 1_545_000.0),
            (-15_000_000.0, 19_000_000.0),
            (20_000_000.0, -20_000_000.0),
            (1.5, -2.25),
        ];

        for (x, y) in samples {
            let (lon, lat) = reproject(x, y);
            let (x2, y2) = project(lon, lat);
            assert!((x - x2).abs() < TOLERANCE_M, "x {x} came back as {x2}");
            assert!(
                (y - y2).abs() < TOLERANCE_M * y.abs().max(1.0),
                "y {y} came back as {y2}"
            );
        }
    }

    #[test]
    fn non_finite_input_does_not_panic() {
        let (lon, _) = reproject(f64::NAN, f64::INFINITY);
        assert!(lon.is_nan());
    }
}
