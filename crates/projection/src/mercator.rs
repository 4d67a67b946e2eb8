//! Spherical (Web) Mercator projection, EPSG:3857.
//!
//! The projection is separable: x depends only on longitude and y only on
//! latitude, and both are strictly increasing. Axis-aligned boxes therefore
//! map to axis-aligned boxes, and the relative order of vertices along each
//! axis is preserved.

use std::f64::consts::PI;

/// Web Mercator projection on the WGS84 semi-major axis sphere.
#[derive(Debug, Clone, Copy)]
pub struct WebMercator {
    /// Sphere radius in meters
    pub radius: f64,
}

impl Default for WebMercator {
    fn default() -> Self {
        Self::new()
    }
}

impl WebMercator {
    /// WGS84 semi-major axis (meters)
    pub const EARTH_RADIUS: f64 = 6378137.0;

    /// Latitude at which the projected square world ends (degrees).
    pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

    /// Half the width of the projected world (meters).
    pub const MAX_EXTENT: f64 = 20_037_508.342_789_244;

    pub fn new() -> Self {
        Self {
            radius: Self::EARTH_RADIUS,
        }
    }

    /// Project geographic degrees to meters.
    ///
    /// Latitudes beyond ±[`Self::MAX_LATITUDE`] are clamped to it.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.clamp(-Self::MAX_LATITUDE, Self::MAX_LATITUDE);

        let x = self.radius * lon_deg.to_radians();
        let y = self.radius * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        (x, y)
    }

    /// Unproject meters back to geographic degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = (x / self.radius).to_degrees();
        let lat = (2.0 * (y / self.radius).exp().atan() - PI / 2.0).to_degrees();
        (lon, lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, assert_coords_approx_eq};

    #[test]
    fn test_origin() {
        let proj = WebMercator::new();
        let (x, y) = proj.forward(0.0, 0.0);
        assert_approx_eq!(x, 0.0, 1e-9);
        assert_approx_eq!(y, 0.0, 1e-9);
    }

    #[test]
    fn test_world_extent() {
        let proj = WebMercator::new();
        let (x, y) = proj.forward(180.0, WebMercator::MAX_LATITUDE);
        assert_approx_eq!(x, WebMercator::MAX_EXTENT, 1e-3);
        assert_approx_eq!(y, WebMercator::MAX_EXTENT, 1e-3);
    }

    #[test]
    fn test_pole_is_clamped() {
        let proj = WebMercator::new();
        let (_, y_pole) = proj.forward(0.0, 90.0);
        let (_, y_max) = proj.forward(0.0, WebMercator::MAX_LATITUDE);
        assert_eq!(y_pole, y_max);
        assert!(y_pole.is_finite());
    }

    #[test]
    fn test_roundtrip_marrakesh() {
        let proj = WebMercator::new();
        let (lon, lat) = (-7.9811, 31.6295);
        let (x, y) = proj.forward(lon, lat);
        let back = proj.inverse(x, y);
        assert_coords_approx_eq!((back.0, back.1), (lon, lat), 1e-9);
    }

    #[test]
    fn test_monotonic_in_latitude() {
        let proj = WebMercator::new();
        let mut previous = f64::NEG_INFINITY;
        for step in -80..=80 {
            let (_, y) = proj.forward(10.0, step as f64);
            assert!(y > previous, "y must increase with latitude at {}", step);
            previous = y;
        }
    }
}
