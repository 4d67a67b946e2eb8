//! Point and box transformations between EPSG codes.

use std::fmt;
use std::sync::Arc;

use proj4rs::proj::Proj;
use zonal_common::{BoundingBox, CrsCode};

use crate::error::{ProjectionError, ProjectionResult};
use crate::mercator::WebMercator;

/// Samples per bounding box edge for non-separable projections.
const EDGE_SAMPLES: usize = 21;

/// A resolved transformation between two CRS codes.
///
/// - any code to itself is the identity
/// - EPSG:4326 ⇄ EPSG:4269 is the identity too (the NAD83/WGS84 datum
///   shift is below a meter and ignored)
/// - EPSG:4326 / EPSG:4269 ⇄ EPSG:3857 use the built-in spherical Mercator
/// - every other pair goes through proj4rs with definitions looked up in
///   the crs-definitions database
#[derive(Debug, Clone)]
pub enum CrsTransform {
    Identity,
    GeographicToMercator(WebMercator),
    MercatorToGeographic(WebMercator),
    Proj(ProjTransform),
}

impl CrsTransform {
    /// Resolve the transformation from `from` to `to`.
    pub fn between(from: CrsCode, to: CrsCode) -> ProjectionResult<Self> {
        if from == to || (from.is_geographic() && to.is_geographic()) {
            return Ok(CrsTransform::Identity);
        }

        if from.is_geographic() && to == CrsCode::WEB_MERCATOR {
            return Ok(CrsTransform::GeographicToMercator(WebMercator::new()));
        }

        if from == CrsCode::WEB_MERCATOR && to.is_geographic() {
            return Ok(CrsTransform::MercatorToGeographic(WebMercator::new()));
        }

        ProjTransform::new(from, to).map(CrsTransform::Proj)
    }

    /// The transformation running the other way.
    pub fn inverse(&self) -> Self {
        match self {
            CrsTransform::Identity => CrsTransform::Identity,
            CrsTransform::GeographicToMercator(p) => CrsTransform::MercatorToGeographic(*p),
            CrsTransform::MercatorToGeographic(p) => CrsTransform::GeographicToMercator(*p),
            CrsTransform::Proj(t) => CrsTransform::Proj(t.inverse()),
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, CrsTransform::Identity)
    }

    /// Transform a single `(x, y)` coordinate.
    pub fn transform_point(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjectionError::NonFinite { x, y });
        }

        match self {
            CrsTransform::Identity => Ok((x, y)),
            CrsTransform::GeographicToMercator(p) => Ok(p.forward(x, y)),
            CrsTransform::MercatorToGeographic(p) => Ok(p.inverse(x, y)),
            CrsTransform::Proj(t) => t.transform_point(x, y),
        }
    }

    /// Transform a bounding box.
    ///
    /// The built-in projections are separable and monotonic per axis, so
    /// two opposite corners are exact. General projections bend the box
    /// edges; those are sampled and the envelope of the samples is returned.
    pub fn transform_bbox(&self, bbox: &BoundingBox) -> ProjectionResult<BoundingBox> {
        if let CrsTransform::Proj(t) = self {
            return t.transform_bbox(bbox);
        }

        let (x0, y0) = self.transform_point(bbox.min_x, bbox.min_y)?;
        let (x1, y1) = self.transform_point(bbox.max_x, bbox.max_y)?;
        Ok(BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)))
    }
}

/// proj4 string for an EPSG code from the crs-definitions database.
pub fn proj_string(code: CrsCode) -> Option<&'static str> {
    u16::try_from(code.code())
        .ok()
        .and_then(crs_definitions::from_code)
        .map(|def| def.proj4)
}

/// Transformation between two proj4 definitions.
///
/// proj4rs works in radians for `+proj=longlat` systems; degrees are
/// converted on the way in and out.
#[derive(Clone)]
pub struct ProjTransform {
    from: CrsCode,
    to: CrsCode,
    source: Arc<Proj>,
    target: Arc<Proj>,
    source_geographic: bool,
    target_geographic: bool,
}

impl ProjTransform {
    pub fn new(from: CrsCode, to: CrsCode) -> ProjectionResult<Self> {
        let (source, source_geographic) = load_proj(from)?;
        let (target, target_geographic) = load_proj(to)?;
        Ok(Self {
            from,
            to,
            source: Arc::new(source),
            target: Arc::new(target),
            source_geographic,
            target_geographic,
        })
    }

    pub fn inverse(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
            source: Arc::clone(&self.target),
            target: Arc::clone(&self.source),
            source_geographic: self.target_geographic,
            target_geographic: self.source_geographic,
        }
    }

    pub fn transform_point(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        let mut point = if self.source_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        proj4rs::transform::transform(&self.source, &self.target, &mut point).map_err(|e| {
            ProjectionError::Failed {
                from: self.from,
                to: self.to,
                message: format!("{:?}", e),
            }
        })?;

        let (out_x, out_y) = if self.target_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !out_x.is_finite() || !out_y.is_finite() {
            return Err(ProjectionError::Failed {
                from: self.from,
                to: self.to,
                message: format!("({}, {}) has no finite image", x, y),
            });
        }
        Ok((out_x, out_y))
    }

    fn transform_bbox(&self, bbox: &BoundingBox) -> ProjectionResult<BoundingBox> {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        let steps = (EDGE_SAMPLES - 1) as f64;
        for i in 0..EDGE_SAMPLES {
            let t = i as f64 / steps;
            let x = bbox.min_x + (bbox.max_x - bbox.min_x) * t;
            let y = bbox.min_y + (bbox.max_y - bbox.min_y) * t;
            for (px, py) in [(x, bbox.min_y), (x, bbox.max_y), (bbox.min_x, y), (bbox.max_x, y)] {
                let (tx, ty) = self.transform_point(px, py)?;
                min_x = min_x.min(tx);
                min_y = min_y.min(ty);
                max_x = max_x.max(tx);
                max_y = max_y.max(ty);
            }
        }

        Ok(BoundingBox::new(min_x, min_y, max_x, max_y))
    }
}

impl fmt::Debug for ProjTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjTransform")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("source_geographic", &self.source_geographic)
            .field("target_geographic", &self.target_geographic)
            .finish()
    }
}

fn load_proj(code: CrsCode) -> ProjectionResult<(Proj, bool)> {
    let definition = proj_string(code).ok_or(ProjectionError::UnknownCrs(code))?;
    let proj = Proj::from_proj_string(definition).map_err(|e| ProjectionError::InvalidDefinition {
        code,
        message: format!("{:?}", e),
    })?;
    Ok((proj, definition.contains("+proj=longlat")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    const UTM_30N: CrsCode = CrsCode(32630);

    #[test]
    fn test_identity_for_same_code() {
        let t = CrsTransform::between(UTM_30N, UTM_30N).unwrap();
        assert!(t.is_identity());
        assert_eq!(t.transform_point(1.5, -2.5).unwrap(), (1.5, -2.5));
    }

    #[test]
    fn test_geographic_pair_is_identity() {
        let t = CrsTransform::between(CrsCode::NAD83, CrsCode::WGS84).unwrap();
        assert!(t.is_identity());
    }

    #[test]
    fn test_utm_central_meridian() {
        let t = CrsTransform::between(CrsCode::WGS84, UTM_30N).unwrap();
        assert!(matches!(t, CrsTransform::Proj(_)));

        let (x, y) = t.transform_point(-3.0, 0.0).unwrap();
        assert_approx_eq!(x, 500_000.0, 1e-3);
        assert_approx_eq!(y, 0.0, 1e-3);
    }

    #[test]
    fn test_utm_roundtrip() {
        let t = CrsTransform::between(CrsCode::WGS84, UTM_30N).unwrap();
        let (x, y) = t.transform_point(-5.5, 33.5).unwrap();
        assert!(x < 500_000.0);
        assert!(y > 3_000_000.0);

        let (lon, lat) = t.inverse().transform_point(x, y).unwrap();
        assert_approx_eq!(lon, -5.5, 1e-7);
        assert_approx_eq!(lat, 33.5, 1e-7);
    }

    #[test]
    fn test_utm_bbox_covers_corners() {
        let t = CrsTransform::between(CrsCode::WGS84, UTM_30N).unwrap();
        let bbox = BoundingBox::new(-6.0, 33.0, -4.0, 35.0);
        let projected = t.transform_bbox(&bbox).unwrap();

        for (lon, lat) in [(-6.0, 33.0), (-6.0, 35.0), (-4.0, 33.0), (-4.0, 35.0)] {
            let (x, y) = t.transform_point(lon, lat).unwrap();
            assert!(x >= projected.min_x && x <= projected.max_x);
            assert!(y >= projected.min_y && y <= projected.max_y);
        }
    }

    #[test]
    fn test_unknown_code() {
        let err = CrsTransform::between(CrsCode::WGS84, CrsCode(999_999)).unwrap_err();
        assert_eq!(err, ProjectionError::UnknownCrs(CrsCode(999_999)));

        assert!(proj_string(CrsCode(999_999)).is_none());
        assert!(proj_string(UTM_30N).is_some());
    }

    #[test]
    fn test_bbox_roundtrip() {
        let to_merc = CrsTransform::between(CrsCode::WGS84, CrsCode::WEB_MERCATOR).unwrap();
        let bbox = BoundingBox::new(-10.0, 28.0, -1.0, 36.0);
        let projected = to_merc.transform_bbox(&bbox).unwrap();
        assert!(projected.min_x < projected.max_x);
        assert!(projected.min_y < projected.max_y);

        let back = to_merc.inverse().transform_bbox(&projected).unwrap();
        assert_approx_eq!(back.min_x, bbox.min_x, 1e-9);
        assert_approx_eq!(back.min_y, bbox.min_y, 1e-9);
        assert_approx_eq!(back.max_x, bbox.max_x, 1e-9);
        assert_approx_eq!(back.max_y, bbox.max_y, 1e-9);
    }

    #[test]
    fn test_non_finite_rejected() {
        let t = CrsTransform::between(CrsCode::WGS84, CrsCode::WEB_MERCATOR).unwrap();
        assert!(t.transform_point(f64::NAN, 0.0).is_err());

        let utm = CrsTransform::between(CrsCode::WGS84, UTM_30N).unwrap();
        assert!(utm.transform_point(0.0, f64::INFINITY).is_err());
    }
}
