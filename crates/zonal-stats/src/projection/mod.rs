//! CRS normalization of grids and regions.
//!
//! Both layers are brought into one target CRS before the overlay. Inputs
//! already in the target CRS come back untouched, coordinates and cell
//! values bit for bit. Everything else goes through a [`CrsTransform`]:
//! regions vertex by vertex, grids by nearest-cell resampling.

pub mod reproject;

pub use reproject::reproject_grid;

use projection::CrsTransform;
use zonal_common::CrsCode;

use crate::config::ZonalConfig;
use crate::error::{Result, ZonalError};
use crate::raster::RasterGrid;
use crate::region::{Polygon, PolygonRegion, RegionSet};

/// Brings grids and regions into a fixed target CRS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrsNormalizer {
    target: CrsCode,
    assumed: Option<CrsCode>,
}

impl CrsNormalizer {
    /// Normalizer that rejects inputs without a declared CRS.
    pub fn new(target: CrsCode) -> Self {
        Self {
            target,
            assumed: None,
        }
    }

    /// Declare `crs` on inputs that carry none instead of failing.
    pub fn with_assumed(mut self, crs: CrsCode) -> Self {
        self.assumed = Some(crs);
        self
    }

    pub fn from_config(config: &ZonalConfig) -> Self {
        Self {
            target: config.target_crs,
            assumed: config.assume_crs,
        }
    }

    pub fn target(&self) -> CrsCode {
        self.target
    }

    fn source(&self, declared: Option<CrsCode>, what: impl FnOnce() -> String) -> Result<CrsCode> {
        declared
            .or(self.assumed)
            .ok_or_else(|| ZonalError::MissingCrs(what()))
    }

    /// Express `grid` in the target CRS.
    pub fn normalize_grid(&self, grid: RasterGrid) -> Result<RasterGrid> {
        let source = self.source(grid.crs(), || "raster grid".to_string())?;
        if source == self.target {
            return Ok(grid.with_crs(self.target));
        }

        let transform = CrsTransform::between(source, self.target)?;
        if transform.is_identity() {
            return Ok(grid.with_crs(self.target));
        }

        tracing::info!(
            from = %source,
            to = %self.target,
            rows = grid.rows(),
            cols = grid.cols(),
            "Reprojecting raster grid"
        );
        reproject_grid(&grid, &transform, self.target)
    }

    /// Express `region` in the target CRS.
    pub fn normalize_region(&self, mut region: PolygonRegion) -> Result<PolygonRegion> {
        let source = self.source(region.crs, || format!("region {}", region.id))?;
        if source == self.target {
            region.crs = Some(self.target);
            return Ok(region);
        }

        let transform = CrsTransform::between(source, self.target)?;
        if !transform.is_identity() {
            region.polygons = region
                .polygons
                .iter()
                .map(|polygon| {
                    polygon
                        .rings
                        .iter()
                        .map(|ring| ring.try_map(|x, y| transform.transform_point(x, y)))
                        .collect::<std::result::Result<Vec<_>, _>>()
                        .map(Polygon::new)
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
        }

        region.crs = Some(self.target);
        Ok(region)
    }

    /// Express every region in the target CRS, keeping order.
    pub fn normalize_regions(&self, regions: RegionSet) -> Result<RegionSet> {
        let count = regions.len();
        let normalized = regions
            .into_regions()
            .into_iter()
            .map(|region| self.normalize_region(region))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(regions = count, target = %self.target, "Normalized regions");
        RegionSet::new(normalized)
    }
}
