//! Zonal overlay: maximum raster value inside each region.
//!
//! # Sampling
//!
//! A cell contributes to a region when its center lies inside the region
//! (even-odd over all rings, boundary inclusive). Cells are never split, so
//! this is cell-center sampling, not area-weighted coverage: a region
//! narrower than a cell may catch no center at all and report no data, and
//! a cell whose center sits on a shared border counts for both neighbours.
//!
//! # Search window
//!
//! Only cells whose bounds overlap the region's bounding box are tested, so
//! the cost per region scales with its bbox in cells, not with the grid.
//!
//! # Ordering
//!
//! Regions are independent. With `parallel` enabled they run on the rayon
//! pool; the indexed `collect` puts each row back at its region's position,
//! so the table order always equals the region set order.

use std::time::Instant;

use rayon::prelude::*;
use zonal_common::{CrsCode, FieldNames};

use crate::config::ZonalConfig;
use crate::containment::contains_point;
use crate::error::{Result, ZonalError};
use crate::raster::RasterGrid;
use crate::region::{AttributeValue, PolygonRegion, RegionSet, Ring};
use crate::result::{ResultRow, ResultTable};

/// Column name used for the WKT passthrough column.
pub const GEOMETRY_COLUMN: &str = "geometry";

/// How a region's statistic came about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionOutcome {
    /// Maximum over `cells` contributing cells.
    Value { max: f32, cells: usize },
    /// Region bbox does not overlap the grid extent.
    OutsideGrid,
    /// Overlaps the grid but no cell center falls inside the region.
    NoInteriorCells,
    /// Every interior cell holds no data.
    AllNoData { cells: usize },
}

impl RegionOutcome {
    /// The statistic, `None` for every no-data outcome.
    pub fn value(&self) -> Option<f32> {
        match *self {
            RegionOutcome::Value { max, .. } => Some(max),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RegionOutcome::Value { .. } => "value",
            RegionOutcome::OutsideGrid => "outside grid",
            RegionOutcome::NoInteriorCells => "no interior cells",
            RegionOutcome::AllNoData { .. } => "all cells no data",
        }
    }
}

/// Maximum of the interior, non-nodata cells of one region.
///
/// Pure: neither input is modified. The region is assumed valid and in the
/// grid's CRS; [`ZonalOverlay::compute`] checks both before calling this.
pub fn region_max(grid: &RasterGrid, region: &PolygonRegion) -> RegionOutcome {
    let bbox = match region.bbox() {
        Some(bbox) => bbox,
        None => return RegionOutcome::NoInteriorCells,
    };

    if grid.extent().intersection(&bbox).is_none() {
        return RegionOutcome::OutsideGrid;
    }

    let range = match grid.row_col_range(&bbox) {
        Some(range) => range,
        None => return RegionOutcome::OutsideGrid,
    };

    let rings: Vec<&Ring> = region.rings().collect();
    let mut interior = 0usize;
    let mut max: Option<f32> = None;

    for row in range.row_start..range.row_end {
        for col in range.col_start..range.col_end {
            let (x, y) = grid.cell_center(row, col);
            if !bbox.contains_point(x, y) || !contains_point(rings.iter().copied(), x, y) {
                continue;
            }
            interior += 1;
            if let Some(value) = grid.value_unchecked(row, col) {
                max = Some(match max {
                    Some(current) if current >= value => current,
                    _ => value,
                });
            }
        }
    }

    match max {
        Some(max) => RegionOutcome::Value {
            max,
            cells: interior,
        },
        None if interior == 0 => RegionOutcome::NoInteriorCells,
        None => RegionOutcome::AllNoData { cells: interior },
    }
}

/// Zonal maximum engine.
#[derive(Debug, Clone)]
pub struct ZonalOverlay {
    fields: FieldNames,
    parallel: bool,
    carry_fields: Vec<String>,
    include_geometry: bool,
}

impl Default for ZonalOverlay {
    fn default() -> Self {
        Self::new(&ZonalConfig::default())
    }
}

impl ZonalOverlay {
    pub fn new(config: &ZonalConfig) -> Self {
        Self {
            fields: config.fields.clone(),
            parallel: config.parallel,
            carry_fields: config.carry_fields.clone(),
            include_geometry: config.include_geometry,
        }
    }

    pub fn fields(&self) -> &FieldNames {
        &self.fields
    }

    /// Compute the maximum for every region.
    ///
    /// Every region is validated before any statistic is written: on error,
    /// no region's attributes have been touched. On success each region's
    /// attributes hold the statistic (`Null` for no data) and the table has
    /// one row per region in region order.
    pub fn compute(&self, grid: &RasterGrid, regions: &mut RegionSet) -> Result<ResultTable> {
        let started = Instant::now();
        let grid_crs = self.check_inputs(grid, regions)?;

        tracing::info!(
            regions = regions.len(),
            rows = grid.rows(),
            cols = grid.cols(),
            crs = %grid_crs,
            parallel = self.parallel,
            "Computing zonal maximum"
        );

        let fields = &self.fields;
        let rows: Vec<ResultRow> = if self.parallel {
            regions
                .regions_mut()
                .par_iter_mut()
                .map(|region| apply_region(grid, region, fields))
                .collect()
        } else {
            regions
                .regions_mut()
                .iter_mut()
                .map(|region| apply_region(grid, region, fields))
                .collect()
        };

        let mut table = ResultTable::new(self.fields.clone(), rows);

        for name in &self.carry_fields {
            let values = regions
                .iter()
                .map(|r| {
                    r.attributes
                        .get(name)
                        .map(AttributeValue::to_field)
                        .unwrap_or_default()
                })
                .collect();
            table = table.with_column(name.clone(), values)?;
        }

        if self.include_geometry {
            let values = regions.iter().map(PolygonRegion::to_wkt).collect();
            table = table.with_column(GEOMETRY_COLUMN, values)?;
        }

        let counts = table.counts();
        tracing::info!(
            regions = counts.regions,
            with_data = counts.with_data,
            no_data = counts.no_data,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Zonal maximum complete"
        );

        Ok(table)
    }

    /// Grid CRS, after checking every region and carried field against it.
    fn check_inputs(&self, grid: &RasterGrid, regions: &RegionSet) -> Result<CrsCode> {
        if grid.rows() == 0 || grid.cols() == 0 {
            return Err(ZonalError::invalid_grid(
                grid.rows(),
                grid.cols(),
                "grid must have at least one row and one column",
            ));
        }

        let grid_crs = grid
            .crs()
            .ok_or_else(|| ZonalError::MissingCrs("raster grid".to_string()))?;

        for region in regions {
            region.validate()?;

            let region_crs = region
                .crs
                .ok_or_else(|| ZonalError::MissingCrs(format!("region {}", region.id)))?;

            if region_crs != grid_crs {
                return Err(ZonalError::CrsMismatch {
                    region: region.id.to_string(),
                    grid_crs,
                    region_crs,
                });
            }
        }

        for name in &self.carry_fields {
            if !regions.is_empty() && regions.iter().all(|r| r.attributes.get(name).is_none()) {
                return Err(ZonalError::UnknownField(name.clone()));
            }
        }

        Ok(grid_crs)
    }
}

fn apply_region(grid: &RasterGrid, region: &mut PolygonRegion, fields: &FieldNames) -> ResultRow {
    let outcome = region_max(grid, region);

    match outcome {
        RegionOutcome::Value { max, cells } => {
            tracing::debug!(region = %region.id, max, cells, "Region statistic");
        }
        _ => {
            tracing::warn!(
                region = %region.id,
                reason = outcome.label(),
                "No contributing cells, statistic left empty"
            );
        }
    }

    region.attributes.set_statistic(fields, outcome.value());
    ResultRow::new(region.id.clone(), outcome.value())
}

/// Zonal maximum with default settings.
///
/// Both inputs must already share a CRS; see [`crate::CrsNormalizer`].
pub fn compute_zonal_max(grid: &RasterGrid, regions: &mut RegionSet) -> Result<ResultTable> {
    ZonalOverlay::default().compute(grid, regions)
}
