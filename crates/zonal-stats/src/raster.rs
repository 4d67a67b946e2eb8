//! In-memory georeferenced raster grid.
//!
//! Cell `(row, col)` covers the rectangle between
//! `origin + (col, row) * cell_size` and `origin + (col + 1, row + 1) * cell_size`,
//! where the origin is the top-left corner of cell `(0, 0)`. Cell sizes are
//! signed; a north-up grid has a negative cell height.

use serde::{Deserialize, Serialize};
use zonal_common::{BoundingBox, CrsCode};

use crate::error::{Result, ZonalError};

/// Placement and shape of a regular grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// X of the top-left corner of cell (0, 0)
    pub origin_x: f64,
    /// Y of the top-left corner of cell (0, 0)
    pub origin_y: f64,
    /// Signed cell width (x step per column)
    pub cell_width: f64,
    /// Signed cell height (y step per row), usually negative
    pub cell_height: f64,
    pub cols: usize,
    pub rows: usize,
}

impl GridGeometry {
    /// North-up geometry with square cells anchored at the top-left corner.
    pub fn north_up(origin_x: f64, origin_y: f64, cell_size: f64, cols: usize, rows: usize) -> Self {
        Self {
            origin_x,
            origin_y,
            cell_width: cell_size,
            cell_height: -cell_size,
            cols,
            rows,
        }
    }

    /// Total number of cells, or `None` if it does not fit in `usize`.
    pub fn checked_len(&self) -> Option<usize> {
        self.rows.checked_mul(self.cols)
    }

    /// Total number of cells. Saturates for dimensions no grid can hold.
    pub fn len(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(ZonalError::invalid_grid(
                self.rows,
                self.cols,
                "grid must have at least one row and one column",
            ));
        }
        if self.checked_len().is_none() {
            return Err(ZonalError::invalid_grid(
                self.rows,
                self.cols,
                "cell count overflows usize",
            ));
        }
        if !self.origin_x.is_finite() || !self.origin_y.is_finite() {
            return Err(ZonalError::invalid_grid(
                self.rows,
                self.cols,
                format!("non-finite origin ({}, {})", self.origin_x, self.origin_y),
            ));
        }
        for (name, size) in [("width", self.cell_width), ("height", self.cell_height)] {
            if !size.is_finite() || size == 0.0 {
                return Err(ZonalError::invalid_grid(
                    self.rows,
                    self.cols,
                    format!("cell {} must be finite and non-zero, got {}", name, size),
                ));
            }
        }
        Ok(())
    }
}

/// Half-open cell index window: rows `row_start..row_end`, cols `col_start..col_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl CellRange {
    /// Number of cells in the window.
    pub fn len(&self) -> usize {
        (self.row_end - self.row_start) * (self.col_end - self.col_start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable raster grid of `f32` values in row-major order.
///
/// A cell is "no data" when it equals the nodata sentinel or is NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    geometry: GridGeometry,
    crs: Option<CrsCode>,
    nodata: Option<f32>,
    data: Vec<f32>,
}

impl RasterGrid {
    /// Build a grid, checking dimensions, cell size and payload length.
    pub fn new(
        geometry: GridGeometry,
        data: Vec<f32>,
        nodata: Option<f32>,
        crs: Option<CrsCode>,
    ) -> Result<Self> {
        geometry.validate()?;

        if data.len() != geometry.len() {
            return Err(ZonalError::invalid_grid(
                geometry.rows,
                geometry.cols,
                format!(
                    "expected {} cell values, got {}",
                    geometry.len(),
                    data.len()
                ),
            ));
        }

        Ok(Self {
            geometry,
            crs,
            nodata,
            data,
        })
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn rows(&self) -> usize {
        self.geometry.rows
    }

    pub fn cols(&self) -> usize {
        self.geometry.cols
    }

    pub fn crs(&self) -> Option<CrsCode> {
        self.crs
    }

    pub fn nodata(&self) -> Option<f32> {
        self.nodata
    }

    /// Raw row-major values, nodata sentinels included.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Same cells, tagged with a different CRS.
    pub fn with_crs(mut self, crs: CrsCode) -> Self {
        self.crs = Some(crs);
        self
    }

    /// True if `value` is the nodata sentinel or NaN.
    #[inline]
    pub fn is_nodata(&self, value: f32) -> bool {
        value.is_nan() || self.nodata.map_or(false, |nd| value == nd)
    }

    fn check_index(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.geometry.rows || col >= self.geometry.cols {
            return Err(ZonalError::IndexOutOfBounds {
                row,
                col,
                rows: self.geometry.rows,
                cols: self.geometry.cols,
            });
        }
        Ok(())
    }

    /// Value of a cell, `None` when it holds no data.
    pub fn cell_value(&self, row: usize, col: usize) -> Result<Option<f32>> {
        self.check_index(row, col)?;
        Ok(self.value_unchecked(row, col))
    }

    /// Value lookup for indices already known to be in range.
    #[inline]
    pub(crate) fn value_unchecked(&self, row: usize, col: usize) -> Option<f32> {
        let value = self.data[row * self.geometry.cols + col];
        if self.is_nodata(value) {
            None
        } else {
            Some(value)
        }
    }

    /// Geographic rectangle covered by a cell.
    pub fn cell_bounds(&self, row: usize, col: usize) -> Result<BoundingBox> {
        self.check_index(row, col)?;
        let g = &self.geometry;
        let x0 = g.origin_x + col as f64 * g.cell_width;
        let x1 = g.origin_x + (col + 1) as f64 * g.cell_width;
        let y0 = g.origin_y + row as f64 * g.cell_height;
        let y1 = g.origin_y + (row + 1) as f64 * g.cell_height;
        Ok(BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)))
    }

    /// Center point of a cell, for indices already known to be in range.
    #[inline]
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        let g = &self.geometry;
        (
            g.origin_x + (col as f64 + 0.5) * g.cell_width,
            g.origin_y + (row as f64 + 0.5) * g.cell_height,
        )
    }

    /// Full extent covered by the grid.
    pub fn extent(&self) -> BoundingBox {
        let g = &self.geometry;
        let x1 = g.origin_x + g.cols as f64 * g.cell_width;
        let y1 = g.origin_y + g.rows as f64 * g.cell_height;
        BoundingBox::new(
            g.origin_x.min(x1),
            g.origin_y.min(y1),
            g.origin_x.max(x1),
            g.origin_y.max(y1),
        )
    }

    /// Cells whose bounds overlap `bbox`, clipped to the grid.
    ///
    /// Returns `None` when no cell overlaps.
    pub fn row_col_range(&self, bbox: &BoundingBox) -> Option<CellRange> {
        let g = &self.geometry;
        let (col_start, col_end) =
            axis_range(bbox.min_x, bbox.max_x, g.origin_x, g.cell_width, g.cols)?;
        let (row_start, row_end) =
            axis_range(bbox.min_y, bbox.max_y, g.origin_y, g.cell_height, g.rows)?;
        Some(CellRange {
            row_start,
            row_end,
            col_start,
            col_end,
        })
    }

    /// Cell containing the point `(x, y)`, if any.
    pub fn locate(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let g = &self.geometry;
        let col = ((x - g.origin_x) / g.cell_width).floor();
        let row = ((y - g.origin_y) / g.cell_height).floor();
        if !(col >= 0.0 && row >= 0.0 && col < g.cols as f64 && row < g.rows as f64) {
            return None;
        }
        Some((row as usize, col as usize))
    }

    /// Value of the cell containing `(x, y)` (nearest-cell sampling).
    pub fn sample(&self, x: f64, y: f64) -> Option<f32> {
        let (row, col) = self.locate(x, y)?;
        self.value_unchecked(row, col)
    }
}

/// Index window along one axis for the coordinate interval `[min, max]`.
///
/// Cell `i` spans fractional index `[i, i + 1]`; every cell touching the
/// interval is included.
fn axis_range(min: f64, max: f64, origin: f64, step: f64, count: usize) -> Option<(usize, usize)> {
    let a = (min - origin) / step;
    let b = (max - origin) / step;
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

    let start = lo.floor().max(0.0);
    let end = (hi.floor() + 1.0).min(count as f64);

    // NaN fails this comparison too
    if !(start < end) {
        return None;
    }
    Some((start as usize, end as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::create_test_grid;

    fn test_grid() -> RasterGrid {
        // 4 cols x 3 rows, 1-degree cells, top-left at (10, 50)
        RasterGrid::new(
            GridGeometry::north_up(10.0, 50.0, 1.0, 4, 3),
            create_test_grid(4, 3),
            Some(-9999.0),
            Some(CrsCode::WGS84),
        )
        .unwrap()
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let err = RasterGrid::new(GridGeometry::north_up(0.0, 0.0, 1.0, 0, 3), vec![], None, None)
            .unwrap_err();
        assert!(matches!(err, ZonalError::InvalidGrid { rows: 3, cols: 0, .. }));
    }

    #[test]
    fn test_payload_length_checked() {
        let err = RasterGrid::new(
            GridGeometry::north_up(0.0, 0.0, 1.0, 2, 2),
            vec![1.0; 3],
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ZonalError::InvalidGrid { .. }));
    }

    #[test]
    fn test_overflowing_dimensions_rejected() {
        let geometry = GridGeometry::north_up(0.0, 0.0, 1.0, usize::MAX / 2, 3);
        assert_eq!(geometry.checked_len(), None);
        assert_eq!(geometry.len(), usize::MAX);

        let err = RasterGrid::new(geometry, vec![], None, None).unwrap_err();
        assert!(matches!(err, ZonalError::InvalidGrid { rows: 3, .. }));
    }

    #[test]
    fn test_zero_cell_size_rejected() {
        let geometry = GridGeometry {
            cell_width: 0.0,
            ..GridGeometry::north_up(0.0, 0.0, 1.0, 2, 2)
        };
        assert!(RasterGrid::new(geometry, vec![0.0; 4], None, None).is_err());
    }

    #[test]
    fn test_cell_value_and_bounds() {
        let grid = test_grid();
        assert_eq!(grid.cell_value(0, 0).unwrap(), Some(0.0));
        assert_eq!(grid.cell_value(2, 3).unwrap(), Some(3002.0));

        let bounds = grid.cell_bounds(1, 2).unwrap();
        assert_eq!(bounds, BoundingBox::new(12.0, 48.0, 13.0, 49.0));
        assert_eq!(grid.cell_center(1, 2), (12.5, 48.5));
    }

    #[test]
    fn test_out_of_range_is_error_not_clamped() {
        let grid = test_grid();
        assert!(matches!(
            grid.cell_value(3, 0),
            Err(ZonalError::IndexOutOfBounds { row: 3, col: 0, rows: 3, cols: 4 })
        ));
        assert!(grid.cell_value(0, 4).is_err());
        assert!(grid.cell_bounds(0, 4).is_err());
    }

    #[test]
    fn test_nodata_sentinel_and_nan() {
        let grid = RasterGrid::new(
            GridGeometry::north_up(0.0, 2.0, 1.0, 2, 2),
            vec![1.0, -9999.0, f32::NAN, 0.0],
            Some(-9999.0),
            None,
        )
        .unwrap();
        assert_eq!(grid.cell_value(0, 0).unwrap(), Some(1.0));
        assert_eq!(grid.cell_value(0, 1).unwrap(), None);
        assert_eq!(grid.cell_value(1, 0).unwrap(), None);
        // Zero is a value, not missing data
        assert_eq!(grid.cell_value(1, 1).unwrap(), Some(0.0));
    }

    #[test]
    fn test_extent() {
        let grid = test_grid();
        assert_eq!(grid.extent(), BoundingBox::new(10.0, 47.0, 14.0, 50.0));
    }

    #[test]
    fn test_extent_south_up() {
        let geometry = GridGeometry {
            origin_x: 0.0,
            origin_y: -5.0,
            cell_width: 2.0,
            cell_height: 1.0,
            cols: 3,
            rows: 5,
        };
        let grid = RasterGrid::new(geometry, vec![0.0; 15], None, None).unwrap();
        assert_eq!(grid.extent(), BoundingBox::new(0.0, -5.0, 6.0, 0.0));
        assert_eq!(grid.cell_bounds(0, 0).unwrap(), BoundingBox::new(0.0, -5.0, 2.0, -4.0));
    }

    #[test]
    fn test_row_col_range_clipped() {
        let grid = test_grid();

        let inner = grid
            .row_col_range(&BoundingBox::new(11.2, 47.5, 12.7, 48.9))
            .unwrap();
        assert_eq!(
            inner,
            CellRange {
                row_start: 1,
                row_end: 3,
                col_start: 1,
                col_end: 3
            }
        );

        let clipped = grid
            .row_col_range(&BoundingBox::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        assert_eq!(clipped.len(), 12);

        assert!(grid
            .row_col_range(&BoundingBox::new(20.0, 47.0, 30.0, 50.0))
            .is_none());
    }

    #[test]
    fn test_locate_and_sample() {
        let grid = test_grid();
        assert_eq!(grid.locate(10.5, 49.5), Some((0, 0)));
        assert_eq!(grid.locate(13.99, 47.01), Some((2, 3)));
        assert_eq!(grid.locate(9.99, 49.5), None);
        assert_eq!(grid.sample(11.5, 48.5), Some(1001.0));
    }
}
