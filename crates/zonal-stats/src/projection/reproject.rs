//! Grid reprojection between supported coordinate systems.
//!
//! The output grid keeps the input's row and column counts and covers the
//! transformed extent with a north-up layout. Each output cell takes the
//! value of the source cell containing its center once mapped back into
//! the source CRS (nearest-cell sampling, no interpolation). Cells that map
//! outside the source, or onto a no-data cell, hold the no-data sentinel
//! (NaN when the source has none).

use projection::CrsTransform;
use rayon::prelude::*;
use zonal_common::CrsCode;

use crate::error::Result;
use crate::raster::{GridGeometry, RasterGrid};

/// Reproject `grid` through `transform` into a grid tagged `target`.
///
/// # Example
/// ```
/// use projection::CrsTransform;
/// use zonal_common::CrsCode;
/// use zonal_stats::{reproject_grid, GridGeometry, RasterGrid};
///
/// let grid = RasterGrid::new(
///     GridGeometry::north_up(-10.0, 36.0, 0.5, 4, 3),
///     vec![1.0; 12],
///     Some(-9999.0),
///     Some(CrsCode::WGS84),
/// )
/// .unwrap();
///
/// let transform = CrsTransform::between(CrsCode::WGS84, CrsCode::WEB_MERCATOR).unwrap();
/// let projected = reproject_grid(&grid, &transform, CrsCode::WEB_MERCATOR).unwrap();
///
/// assert_eq!(projected.rows(), 3);
/// assert_eq!(projected.cols(), 4);
/// assert_eq!(projected.crs(), Some(CrsCode::WEB_MERCATOR));
/// ```
pub fn reproject_grid(
    grid: &RasterGrid,
    transform: &CrsTransform,
    target: CrsCode,
) -> Result<RasterGrid> {
    let extent = transform.transform_bbox(&grid.extent())?;
    let cols = grid.cols();
    let rows = grid.rows();

    let geometry = GridGeometry {
        origin_x: extent.min_x,
        origin_y: extent.max_y,
        cell_width: extent.width() / cols as f64,
        cell_height: -extent.height() / rows as f64,
        cols,
        rows,
    };

    let fill = grid.nodata().unwrap_or(f32::NAN);
    let inverse = transform.inverse();
    let mut output = vec![fill; rows * cols];

    output
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(row, out_row)| {
            let y = geometry.origin_y + (row as f64 + 0.5) * geometry.cell_height;
            for (col, cell) in out_row.iter_mut().enumerate() {
                let x = geometry.origin_x + (col as f64 + 0.5) * geometry.cell_width;
                // Centers with no source position stay no-data
                if let Ok((sx, sy)) = inverse.transform_point(x, y) {
                    if let Some(value) = grid.sample(sx, sy) {
                        *cell = value;
                    }
                }
            }
        });

    RasterGrid::new(geometry, output, grid.nodata(), Some(target))
}
