//! Test data generators for synthetic raster values.
//!
//! These generators create predictable, verifiable value patterns
//! that can be used across the test suite. All grids are row-major,
//! row 0 first.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// This makes it easy to verify that data is being read/written correctly
/// by checking that grid[row][col] == col * 1000 + row.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50); // 10 * 5
/// assert_eq!(grid[0], 0.0);   // col=0, row=0 -> 0*1000 + 0
/// assert_eq!(grid[1], 1000.0); // col=1, row=0 -> 1*1000 + 0
/// assert_eq!(grid[10], 1.0);  // col=0, row=1 -> 0*1000 + 1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a shaking-intensity-like grid (MMI scale).
///
/// Intensity peaks at `peak` in the cell `(epicenter_col, epicenter_row)`
/// and decays linearly by one unit per `falloff` cells of distance,
/// never dropping below 1.0.
pub fn create_intensity_grid(
    width: usize,
    height: usize,
    epicenter_col: usize,
    epicenter_row: usize,
    peak: f32,
    falloff: f32,
) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let dx = col as f32 - epicenter_col as f32;
            let dy = row as f32 - epicenter_row as f32;
            let dist = (dx * dx + dy * dy).sqrt();
            data.push((peak - dist / falloff).max(1.0));
        }
    }
    data
}

/// Creates a grid with a nodata sentinel at specified positions.
///
/// Cells not listed hold `fill`.
///
/// # Arguments
///
/// * `nodata_positions` - List of (col, row) positions that hold `nodata`
pub fn create_grid_with_nodata(
    width: usize,
    height: usize,
    fill: f32,
    nodata: f32,
    nodata_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![fill; width * height];
    for &(col, row) in nodata_positions {
        if col < width && row < height {
            data[row * width + col] = nodata;
        }
    }
    data
}

/// Creates a grid with deterministic pseudo-random values in `[0, max)`.
///
/// Uses a simple hash-based approach for reproducibility.
pub fn create_noise_grid(width: usize, height: usize, max: f32, seed: u32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            data.push((hash % 10_000) as f32 / 10_000.0 * max);
        }
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}
