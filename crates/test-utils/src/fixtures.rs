//! Common test fixtures for zonal statistics tests.
//!
//! Rings are plain `Vec<(f64, f64)>` so this crate stays free of
//! workspace dependencies. Every ring returned here is closed
//! (first vertex repeated at the end).

/// Polygon ring builders.
pub mod rings {
    /// Closed counter-clockwise square ring.
    pub fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<(f64, f64)> {
        vec![
            (min_x, min_y),
            (max_x, min_y),
            (max_x, max_y),
            (min_x, max_y),
            (min_x, min_y),
        ]
    }

    /// Closed triangle ring.
    pub fn triangle(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Vec<(f64, f64)> {
        vec![a, b, c, a]
    }

    /// Closed ring approximating a circle with `segments` vertices.
    pub fn circle(cx: f64, cy: f64, radius: f64, segments: usize) -> Vec<(f64, f64)> {
        let segments = segments.max(3);
        let mut ring: Vec<(f64, f64)> = (0..segments)
            .map(|i| {
                let angle = i as f64 / segments as f64 * std::f64::consts::TAU;
                (cx + radius * angle.cos(), cy + radius * angle.sin())
            })
            .collect();
        ring.push(ring[0]);
        ring
    }

    /// An L-shaped (concave) ring covering the lower-left, lower-right and
    /// upper-left quadrants of the box.
    pub fn l_shape(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<(f64, f64)> {
        let mid_x = (min_x + max_x) / 2.0;
        let mid_y = (min_y + max_y) / 2.0;
        vec![
            (min_x, min_y),
            (max_x, min_y),
            (max_x, mid_y),
            (mid_x, mid_y),
            (mid_x, max_y),
            (min_x, max_y),
            (min_x, min_y),
        ]
    }
}

/// A minimal ESRI float grid header for a 4x3 grid anchored at the lower-left corner.
pub const ESRI_HDR_4X3: &str = "ncols         4
nrows         3
xllcorner     -10.0
yllcorner     30.0
cellsize      0.5
NODATA_value  -9999
byteorder     LSBFIRST
";
