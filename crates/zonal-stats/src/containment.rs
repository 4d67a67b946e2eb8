//! Point-in-polygon testing.
//!
//! Even-odd rule over every ring of a region at once: each ring boundary
//! crossed by a horizontal ray from the point toggles inside/outside. An
//! exterior ring therefore adds area and a hole nested inside it removes
//! area, and disjoint parts of a multi-polygon each add their own area.
//!
//! Points lying exactly on any ring edge (exterior or hole) count as
//! inside. The on-edge test is exact, with no tolerance, so results are
//! reproducible across runs and platforms.

use crate::region::Ring;

/// Even-odd containment of `(x, y)` in the union of `rings`, boundary inclusive.
pub fn contains_point<'a, I>(rings: I, x: f64, y: f64) -> bool
where
    I: IntoIterator<Item = &'a Ring>,
{
    let mut inside = false;

    for ring in rings {
        for (a, b) in ring.edges() {
            if on_segment(a, b, x, y) {
                return true;
            }

            // Half-open rule on y so a vertex shared by two edges is
            // counted once.
            if (a.1 > y) != (b.1 > y) {
                let x_cross = a.0 + (y - a.1) * (b.0 - a.0) / (b.1 - a.1);
                if x < x_cross {
                    inside = !inside;
                }
            }
        }
    }

    inside
}

/// True if `(x, y)` lies on the closed segment `a`–`b`.
#[inline]
fn on_segment(a: (f64, f64), b: (f64, f64), x: f64, y: f64) -> bool {
    if x < a.0.min(b.0) || x > a.0.max(b.0) || y < a.1.min(b.1) || y > a.1.max(b.1) {
        return false;
    }
    let cross = (b.0 - a.0) * (y - a.1) - (b.1 - a.1) * (x - a.0);
    cross == 0.0
}
