//! Winding-number point-in-polygon.
//!
//! Polygons may self-intersect; the closing edge from the last vertex back to
//! the first is implicit. A point is inside when the boundary winds around it
//! a non-zero number of times, so vertex order (clockwise or not) and the
//! starting vertex do not change membership.
//!
//! Boundary convention: a point lying exactly on an edge or a vertex is
//! outside.

use rayon::prelude::*;

/// Signed area test: > 0 when `point` is left of the directed edge `a -> b`,
/// < 0 when right, 0 when collinear.
#[inline]
fn is_left(a: (f64, f64), b: (f64, f64), point: (f64, f64)) -> f64 {
    (b.0 - a.0) * (point.1 - a.1) - (point.0 - a.0) * (b.1 - a.1)
}

#[inline]
fn on_segment(a: (f64, f64), b: (f64, f64), point: (f64, f64)) -> bool {
    is_left(a, b, point) == 0.0
        && point.0 >= a.0.min(b.0)
        && point.0 <= a.0.max(b.0)
        && point.1 >= a.1.min(b.1)
        && point.1 <= a.1.max(b.1)
}

/// Winding number of `vertices` around `(x, y)`.
///
/// Returns `None` when the point lies on the boundary.
pub fn winding_number(x: f64, y: f64, vertices: &[(f64, f64)]) -> Option<i32> {
    let point = (x, y);
    let n = vertices.len();
    let mut winding = 0;

    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];

        if on_segment(a, b, point) {
            return None;
        }

        if a.1 <= y {
            // upward crossing with the point on the left
            if b.1 > y && is_left(a, b, point) > 0.0 {
                winding += 1;
            }
        } else if b.1 <= y && is_left(a, b, point) < 0.0 {
            winding -= 1;
        }
    }

    Some(winding)
}

/// Point-in-polygon for a single point
pub fn point_in_polygon(x: f64, y: f64, vertices: &[(f64, f64)]) -> bool {
    if !x.is_finite() || !y.is_finite() || vertices.len() < 3 {
        return false;
    }

    winding_number(x, y, vertices).is_some_and(|winding| winding != 0)
}

/// Batch point-in-polygon query
pub fn points_in_polygon(vertices: &[(f64, f64)], points: &[(f64, f64)]) -> Vec<bool> {
    points
        .par_iter()
        .map(|&(x, y)| point_in_polygon(x, y, vertices))
        .collect()
}
