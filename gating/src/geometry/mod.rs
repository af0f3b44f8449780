//! Stateless membership predicates shared by the gate types.
//!
//! Every predicate takes column data and returns one `bool` per event. The
//! per-event loops fan out over rayon's pool, but the functions themselves
//! hold no state and never fail per point.

pub mod ellipsoid;
pub mod interval;
pub mod polygon;

pub use ellipsoid::{Mahalanobis, points_in_ellipsoid};
pub use interval::{in_interval, interval_test};
pub use polygon::{point_in_polygon, points_in_polygon, winding_number};

/// AND `other` into `mask` elementwise
pub fn and_assign(mask: &mut [bool], other: &[bool]) {
    debug_assert_eq!(mask.len(), other.len());
    for (acc, &value) in mask.iter_mut().zip(other) {
        *acc &= value;
    }
}

/// Count `true` entries
pub fn count_true(mask: &[bool]) -> usize {
    mask.iter().filter(|&&inside| inside).count()
}
