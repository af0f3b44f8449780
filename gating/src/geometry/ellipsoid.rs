//! Mahalanobis-distance ellipsoid membership.
//!
//! A point `p` is inside when `(p - c)ᵗ · S⁻¹ · (p - c) <= distance_square`,
//! where `c` is the center and `S` the covariance matrix. The inverse is
//! computed once with ndarray-linalg and reused for every event.

use crate::error::{GateError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use ndarray_linalg::Inverse;
use rayon::prelude::*;

/// Pre-inverted covariance plus center and threshold.
#[derive(Debug, Clone)]
pub struct Mahalanobis {
    center: Array1<f64>,
    inverse: Array2<f64>,
    distance_square: f64,
}

impl Mahalanobis {
    /// Invert `covariance` and validate shapes.
    ///
    /// # Errors
    /// - `GateError::Validation` if the matrix is not square, its size differs
    ///   from the center length, or the threshold is not finite
    /// - `GateError::Numerical` if the matrix is singular
    pub fn new(
        covariance: &Array2<f64>,
        center: Array1<f64>,
        distance_square: f64,
    ) -> Result<Self> {
        let (rows, cols) = covariance.dim();
        if rows != cols {
            return Err(GateError::validation(format!(
                "Covariance matrix must be square, got {}x{}",
                rows, cols
            )));
        }
        if rows != center.len() {
            return Err(GateError::validation(format!(
                "Covariance matrix size {} does not match {} center coordinates",
                rows,
                center.len()
            )));
        }
        if !distance_square.is_finite() {
            return Err(GateError::validation(format!(
                "Distance square must be finite, got {}",
                distance_square
            )));
        }
        if covariance.iter().chain(center.iter()).any(|v| !v.is_finite()) {
            return Err(GateError::validation(
                "Covariance matrix and center must be finite",
            ));
        }

        let inverse = covariance
            .inv()
            .map_err(|e| GateError::numerical(format!("Failed to invert covariance matrix: {:?}", e)))?;

        if inverse.iter().any(|v| !v.is_finite()) {
            return Err(GateError::numerical("Covariance matrix is singular"));
        }

        Ok(Self {
            center,
            inverse,
            distance_square,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.distance_square
    }

    /// Squared Mahalanobis distance of one point from the center
    pub fn distance_square(&self, point: ArrayView1<'_, f64>) -> f64 {
        let diff = &point - &self.center;
        diff.dot(&self.inverse.dot(&diff))
    }

    /// Membership for one point; NaN coordinates are outside
    pub fn contains(&self, point: ArrayView1<'_, f64>) -> bool {
        self.distance_square(point) <= self.distance_square
    }

    /// Membership for every row of an `events × dimensions` matrix
    pub fn contains_rows(&self, points: &Array2<f64>) -> Vec<bool> {
        (0..points.nrows())
            .into_par_iter()
            .map(|row| self.contains(points.row(row)))
            .collect()
    }
}

/// Batch point-in-ellipsoid query.
///
/// `points` holds one event per row with columns in the same order as
/// `center`.
pub fn points_in_ellipsoid(
    covariance: &Array2<f64>,
    center: &[f64],
    distance_square: f64,
    points: &Array2<f64>,
) -> Result<Vec<bool>> {
    let mahalanobis = Mahalanobis::new(covariance, Array1::from(center.to_vec()), distance_square)?;

    if points.ncols() != center.len() {
        return Err(GateError::validation(format!(
            "Points have {} columns but the ellipsoid has {} dimensions",
            points.ncols(),
            center.len()
        )));
    }

    Ok(mahalanobis.contains_rows(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_identity_covariance_is_euclidean() {
        let covariance = array![[1.0, 0.0], [0.0, 1.0]];
        let points = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.5], [3.0, 4.0]];

        let results = points_in_ellipsoid(&covariance, &[0.0, 0.0], 1.0, &points).unwrap();
        assert_eq!(results, vec![true, true, false, false]);
    }

    #[test]
    fn test_distance_square_values() {
        let covariance = array![[4.0, 0.0], [0.0, 9.0]];
        let mahalanobis = Mahalanobis::new(&covariance, array![1.0, 1.0], 1.0).unwrap();

        let point = array![3.0, 4.0];
        // (2/2)^2 + (3/3)^2
        assert_relative_eq!(mahalanobis.distance_square(point.view()), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_center_always_inside() {
        let covariance = array![[2.0, 0.3, 0.1], [0.3, 1.0, 0.2], [0.1, 0.2, 3.0]];
        let center = [5.0, -2.0, 7.5];
        let points = array![[5.0, -2.0, 7.5]];

        for threshold in [1e-9, 0.5, 100.0] {
            let results = points_in_ellipsoid(&covariance, &center, threshold, &points).unwrap();
            assert_eq!(results, vec![true]);
        }
    }

    #[test]
    fn test_correlated_covariance() {
        let covariance = array![[1.0, 0.8], [0.8, 1.0]];
        let points = array![[1.0, 1.0], [1.0, -1.0]];

        // Along the correlation axis the point is close, across it far away
        let results = points_in_ellipsoid(&covariance, &[0.0, 0.0], 2.0, &points).unwrap();
        assert_eq!(results, vec![true, false]);
    }

    #[test]
    fn test_singular_covariance() {
        let covariance = array![[1.0, 2.0], [2.0, 4.0]];
        let err = Mahalanobis::new(&covariance, array![0.0, 0.0], 1.0).unwrap_err();
        assert!(matches!(err, GateError::Numerical { .. }));
    }

    #[test]
    fn test_shape_mismatch() {
        let covariance = array![[1.0, 0.0], [0.0, 1.0]];
        let err = Mahalanobis::new(&covariance, array![0.0, 0.0, 0.0], 1.0).unwrap_err();
        assert!(matches!(err, GateError::Validation { .. }));

        let rectangular = Array2::<f64>::zeros((2, 3));
        assert!(Mahalanobis::new(&rectangular, array![0.0, 0.0], 1.0).is_err());
    }

    #[test]
    fn test_nan_point_outside() {
        let covariance = array![[1.0, 0.0], [0.0, 1.0]];
        let points = array![[f64::NAN, 0.0]];
        let results = points_in_ellipsoid(&covariance, &[0.0, 0.0], 1.0, &points).unwrap();
        assert_eq!(results, vec![false]);
    }
}
