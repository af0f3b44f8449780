use super::dimension::Dimension;
use super::error::{GateError, Result};
use super::events::EventTable;
use super::geometry::Mahalanobis;
use super::traits::*;
use ndarray::{Array1, Array2};

/// N-dimensional ellipsoid gate (N >= 2).
///
/// Defined by a center, a covariance matrix and the square of the Mahalanobis
/// distance marking the boundary. The covariance is inverted once here, so a
/// singular matrix fails construction rather than evaluation.
#[derive(Debug, Clone)]
pub struct EllipsoidGate {
    dimensions: Vec<Dimension>,
    coordinates: Vec<f64>,
    covariance: Array2<f64>,
    mahalanobis: Mahalanobis,
}

impl EllipsoidGate {
    /// # Errors
    /// - `GateError::Validation` for fewer than 2 coordinates, a dimension count
    ///   that differs from the coordinate count, or a covariance whose rows do
    ///   not each hold one entry per coordinate
    /// - `GateError::Numerical` if the covariance cannot be inverted
    pub fn new(
        dimensions: Vec<Dimension>,
        coordinates: Vec<f64>,
        covariance_matrix: Vec<Vec<f64>>,
        distance_square: f64,
    ) -> Result<Self> {
        let n = coordinates.len();
        if n < 2 {
            return Err(GateError::validation(
                "Ellipsoids must have at least 2 dimensions",
            ));
        }
        if dimensions.len() != n {
            return Err(GateError::validation(format!(
                "Ellipsoid has {} dimensions but {} center coordinates",
                dimensions.len(),
                n
            )));
        }
        if covariance_matrix.len() != n || covariance_matrix.iter().any(|row| row.len() != n) {
            return Err(GateError::validation(
                "Covariance row entry value count must match # of dimensions",
            ));
        }

        let covariance = Array2::from_shape_vec((n, n), covariance_matrix.concat())
            .map_err(|e| GateError::validation(format!("Invalid covariance matrix: {}", e)))?;
        let mahalanobis =
            Mahalanobis::new(&covariance, Array1::from(coordinates.clone()), distance_square)?;

        Ok(Self {
            dimensions,
            coordinates,
            covariance,
            mahalanobis,
        })
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Center of the ellipsoid, one value per dimension
    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    pub fn covariance_matrix(&self) -> &Array2<f64> {
        &self.covariance
    }

    pub fn distance_square(&self) -> f64 {
        self.mahalanobis.threshold()
    }
}

impl EventPredicate for EllipsoidGate {
    fn apply(&self, events: &EventTable) -> Result<Vec<bool>> {
        let points = events
            .points(&self.column_ids())
            .map_err(|e| e.with_context("ellipsoid gate"))?;

        Ok(self.mahalanobis.contains_rows(&points))
    }
}

impl GateColumns for EllipsoidGate {
    fn column_ids(&self) -> Vec<&str> {
        self.dimensions.iter().map(Dimension::column_id).collect()
    }
}
