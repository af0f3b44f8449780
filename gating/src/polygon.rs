use super::dimension::Dimension;
use super::error::{GateError, Result};
use super::events::EventTable;
use super::geometry::points_in_polygon;
use super::traits::*;

/// Two-dimensional polygon gate.
///
/// Vertices are `(x, y)` pairs in the same order as the two dimensions.
/// Membership uses the winding-number rule, so self-intersecting outlines are
/// allowed; points exactly on an edge are outside.
#[derive(Debug, Clone)]
pub struct PolygonGate {
    dimensions: [Dimension; 2],
    vertices: Vec<(f64, f64)>,
}

impl PolygonGate {
    /// # Errors
    /// Returns `GateError::Validation` if there are not exactly 2 dimensions,
    /// fewer than 3 vertices, or a vertex coordinate is not finite.
    pub fn new(dimensions: Vec<Dimension>, vertices: Vec<(f64, f64)>) -> Result<Self> {
        let dimensions: [Dimension; 2] = dimensions.try_into().map_err(|dims: Vec<Dimension>| {
            GateError::validation(format!(
                "Polygon gate requires exactly 2 dimensions, got {}",
                dims.len()
            ))
        })?;

        if vertices.len() < 3 {
            return Err(GateError::validation(format!(
                "Polygon requires at least 3 vertices, got {}",
                vertices.len()
            )));
        }

        if let Some(idx) = vertices
            .iter()
            .position(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(GateError::validation(format!(
                "Polygon vertex {} has a non-finite coordinate",
                idx
            )));
        }

        Ok(Self {
            dimensions,
            vertices,
        })
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }
}

impl EventPredicate for PolygonGate {
    fn apply(&self, events: &EventTable) -> Result<Vec<bool>> {
        let [x_dim, y_dim] = &self.dimensions;
        let points = events
            .xy_pairs(x_dim.column_id(), y_dim.column_id())
            .map_err(|e| e.with_context("polygon gate"))?;

        Ok(points_in_polygon(&self.vertices, &points))
    }
}

impl GateColumns for PolygonGate {
    fn column_ids(&self) -> Vec<&str> {
        self.dimensions.iter().map(Dimension::column_id).collect()
    }
}
