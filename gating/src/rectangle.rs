use super::dimension::Dimension;
use super::error::{GateError, Result};
use super::events::EventTable;
use super::geometry::{and_assign, interval_test};
use super::traits::*;

/// Axis-aligned range, rectangle, box or hyper-rectangle gate.
///
/// Membership is the conjunction of each dimension's half-open interval test
/// (`>= min`, `< max`). A dimension without bounds adds no constraint, but its
/// column must still exist in the event table.
#[derive(Debug, Clone)]
pub struct RectangleGate {
    dimensions: Vec<Dimension>,
}

impl RectangleGate {
    /// # Errors
    /// Returns `GateError::Validation` when no dimensions are given.
    pub fn new(dimensions: Vec<Dimension>) -> Result<Self> {
        if dimensions.is_empty() {
            return Err(GateError::validation(
                "Rectangle gate requires at least 1 dimension",
            ));
        }

        Ok(Self { dimensions })
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }
}

impl EventPredicate for RectangleGate {
    fn apply(&self, events: &EventTable) -> Result<Vec<bool>> {
        let mut membership = vec![true; events.event_count()];

        for dim in &self.dimensions {
            let column_id = dim.column_id();

            if dim.is_unbounded() {
                if !events.has_column(column_id) {
                    return Err(GateError::missing_column(column_id, "rectangle gate"));
                }
                continue;
            }

            let values = events
                .column_values(column_id)
                .map_err(|e| e.with_context("rectangle gate"))?;
            and_assign(&mut membership, &interval_test(&values, dim.min(), dim.max()));
        }

        Ok(membership)
    }
}

impl GateColumns for RectangleGate {
    fn column_ids(&self) -> Vec<&str> {
        self.dimensions.iter().map(Dimension::column_id).collect()
    }
}

impl GateRanges for RectangleGate {
    fn ranges(&self) -> Vec<(&str, Option<f64>, Option<f64>)> {
        self.dimensions
            .iter()
            .filter(|dim| !dim.is_unbounded())
            .map(|dim| (dim.column_id(), dim.min(), dim.max()))
            .collect()
    }
}
