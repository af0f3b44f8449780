//! Quadrant gates: one gate, several labeled output regions.
//!
//! Despite the name a quadrant gate can split the plane (or a single axis)
//! into any number of regions. Each [`Quadrant`] picks a range along some of
//! the gate's [`Divider`]s; the divider only contributes its column binding.
//! Regions are not checked for overlap or coverage.

use crate::dimension::{Divider, check_finite_bound};
use crate::error::{GateError, Result};
use crate::events::EventTable;
use crate::geometry::{and_assign, interval_test};
use crate::traits::{GateColumns, GateRanges};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::sync::Arc;

/// Per-quadrant membership in declared quadrant order
pub type QuadrantMembership = Vec<(Arc<str>, Vec<bool>)>;

/// One labeled region of a quadrant gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Quadrant {
    id: Arc<str>,
    /// `(divider id, min, max)` in declared order
    ranges: Vec<(Arc<str>, Option<f64>, Option<f64>)>,
}

impl Quadrant {
    /// Create a quadrant from parallel lists of divider references and ranges.
    ///
    /// # Errors
    /// Returns `GateError::Validation` if the lists differ in length, a
    /// divider is referenced twice, or a bound is not finite.
    pub fn new<S: Into<Arc<str>>>(
        id: impl Into<Arc<str>>,
        divider_refs: Vec<S>,
        divider_ranges: Vec<(Option<f64>, Option<f64>)>,
    ) -> Result<Self> {
        let id = id.into();

        if divider_refs.len() != divider_ranges.len() {
            return Err(GateError::validation(format!(
                "Quadrant '{}': a min/max range must be specified for each divider reference ({} refs, {} ranges)",
                id,
                divider_refs.len(),
                divider_ranges.len()
            )));
        }

        let mut seen = FxHashSet::default();
        let mut ranges = Vec::with_capacity(divider_refs.len());

        for (divider_ref, (min, max)) in divider_refs.into_iter().zip(divider_ranges) {
            let divider_ref: Arc<str> = divider_ref.into();
            if !seen.insert(divider_ref.clone()) {
                return Err(GateError::validation(format!(
                    "Quadrant '{}' references divider '{}' more than once",
                    id, divider_ref
                )));
            }
            check_finite_bound(min, "min", &divider_ref)?;
            check_finite_bound(max, "max", &divider_ref)?;
            ranges.push((divider_ref, min, max));
        }

        Ok(Self { id, ranges })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn divider_refs(&self) -> impl Iterator<Item = &str> {
        self.ranges.iter().map(|(divider_ref, _, _)| divider_ref.as_ref())
    }

    /// Range for one divider, or `None` if this quadrant does not use it
    pub fn divider_range(&self, divider_ref: &str) -> Option<(Option<f64>, Option<f64>)> {
        self.ranges
            .iter()
            .find(|(id, _, _)| id.as_ref() == divider_ref)
            .map(|&(_, min, max)| (min, max))
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quadrant({}, dividers: {})", self.id, self.ranges.len())
    }
}

/// Multi-output gate over one or more dividers.
#[derive(Debug, Clone)]
pub struct QuadrantGate {
    dividers: Vec<Divider>,
    quadrants: Vec<Quadrant>,
}

impl QuadrantGate {
    /// # Errors
    /// Returns `GateError::Validation` if there are no dividers or quadrants,
    /// divider or quadrant ids repeat, or a quadrant references a divider that
    /// is not part of this gate.
    pub fn new(dividers: Vec<Divider>, quadrants: Vec<Quadrant>) -> Result<Self> {
        if dividers.is_empty() {
            return Err(GateError::validation(
                "Quadrant gates must have at least 1 divider",
            ));
        }
        if quadrants.is_empty() {
            return Err(GateError::validation(
                "Quadrant gates must define at least 1 quadrant",
            ));
        }

        let mut divider_ids = FxHashSet::default();
        for divider in &dividers {
            if !divider_ids.insert(divider.id()) {
                return Err(GateError::validation(format!(
                    "Duplicate divider id '{}'",
                    divider.id()
                )));
            }
        }

        let mut quadrant_ids = FxHashSet::default();
        for quadrant in &quadrants {
            if !quadrant_ids.insert(quadrant.id()) {
                return Err(GateError::validation(format!(
                    "Duplicate quadrant id '{}'",
                    quadrant.id()
                )));
            }
            if let Some(unknown) = quadrant
                .divider_refs()
                .find(|divider_ref| !divider_ids.contains(divider_ref))
            {
                return Err(GateError::validation(format!(
                    "Quadrant '{}' references undefined divider '{}'",
                    quadrant.id(),
                    unknown
                )));
            }
        }

        Ok(Self {
            dividers,
            quadrants,
        })
    }

    pub fn dividers(&self) -> &[Divider] {
        &self.dividers
    }

    pub fn quadrants(&self) -> &[Quadrant] {
        &self.quadrants
    }

    pub fn quadrant(&self, quadrant_id: &str) -> Option<&Quadrant> {
        self.quadrants.iter().find(|q| q.id() == quadrant_id)
    }

    pub fn quadrant_ids(&self) -> impl Iterator<Item = &str> {
        self.quadrants.iter().map(Quadrant::id)
    }

    fn divider(&self, divider_id: &str) -> Option<&Divider> {
        self.dividers.iter().find(|d| d.id() == divider_id)
    }

    /// Evaluate every quadrant over the full table.
    ///
    /// Each divider column is read once and shared by all quadrants.
    pub fn apply(&self, events: &EventTable) -> Result<QuadrantMembership> {
        let mut columns: FxHashMap<&str, Vec<f64>> = FxHashMap::default();
        for divider in &self.dividers {
            let values = events
                .column_values(divider.dimension_ref())
                .map_err(|e| e.with_context(format!("quadrant divider '{}'", divider.id())))?;
            columns.insert(divider.id(), values);
        }

        let mut results = Vec::with_capacity(self.quadrants.len());
        for quadrant in &self.quadrants {
            let mut membership = vec![true; events.event_count()];
            for (divider_ref, min, max) in &quadrant.ranges {
                let values = columns.get(divider_ref.as_ref()).ok_or_else(|| {
                    GateError::validation(format!("Unknown divider '{}'", divider_ref))
                })?;
                and_assign(&mut membership, &interval_test(values, *min, *max));
            }
            results.push((quadrant.id.clone(), membership));
        }

        Ok(results)
    }
}

impl GateColumns for QuadrantGate {
    fn column_ids(&self) -> Vec<&str> {
        self.dividers.iter().map(Divider::dimension_ref).collect()
    }
}

impl GateRanges for QuadrantGate {
    fn ranges(&self) -> Vec<(&str, Option<f64>, Option<f64>)> {
        self.quadrants
            .iter()
            .flat_map(|quadrant| {
                quadrant.ranges.iter().filter_map(|(divider_ref, min, max)| {
                    self.divider(divider_ref)
                        .map(|divider| (divider.dimension_ref(), *min, *max))
                })
            })
            .collect()
    }
}
