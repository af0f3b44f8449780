//! Bindings between gate parameters and event table columns.
//!
//! A [`Dimension`] names one axis of a gate. It points either at a channel
//! column directly or at a pre-computed ratio column, and may carry the
//! half-open range a rectangle gate tests against. Compensation and transform
//! references are provenance only: by the time gates run, the event table is
//! already compensated and transformed.
//!
//! A [`Divider`] is the quadrant-gate counterpart: a named cut along one column.

use crate::error::{GateError, Result};
use std::fmt;
use std::sync::Arc;

/// The column a dimension resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DimensionId {
    /// A channel label, e.g. `FL2-H`
    Label(Arc<str>),
    /// A derived ratio column, referenced by its transform id
    Ratio(Arc<str>),
}

impl DimensionId {
    /// Column identifier in the event table
    pub fn column_id(&self) -> &str {
        match self {
            DimensionId::Label(label) => label.as_ref(),
            DimensionId::Ratio(ratio_ref) => ratio_ref.as_ref(),
        }
    }
}

/// One axis of a gate, optionally bounded.
///
/// # Example
///
/// ```rust
/// use flow_gating::Dimension;
///
/// let dim = Dimension::new("FL2-H")
///     .with_compensation_ref("FCS")
///     .with_range(Some(0.5), Some(2.0))?;
///
/// assert_eq!(dim.column_id(), "FL2-H");
/// assert_eq!(dim.min(), Some(0.5));
/// assert_eq!(dim.to_string(), "Dimension(id: FL2-H)");
/// # Ok::<(), flow_gating::GateError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    id: DimensionId,
    compensation_ref: Option<Arc<str>>,
    transformation_ref: Option<Arc<str>>,
    min: Option<f64>,
    max: Option<f64>,
}

impl Dimension {
    /// Dimension bound directly to a channel label
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self::from_id(DimensionId::Label(label.into()))
    }

    /// Dimension bound to a derived ratio column
    pub fn ratio(ratio_ref: impl Into<Arc<str>>) -> Self {
        Self::from_id(DimensionId::Ratio(ratio_ref.into()))
    }

    fn from_id(id: DimensionId) -> Self {
        Self {
            id,
            compensation_ref: None,
            transformation_ref: None,
            min: None,
            max: None,
        }
    }

    /// Record the compensation this column went through
    pub fn with_compensation_ref(mut self, compensation_ref: impl Into<Arc<str>>) -> Self {
        self.compensation_ref = Some(compensation_ref.into());
        self
    }

    /// Record the transform this column went through
    pub fn with_transformation_ref(mut self, transformation_ref: impl Into<Arc<str>>) -> Self {
        self.transformation_ref = Some(transformation_ref.into());
        self
    }

    /// Set the range tested by rectangle gates.
    ///
    /// `min` is inclusive, `max` exclusive. Inverted ranges are accepted here;
    /// `GatingConfig::strict_ranges` rejects them at hierarchy build.
    ///
    /// # Errors
    /// Returns `GateError::Validation` if a bound is NaN or infinite.
    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Result<Self> {
        check_finite_bound(min, "min", self.column_id())?;
        check_finite_bound(max, "max", self.column_id())?;
        self.min = min;
        self.max = max;
        Ok(self)
    }

    pub fn id(&self) -> &DimensionId {
        &self.id
    }

    /// Column identifier in the event table
    pub fn column_id(&self) -> &str {
        self.id.column_id()
    }

    pub fn is_ratio(&self) -> bool {
        matches!(self.id, DimensionId::Ratio(_))
    }

    pub fn compensation_ref(&self) -> Option<&str> {
        self.compensation_ref.as_deref()
    }

    pub fn transformation_ref(&self) -> Option<&str> {
        self.transformation_ref.as_deref()
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// True when neither bound is set
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            DimensionId::Label(label) => write!(f, "Dimension(id: {})", label),
            DimensionId::Ratio(ratio_ref) => {
                write!(f, "RatioDimension(ratio_reference: {})", ratio_ref)
            }
        }
    }
}

/// A single-axis cut used by quadrant gates.
///
/// The divider supplies the column binding; each quadrant carries its own
/// bounds for the divider, so `values` are kept for reference only.
#[derive(Debug, Clone, PartialEq)]
pub struct Divider {
    id: Arc<str>,
    dimension_ref: Arc<str>,
    compensation_ref: Option<Arc<str>>,
    transformation_ref: Option<Arc<str>>,
    values: Vec<f64>,
}

impl Divider {
    /// Create a divider on `dimension_ref` cutting at `values`.
    ///
    /// # Errors
    /// Returns `GateError::Validation` if any cut value is not finite.
    pub fn new(
        id: impl Into<Arc<str>>,
        dimension_ref: impl Into<Arc<str>>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let id = id.into();
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(GateError::validation(format!(
                "divider '{}' has non-finite value {}",
                id, bad
            )));
        }

        Ok(Self {
            id,
            dimension_ref: dimension_ref.into(),
            compensation_ref: None,
            transformation_ref: None,
            values,
        })
    }

    pub fn with_compensation_ref(mut self, compensation_ref: impl Into<Arc<str>>) -> Self {
        self.compensation_ref = Some(compensation_ref.into());
        self
    }

    pub fn with_transformation_ref(mut self, transformation_ref: impl Into<Arc<str>>) -> Self {
        self.transformation_ref = Some(transformation_ref.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Column identifier this divider cuts along
    pub fn dimension_ref(&self) -> &str {
        &self.dimension_ref
    }

    pub fn compensation_ref(&self) -> Option<&str> {
        self.compensation_ref.as_deref()
    }

    pub fn transformation_ref(&self) -> Option<&str> {
        self.transformation_ref.as_deref()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl fmt::Display for Divider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QuadrantDivider(id: {}, dim_ref: {})",
            self.id, self.dimension_ref
        )
    }
}

pub(crate) fn check_finite_bound(bound: Option<f64>, side: &str, owner: &str) -> Result<()> {
    match bound {
        Some(value) if !value.is_finite() => Err(GateError::validation(format!(
            "{} bound for '{}' must be finite, got {}",
            side, owner, value
        ))),
        _ => Ok(()),
    }
}
