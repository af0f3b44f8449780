use crate::boolean::BooleanGate;
use crate::ellipsoid::EllipsoidGate;
use crate::error::Result;
use crate::events::EventTable;
use crate::polygon::PolygonGate;
use crate::quadrant::{QuadrantGate, QuadrantMembership};
use crate::rectangle::RectangleGate;
use crate::results::GatingResults;
use crate::traits::*;
use std::fmt;
use std::sync::Arc;
use strum_macros::IntoStaticStr;

/// Sequence of ancestor population names, starting below the implicit root.
///
/// An empty path addresses the root level. Paths render as `/A/B`, and the
/// root renders as `/`.
///
/// # Example
///
/// ```rust
/// use flow_gating::GatePath;
///
/// let path = GatePath::from(["Lymphocytes", "Singlets"]);
/// assert_eq!(path.to_string(), "/Lymphocytes/Singlets");
/// assert_eq!(path.last(), Some("Singlets"));
/// assert_eq!(GatePath::parse("/Lymphocytes/Singlets"), path);
/// assert!(GatePath::root().is_root());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GatePath(Vec<Arc<str>>);

impl GatePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a `/`-separated path; empty segments are ignored
    pub fn parse(path: &str) -> Self {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .collect()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of ancestors below the root
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[Arc<str>] {
        &self.0
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(|name| name.as_ref())
    }

    /// Path without its last element, or `None` at the root
    pub fn parent(&self) -> Option<GatePath> {
        self.0
            .split_last()
            .map(|(_, prefix)| GatePath(prefix.to_vec()))
    }

    /// Path extended by one population name
    pub fn child(&self, name: impl Into<Arc<str>>) -> GatePath {
        let mut names = self.0.clone();
        names.push(name.into());
        GatePath(names)
    }
}

impl<S: Into<Arc<str>>> FromIterator<S> for GatePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<Arc<str>>, const N: usize> From<[S; N]> for GatePath {
    fn from(names: [S; N]) -> Self {
        names.into_iter().collect()
    }
}

impl<S: Into<Arc<str>>> From<Vec<S>> for GatePath {
    fn from(names: Vec<S>) -> Self {
        names.into_iter().collect()
    }
}

impl fmt::Display for GatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for name in &self.0 {
            write!(f, "/{}", name)?;
        }
        Ok(())
    }
}

/// Identity of one population: its name plus the path of its ancestors.
///
/// Gate names only need to be unique among siblings, so every lookup in the
/// hierarchy and result store goes through this composite key. Each quadrant
/// of a quadrant gate `Q` at path `P` is its own population keyed
/// `(quadrant_id, P/Q)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PopulationKey {
    pub name: Arc<str>,
    pub path: GatePath,
}

impl PopulationKey {
    pub fn new(name: impl Into<Arc<str>>, path: impl Into<GatePath>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Key for a population directly below the root
    pub fn root_level(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, GatePath::root())
    }

    /// Key of one quadrant of the quadrant gate `gate_name` registered at `path`
    pub fn quadrant(
        gate_name: impl Into<Arc<str>>,
        quadrant_id: impl Into<Arc<str>>,
        path: impl Into<GatePath>,
    ) -> Self {
        Self::new(quadrant_id, path.into().child(gate_name))
    }

    /// Path addressing this population's children
    pub fn full_path(&self) -> GatePath {
        self.path.child(self.name.clone())
    }

    /// Key of the population this one is gated from, `None` at the root level
    pub fn parent_key(&self) -> Option<PopulationKey> {
        let parent_name = self.path.last()?;
        let parent_path = self.path.parent()?;
        Some(PopulationKey::new(parent_name, parent_path))
    }
}

impl fmt::Display for PopulationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "/{}", self.name)
        } else {
            write!(f, "{}/{}", self.path, self.name)
        }
    }
}

/// Variant-specific part of a gate.
#[derive(Debug, Clone, IntoStaticStr)]
pub enum GateKind {
    #[strum(serialize = "RectangleGate")]
    Rectangle(RectangleGate),
    #[strum(serialize = "PolygonGate")]
    Polygon(PolygonGate),
    #[strum(serialize = "EllipsoidGate")]
    Ellipsoid(EllipsoidGate),
    #[strum(serialize = "QuadrantGate")]
    Quadrant(QuadrantGate),
    #[strum(serialize = "BooleanGate")]
    Boolean(BooleanGate),
}

impl From<RectangleGate> for GateKind {
    fn from(gate: RectangleGate) -> Self {
        Self::Rectangle(gate)
    }
}

impl From<PolygonGate> for GateKind {
    fn from(gate: PolygonGate) -> Self {
        Self::Polygon(gate)
    }
}

impl From<EllipsoidGate> for GateKind {
    fn from(gate: EllipsoidGate) -> Self {
        Self::Ellipsoid(gate)
    }
}

impl From<QuadrantGate> for GateKind {
    fn from(gate: QuadrantGate) -> Self {
        Self::Quadrant(gate)
    }
}

impl From<BooleanGate> for GateKind {
    fn from(gate: BooleanGate) -> Self {
        Self::Boolean(gate)
    }
}

/// Output of a single gate evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Membership {
    Single(Vec<bool>),
    Quadrants(QuadrantMembership),
}

/// A named gate with an optional parent population.
///
/// The variant parameters are validated by their own constructors; a `Gate`
/// only attaches a name and parent. Gate names must be unique among siblings,
/// not globally.
///
/// # Example
///
/// ```rust
/// use flow_gating::{Dimension, Gate, RectangleGate};
///
/// # fn example() -> flow_gating::Result<()> {
/// let range = RectangleGate::new(vec![
///     Dimension::new("FL2-H").with_range(Some(12.14748), None)?,
/// ])?;
/// let gate = Gate::new("Range1", range);
///
/// assert_eq!(gate.gate_type(), "RectangleGate");
/// assert_eq!(gate.to_string(), "RectangleGate(Range1, parent: None, dims: 1)");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Gate {
    name: Arc<str>,
    parent: Option<Arc<str>>,
    kind: GateKind,
}

impl Gate {
    /// Create a root-level gate
    pub fn new(name: impl Into<Arc<str>>, kind: impl Into<GateKind>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            kind: kind.into(),
        }
    }

    /// Set the parent population name
    pub fn with_parent(mut self, parent: impl Into<Arc<str>>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn kind(&self) -> &GateKind {
        &self.kind
    }

    /// Type name used in reports, e.g. `"PolygonGate"`
    pub fn gate_type(&self) -> &'static str {
        (&self.kind).into()
    }

    pub fn is_quadrant(&self) -> bool {
        matches!(self.kind, GateKind::Quadrant(_))
    }

    pub fn as_quadrant(&self) -> Option<&QuadrantGate> {
        match &self.kind {
            GateKind::Quadrant(gate) => Some(gate),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<&BooleanGate> {
        match &self.kind {
            GateKind::Boolean(gate) => Some(gate),
            _ => None,
        }
    }

    /// Evaluate the gate over every event.
    ///
    /// Geometric gates only read `events`; boolean gates only read the
    /// populations already stored in `results`. Neither sees the parent
    /// population: ancestor scoping happens in the hierarchy.
    pub fn apply(&self, events: &EventTable, results: &GatingResults) -> Result<Membership> {
        let membership = match &self.kind {
            GateKind::Rectangle(gate) => Membership::Single(gate.apply(events)?),
            GateKind::Polygon(gate) => Membership::Single(gate.apply(events)?),
            GateKind::Ellipsoid(gate) => Membership::Single(gate.apply(events)?),
            GateKind::Quadrant(gate) => Membership::Quadrants(gate.apply(events)?),
            GateKind::Boolean(gate) => Membership::Single(gate.apply(results)?),
        };
        Ok(membership)
    }

    /// Ranges with `min >= max`, for rectangle and quadrant gates
    pub fn inverted_ranges(&self) -> Vec<(&str, f64, f64)> {
        match &self.kind {
            GateKind::Rectangle(gate) => gate.inverted_ranges(),
            GateKind::Quadrant(gate) => gate.inverted_ranges(),
            _ => Vec::new(),
        }
    }
}

impl GateColumns for Gate {
    fn column_ids(&self) -> Vec<&str> {
        match &self.kind {
            GateKind::Rectangle(gate) => gate.column_ids(),
            GateKind::Polygon(gate) => gate.column_ids(),
            GateKind::Ellipsoid(gate) => gate.column_ids(),
            GateKind::Quadrant(gate) => gate.column_ids(),
            GateKind::Boolean(_) => Vec::new(),
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}, parent: {}, ",
            self.gate_type(),
            self.name,
            self.parent.as_deref().unwrap_or("None")
        )?;
        match &self.kind {
            GateKind::Rectangle(gate) => write!(f, "dims: {})", gate.dimensions().len()),
            GateKind::Polygon(gate) => write!(f, "vertices: {})", gate.vertices().len()),
            GateKind::Ellipsoid(gate) => write!(f, "coords: {:?})", gate.coordinates()),
            GateKind::Quadrant(gate) => write!(f, "quadrants: {})", gate.quadrants().len()),
            GateKind::Boolean(gate) => write!(f, "type: {})", gate.op()),
        }
    }
}
