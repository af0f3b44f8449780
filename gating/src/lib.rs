//! # flow-gating
//!
//! A gate-hierarchy evaluation engine for flow cytometry event tables.
//!
//! Events arrive as a columnar table (one row per event, one numeric column
//! per channel), already compensated and transformed. This library classifies
//! every event against a tree of gates and reports per-population membership
//! and counts.
//!
//! ## Overview
//!
//! - **Gate Types**: Rectangle (range/box), Polygon, Ellipsoid, Quadrant and
//!   Boolean gates
//! - **Dimensions**: Gates bind to event columns through [`Dimension`]s
//!   (channel or ratio references) and quadrant [`Divider`]s
//! - **Hierarchies**: Parent-child gating with ancestor scoping, boolean
//!   cross-references anywhere in the tree, cycle detection
//! - **Reports**: Per-population counts as rows or a polars `DataFrame`
//! - **Batch Evaluation**: One immutable hierarchy gates many samples in
//!   parallel
//!
//! ## Quick Start
//!
//! ```rust
//! use flow_gating::*;
//!
//! # fn example() -> flow_gating::Result<()> {
//! let lymphocytes = PolygonGate::new(
//!     vec![Dimension::new("FSC-A"), Dimension::new("SSC-A")],
//!     vec![(100.0, 200.0), (300.0, 200.0), (300.0, 400.0), (100.0, 400.0)],
//! )?;
//! let cd4 = RectangleGate::new(vec![
//!     Dimension::new("CD4").with_range(Some(2.5), None)?,
//! ])?;
//!
//! let mut builder = GatingHierarchyBuilder::new();
//! builder.add_gate(Gate::new("Lymphocytes", lymphocytes), GatePath::root())?;
//! builder.add_gate(
//!     Gate::new("CD4+", cd4).with_parent("Lymphocytes"),
//!     ["Lymphocytes"],
//! )?;
//! let hierarchy = builder.build()?;
//!
//! let events = EventTable::from_columns([
//!     ("FSC-A", vec![150.0, 250.0, 500.0]),
//!     ("SSC-A", vec![300.0, 250.0, 300.0]),
//!     ("CD4", vec![3.0, 1.0, 3.0]),
//! ])?;
//!
//! let results = hierarchy.evaluate(&events)?;
//! let report = results.report("sample-1");
//! assert_eq!(report.find("sample-1", "/Lymphocytes", "CD4+").map(|row| row.count), Some(1));
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Populations
//!
//! Gate names only need to be unique among siblings. Every population is
//! addressed by a [`PopulationKey`]: its name plus the [`GatePath`] of its
//! ancestors. Each quadrant of a quadrant gate is its own population, keyed
//! below the quadrant gate.
//!
//! ### Scoping
//!
//! A gate's own membership ignores its parent. The hierarchy ANDs it with the
//! parent population, so stored counts always reflect the full path.
//!
//! ## Error Handling
//!
//! The library uses [`GateError`] for all error conditions. Most operations return
//! [`Result<T>`](Result).

pub mod boolean;
pub mod config;
pub mod dimension;
pub mod ellipsoid;
pub mod error;
pub mod events;
pub mod geometry;
pub mod hierarchy;
pub mod polygon;
pub mod quadrant;
pub mod rectangle;
pub mod results;
pub mod traits;
pub mod types;

#[cfg(test)]
mod traits_tests;

/// Error types for gate operations
pub use error::{GateError, Result};

/// Gate parameters
pub use dimension::{Dimension, DimensionId, Divider};

/// Event input
pub use events::EventTable;

/// Gate variants
pub use boolean::{BooleanGate, BooleanOp, GateRef};
pub use ellipsoid::EllipsoidGate;
pub use polygon::PolygonGate;
pub use quadrant::{Quadrant, QuadrantGate, QuadrantMembership};
pub use rectangle::RectangleGate;

/// Core gate types and structures
pub use types::{Gate, GateKind, GatePath, Membership, PopulationKey};

/// Gate hierarchy management
pub use config::{GatingConfig, GatingConfigBuilder};
pub use hierarchy::{GatingHierarchy, GatingHierarchyBuilder};

/// Evaluation results and reports
pub use results::{GatingReport, GatingResults, PopulationInfo, PopulationResult, ReportRow};

/// Gate traits
pub use traits::{EventPredicate, GateColumns, GateRanges};
