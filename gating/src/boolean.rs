//! Boolean gates combine already computed populations.
//!
//! References are [`PopulationKey`]s, so a boolean gate can point at any
//! population in the hierarchy, including single quadrants. Forward
//! references are allowed; the hierarchy orders evaluation so referenced
//! populations are computed first.

use crate::error::{GateError, Result};
use crate::results::GatingResults;
use crate::types::{GatePath, PopulationKey};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use strum_macros::{AsRefStr, Display, EnumString};

/// Boolean operator, parsed case-insensitively from `"and"`, `"or"`, `"not"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BooleanOp {
    And,
    Or,
    Not,
}

/// Reference from a boolean gate to another population
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GateRef {
    key: PopulationKey,
    complement: bool,
}

impl GateRef {
    pub fn new(name: impl Into<Arc<str>>, path: impl Into<GatePath>) -> Self {
        Self {
            key: PopulationKey::new(name, path),
            complement: false,
        }
    }

    /// Reference one quadrant of the quadrant gate `gate_name` at `path`
    pub fn quadrant(
        gate_name: impl Into<Arc<str>>,
        quadrant_id: impl Into<Arc<str>>,
        path: impl Into<GatePath>,
    ) -> Self {
        Self {
            key: PopulationKey::quadrant(gate_name, quadrant_id, path),
            complement: false,
        }
    }

    /// Use the complement of the referenced population
    pub fn complemented(mut self) -> Self {
        self.complement = true;
        self
    }

    pub fn key(&self) -> &PopulationKey {
        &self.key
    }

    pub fn is_complement(&self) -> bool {
        self.complement
    }
}

impl From<PopulationKey> for GateRef {
    fn from(key: PopulationKey) -> Self {
        Self {
            key,
            complement: false,
        }
    }
}

impl fmt::Display for GateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.complement {
            write!(f, "!{}", self.key)
        } else {
            write!(f, "{}", self.key)
        }
    }
}

/// Logical combination of other populations.
#[derive(Debug, Clone)]
pub struct BooleanGate {
    op: BooleanOp,
    refs: Vec<GateRef>,
}

impl BooleanGate {
    /// # Errors
    /// Returns `GateError::Validation` if a `not` gate does not have exactly
    /// one reference, or an `and`/`or` gate has none.
    pub fn new(op: BooleanOp, refs: Vec<GateRef>) -> Result<Self> {
        match op {
            BooleanOp::Not if refs.len() != 1 => {
                return Err(GateError::validation(format!(
                    "Boolean 'not' gates must reference exactly 1 gate, got {}",
                    refs.len()
                )));
            }
            BooleanOp::And | BooleanOp::Or if refs.is_empty() => {
                return Err(GateError::validation(format!(
                    "Boolean '{}' gates must reference at least 1 gate",
                    op
                )));
            }
            _ => {}
        }

        Ok(Self { op, refs })
    }

    /// Create a gate from a textual type such as `"AND"` or `"not"`
    pub fn from_type_str(bool_type: &str, refs: Vec<GateRef>) -> Result<Self> {
        let op = BooleanOp::from_str(bool_type).map_err(|_| {
            GateError::validation(format!("Unsupported boolean gate type '{}'", bool_type))
        })?;
        Self::new(op, refs)
    }

    pub fn op(&self) -> BooleanOp {
        self.op
    }

    pub fn refs(&self) -> &[GateRef] {
        &self.refs
    }

    /// Combine the ancestor-scoped membership of every reference.
    ///
    /// # Errors
    /// Returns `GateError::UncomputedReference` for a reference not yet in
    /// `results`.
    pub fn apply(&self, results: &GatingResults) -> Result<Vec<bool>> {
        let mut operands = self.refs.iter().map(|gate_ref| {
            results
                .membership(&gate_ref.key)
                .map(|membership| (membership, gate_ref.complement))
                .ok_or_else(|| GateError::uncomputed_reference(gate_ref.key.to_string()))
        });

        let (first, complement) = operands.next().ok_or_else(|| {
            GateError::validation("Boolean gate has no references")
        })??;
        let mut combined: Vec<bool> = first.iter().map(|&flag| flag ^ complement).collect();

        match self.op {
            BooleanOp::Not => combined.iter_mut().for_each(|flag| *flag = !*flag),
            BooleanOp::And => {
                for operand in operands {
                    let (membership, complement) = operand?;
                    for (acc, &flag) in combined.iter_mut().zip(membership) {
                        *acc &= flag ^ complement;
                    }
                }
            }
            BooleanOp::Or => {
                for operand in operands {
                    let (membership, complement) = operand?;
                    for (acc, &flag) in combined.iter_mut().zip(membership) {
                        *acc |= flag ^ complement;
                    }
                }
            }
        }

        Ok(combined)
    }
}
