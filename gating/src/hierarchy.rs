use crate::config::GatingConfig;
use crate::error::{GateError, Result};
use crate::events::EventTable;
use crate::geometry::and_assign;
use crate::results::{GatingResults, PopulationInfo};
use crate::traits::GateColumns;
use crate::types::{Gate, GatePath, Membership, PopulationKey};
use itertools::Itertools;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A registered gate together with the path it was registered under
#[derive(Debug, Clone)]
struct GateEntry {
    key: PopulationKey,
    gate: Gate,
}

/// Which gate produces a population
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Producer {
    /// The gate's own population
    Gate(usize),
    /// One quadrant of a quadrant gate
    Quadrant(usize),
}

impl Producer {
    fn index(self) -> usize {
        match self {
            Producer::Gate(idx) | Producer::Quadrant(idx) => idx,
        }
    }
}

/// Mutable collection of gates, turned into a [`GatingHierarchy`] by
/// [`build`](Self::build).
///
/// Gates are registered under the path of their parent population, which
/// must already be registered. Boolean gates may reference populations that
/// are added later; references are resolved at build time.
///
/// # Example
///
/// ```rust
/// use flow_gating::*;
///
/// # fn example() -> flow_gating::Result<()> {
/// let lymph = RectangleGate::new(vec![
///     Dimension::new("FSC-A").with_range(Some(100.0), Some(900.0))?,
/// ])?;
/// let cd3 = RectangleGate::new(vec![
///     Dimension::new("CD3").with_range(Some(1.0), None)?,
/// ])?;
///
/// let mut builder = GatingHierarchyBuilder::new();
/// builder.add_gate(Gate::new("Lymph", lymph), GatePath::root())?;
/// builder.add_gate(Gate::new("CD3+", cd3).with_parent("Lymph"), ["Lymph"])?;
/// let hierarchy = builder.build()?;
///
/// let events = EventTable::from_columns([
///     ("FSC-A", vec![50.0, 150.0, 500.0]),
///     ("CD3", vec![5.0, 0.5, 2.0]),
/// ])?;
/// let results = hierarchy.evaluate(&events)?;
/// assert_eq!(results.count(&PopulationKey::new("CD3+", ["Lymph"])), Some(1));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct GatingHierarchyBuilder {
    config: GatingConfig,
    nodes: Vec<GateEntry>,
    populations: FxHashMap<PopulationKey, Producer>,
}

impl GatingHierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GatingConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn gate_count(&self) -> usize {
        self.nodes.len()
    }

    /// Register `gate` under the population addressed by `path`.
    ///
    /// # Errors
    /// Returns `GateError::Hierarchy` if the gate's parent name differs from
    /// the last path element, the parent population does not exist, the
    /// parent is a quadrant gate rather than one of its quadrants, or a
    /// sibling already uses the name.
    pub fn add_gate(&mut self, gate: Gate, path: impl Into<GatePath>) -> Result<()> {
        let path = path.into();

        if gate.parent_name() != path.last() {
            return Err(GateError::hierarchy(format!(
                "Gate '{}' has parent '{}' but was added under path '{}'",
                gate.name(),
                gate.parent_name().unwrap_or("None"),
                path
            )));
        }

        let key = PopulationKey::new(gate.shared_name().clone(), path);

        if let Some(parent_key) = key.parent_key() {
            match self.populations.get(&parent_key) {
                None => {
                    return Err(GateError::hierarchy(format!(
                        "Parent population '{}' of gate '{}' does not exist",
                        parent_key,
                        gate.name()
                    )));
                }
                Some(Producer::Gate(idx)) if self.nodes[*idx].gate.is_quadrant() => {
                    return Err(GateError::hierarchy(format!(
                        "Gate '{}' cannot be added under quadrant gate '{}'; add it under one of its quadrants",
                        gate.name(),
                        parent_key
                    )));
                }
                Some(_) => {}
            }
        }

        if self.populations.contains_key(&key) {
            return Err(GateError::hierarchy(format!(
                "A population named '{}' already exists at '{}'",
                key.name, key.path
            )));
        }

        let idx = self.nodes.len();
        let mut new_populations = vec![(key.clone(), Producer::Gate(idx))];

        if let Some(quadrant_gate) = gate.as_quadrant() {
            for quadrant_id in quadrant_gate.quadrant_ids() {
                let quadrant_key = PopulationKey::quadrant(
                    gate.shared_name().clone(),
                    quadrant_id,
                    key.path.clone(),
                );
                new_populations.push((quadrant_key, Producer::Quadrant(idx)));
            }
        }

        debug!(
            "Registered {} at {} ({} populations)",
            gate,
            key.path,
            new_populations.len()
        );

        self.populations.extend(new_populations);
        self.nodes.push(GateEntry { key, gate });
        Ok(())
    }

    /// Resolve references, order the gates and freeze the hierarchy.
    ///
    /// # Errors
    /// - `GateError::Hierarchy` for unknown or ambiguous boolean references
    ///   and for dependency cycles
    /// - `GateError::Validation` for inverted ranges when
    ///   `strict_ranges` is enabled
    pub fn build(self) -> Result<GatingHierarchy> {
        self.check_ranges()?;

        // dependencies[i] lists the gates that must run before gate i
        let mut dependencies: Vec<Vec<usize>> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let mut deps = Vec::new();

            if let Some(parent_key) = node.key.parent_key() {
                let producer = self.populations.get(&parent_key).ok_or_else(|| {
                    GateError::hierarchy(format!("Unknown parent population '{}'", parent_key))
                })?;
                deps.push(producer.index());
            }

            if let Some(boolean) = node.gate.as_boolean() {
                for gate_ref in boolean.refs() {
                    deps.push(self.resolve_reference(&node.key, gate_ref.key())?);
                }
            }

            dependencies.push(deps);
        }

        let order = topological_order(&self.nodes, &dependencies)?;

        debug!(
            "Evaluation order: {}",
            order.iter().map(|&idx| &self.nodes[idx].key).join(", ")
        );
        info!(
            "Built gating hierarchy with {} gates and {} populations",
            self.nodes.len(),
            self.populations.len()
        );

        Ok(GatingHierarchy {
            config: self.config,
            nodes: self.nodes,
            populations: self.populations,
            order,
        })
    }

    fn resolve_reference(&self, owner: &PopulationKey, reference: &PopulationKey) -> Result<usize> {
        match self.populations.get(reference) {
            Some(Producer::Gate(idx)) if self.nodes[*idx].gate.is_quadrant() => {
                Err(GateError::hierarchy(format!(
                    "Boolean gate '{}' references quadrant gate '{}' without a quadrant id",
                    owner, reference
                )))
            }
            Some(producer) => Ok(producer.index()),
            None => Err(GateError::hierarchy(format!(
                "Boolean gate '{}' references unknown population '{}'",
                owner, reference
            ))),
        }
    }

    fn check_ranges(&self) -> Result<()> {
        for node in &self.nodes {
            for (column, min, max) in node.gate.inverted_ranges() {
                if self.config.strict_ranges {
                    return Err(GateError::validation(format!(
                        "Gate '{}' has an empty range on '{}': min {} >= max {}",
                        node.key, column, min, max
                    )));
                }
                warn!(
                    "Gate '{}' has an empty range on '{}' (min {} >= max {}); it will select no events",
                    node.key, column, min, max
                );
            }
        }
        Ok(())
    }
}

/// Kahn's algorithm; ready gates run in insertion order
fn topological_order(nodes: &[GateEntry], dependencies: &[Vec<usize>]) -> Result<Vec<usize>> {
    let mut in_degree = vec![0usize; nodes.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

    for (idx, deps) in dependencies.iter().enumerate() {
        for &dep in deps.iter().unique() {
            in_degree[idx] += 1;
            dependents[dep].push(idx);
        }
    }

    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(idx, _)| idx)
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(idx) = ready.pop_first() {
        order.push(idx);
        for &dependent in &dependents[idx] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() != nodes.len() {
        let cyclic = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &degree)| degree > 0)
            .map(|(idx, _)| &nodes[idx].key)
            .join(", ");
        return Err(GateError::hierarchy(format!(
            "Cyclic gate dependencies among: {}",
            cyclic
        )));
    }

    Ok(order)
}

/// Immutable, validated gating strategy.
///
/// Evaluation never mutates the hierarchy, so one instance can gate many
/// event tables concurrently.
#[derive(Debug, Clone)]
pub struct GatingHierarchy {
    config: GatingConfig,
    nodes: Vec<GateEntry>,
    populations: FxHashMap<PopulationKey, Producer>,
    order: Vec<usize>,
}

impl GatingHierarchy {
    pub fn config(&self) -> &GatingConfig {
        &self.config
    }

    pub fn gate_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a gate by name and the path it was registered under
    pub fn gate(&self, name: &str, path: &GatePath) -> Option<&Gate> {
        let key = PopulationKey::new(name, path.clone());
        match self.populations.get(&key) {
            Some(Producer::Gate(idx)) => Some(&self.nodes[*idx].gate),
            _ => None,
        }
    }

    /// Keys of every gate, in registration order
    pub fn gate_ids(&self) -> Vec<&PopulationKey> {
        self.nodes.iter().map(|node| &node.key).collect()
    }

    /// Keys of every gate, in evaluation order
    pub fn evaluation_order(&self) -> Vec<&PopulationKey> {
        self.order.iter().map(|&idx| &self.nodes[idx].key).collect()
    }

    /// Every population key, quadrants included, in evaluation order
    pub fn population_keys(&self) -> Vec<PopulationKey> {
        self.order
            .iter()
            .flat_map(|&idx| {
                let node = &self.nodes[idx];
                let mut keys = vec![node.key.clone()];
                if let Some(quadrant_gate) = node.gate.as_quadrant() {
                    keys.extend(quadrant_gate.quadrant_ids().map(|quadrant_id| {
                        PopulationKey::quadrant(
                            node.gate.shared_name().clone(),
                            quadrant_id,
                            node.key.path.clone(),
                        )
                    }));
                }
                keys
            })
            .collect()
    }

    /// Populations gated directly from `key`.
    ///
    /// For a quadrant gate these are its quadrants.
    pub fn children(&self, key: &PopulationKey) -> Vec<PopulationKey> {
        let child_path = key.full_path();
        self.population_keys()
            .into_iter()
            .filter(|candidate| candidate.path == child_path)
            .collect()
    }

    /// Ancestor population keys from the root level down to the parent
    pub fn ancestors(&self, key: &PopulationKey) -> Vec<PopulationKey> {
        let names = key.path.names();
        (0..names.len())
            .map(|depth| PopulationKey::new(names[depth].clone(), names[..depth].to_vec()))
            .collect()
    }

    /// Columns read by any gate, sorted and deduplicated
    pub fn required_columns(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .flat_map(|node| node.gate.column_ids())
            .sorted()
            .dedup()
            .collect()
    }

    /// Apply every gate to `events`.
    ///
    /// Each population stores its raw membership plus the membership scoped
    /// by its ancestors; boolean gates read the scoped membership of their
    /// references.
    ///
    /// # Errors
    /// The first gate failure aborts the evaluation; the error names the
    /// failing gate.
    pub fn evaluate(&self, events: &EventTable) -> Result<GatingResults> {
        let mut results = GatingResults::new(events.event_count());

        for &idx in &self.order {
            let node = &self.nodes[idx];
            let started = Instant::now();

            let membership = node
                .gate
                .apply(events, &results)
                .map_err(|e| e.with_context(format!("gate '{}'", node.key)))?;

            let parent_scope = match node.key.parent_key() {
                Some(parent_key) => Some(results.membership(&parent_key).ok_or_else(|| {
                    GateError::uncomputed_reference(parent_key.to_string())
                })?),
                None => None,
            };

            let mut computed = Vec::new();
            match membership {
                Membership::Single(raw) => {
                    let scoped = scope(&raw, parent_scope);
                    computed.push((
                        node.key.clone(),
                        raw,
                        scoped,
                        PopulationInfo::new(node.gate.gate_type(), parent_name(&node.key), None),
                    ));
                }
                Membership::Quadrants(quadrants) => {
                    for (quadrant_id, raw) in quadrants {
                        let scoped = scope(&raw, parent_scope);
                        computed.push((
                            PopulationKey::quadrant(
                                node.gate.shared_name().clone(),
                                quadrant_id,
                                node.key.path.clone(),
                            ),
                            raw,
                            scoped,
                            PopulationInfo::new(
                                node.gate.gate_type(),
                                parent_name(&node.key),
                                Some(node.gate.shared_name().clone()),
                            ),
                        ));
                    }
                }
            }

            debug!(
                "Applied {} to {} events in {:?}",
                node.key,
                events.event_count(),
                started.elapsed()
            );

            for (key, raw, scoped, info) in computed {
                results.insert(key, raw, scoped, info);
            }
        }

        Ok(results)
    }

    /// Evaluate several independent tables.
    ///
    /// Returns one result per sample in input order; a failing sample does not
    /// stop the others. Runs on the rayon pool unless
    /// `GatingConfig::parallel_samples` is off.
    pub fn gate_samples<S>(&self, samples: &[(S, EventTable)]) -> Vec<(String, Result<GatingResults>)>
    where
        S: AsRef<str> + Sync,
    {
        info!(
            "Gating {} samples ({})",
            samples.len(),
            if self.config.parallel_samples {
                "parallel"
            } else {
                "sequential"
            }
        );

        let gate_one = |(sample, events): &(S, EventTable)| {
            let sample = sample.as_ref();
            let result = self
                .evaluate(events)
                .map_err(|e| e.with_context(format!("sample '{}'", sample)));
            if let Err(err) = &result {
                warn!("Gating failed for sample '{}': {}", sample, err);
            }
            (sample.to_string(), result)
        };

        if self.config.parallel_samples {
            samples.par_iter().map(gate_one).collect()
        } else {
            samples.iter().map(gate_one).collect()
        }
    }
}

fn scope(raw: &[bool], parent_scope: Option<&[bool]>) -> Vec<bool> {
    let mut scoped = raw.to_vec();
    if let Some(parent) = parent_scope {
        and_assign(&mut scoped, parent);
    }
    scoped
}

fn parent_name(key: &PopulationKey) -> Option<Arc<str>> {
    key.path.names().last().cloned()
}

impl fmt::Display for GatingHierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GatingHierarchy({} gates)", self.nodes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boolean::{BooleanGate, BooleanOp, GateRef};
    use crate::dimension::{Dimension, Divider};
    use crate::quadrant::{Quadrant, QuadrantGate};
    use crate::rectangle::RectangleGate;

    fn range(column: &str, min: f64) -> RectangleGate {
        RectangleGate::new(vec![Dimension::new(column).with_range(Some(min), None).unwrap()])
            .unwrap()
    }

    fn quadrant_gate() -> QuadrantGate {
        QuadrantGate::new(
            vec![Divider::new("D", "x", vec![5.0]).unwrap()],
            vec![
                Quadrant::new("lo", vec!["D"], vec![(None, Some(5.0))]).unwrap(),
                Quadrant::new("hi", vec!["D"], vec![(Some(5.0), None)]).unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_parent_must_exist() {
        let mut builder = GatingHierarchyBuilder::new();
        let err = builder
            .add_gate(Gate::new("B", range("x", 1.0)).with_parent("A"), ["A"])
            .unwrap_err();
        assert!(matches!(err, GateError::Hierarchy { .. }));
    }

    #[test]
    fn test_parent_name_must_match_path() {
        let mut builder = GatingHierarchyBuilder::new();
        builder.add_gate(Gate::new("A", range("x", 1.0)), GatePath::root()).unwrap();
        assert!(builder.add_gate(Gate::new("B", range("x", 2.0)), ["A"]).is_err());
        assert!(
            builder
                .add_gate(Gate::new("B", range("x", 2.0)).with_parent("A"), GatePath::root())
                .is_err()
        );
    }

    #[test]
    fn test_sibling_names_unique_but_not_global() {
        let mut builder = GatingHierarchyBuilder::new();
        builder.add_gate(Gate::new("A", range("x", 1.0)), GatePath::root()).unwrap();
        builder.add_gate(Gate::new("B", range("x", 1.0)), GatePath::root()).unwrap();
        builder
            .add_gate(Gate::new("C", range("x", 2.0)).with_parent("A"), ["A"])
            .unwrap();
        builder
            .add_gate(Gate::new("C", range("x", 3.0)).with_parent("B"), ["B"])
            .unwrap();

        let err = builder
            .add_gate(Gate::new("C", range("x", 4.0)).with_parent("A"), ["A"])
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let hierarchy = builder.build().unwrap();
        assert_eq!(hierarchy.gate_count(), 4);
        assert!(hierarchy.gate("C", &GatePath::from(["B"])).is_some());
    }

    #[test]
    fn test_children_attach_to_quadrants() {
        let mut builder = GatingHierarchyBuilder::new();
        builder.add_gate(Gate::new("Q", quadrant_gate()), GatePath::root()).unwrap();

        let err = builder
            .add_gate(Gate::new("X", range("y", 1.0)).with_parent("Q"), ["Q"])
            .unwrap_err();
        assert!(err.to_string().contains("quadrant gate"));

        builder
            .add_gate(Gate::new("X", range("y", 1.0)).with_parent("hi"), ["Q", "hi"])
            .unwrap();
        let hierarchy = builder.build().unwrap();

        let quadrant_key = PopulationKey::quadrant("Q", "hi", GatePath::root());
        assert_eq!(
            hierarchy.children(&quadrant_key),
            vec![PopulationKey::new("X", ["Q", "hi"])]
        );
        assert_eq!(hierarchy.children(&PopulationKey::root_level("Q")).len(), 2);
    }

    #[test]
    fn test_forward_boolean_reference_orders_evaluation() {
        let mut builder = GatingHierarchyBuilder::new();
        let not_b = BooleanGate::new(BooleanOp::Not, vec![GateRef::new("B", GatePath::root())])
            .unwrap();
        builder.add_gate(Gate::new("NotB", not_b), GatePath::root()).unwrap();
        builder.add_gate(Gate::new("B", range("x", 1.0)), GatePath::root()).unwrap();

        let hierarchy = builder.build().unwrap();
        let order: Vec<String> = hierarchy
            .evaluation_order()
            .iter()
            .map(|key| key.to_string())
            .collect();
        assert_eq!(order, vec!["/B", "/NotB"]);
    }

    #[test]
    fn test_unknown_and_ambiguous_references() {
        let mut builder = GatingHierarchyBuilder::new();
        let dangling =
            BooleanGate::new(BooleanOp::And, vec![GateRef::new("Nope", GatePath::root())])
                .unwrap();
        builder.add_gate(Gate::new("And1", dangling), GatePath::root()).unwrap();
        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("unknown population"));

        let mut builder = GatingHierarchyBuilder::new();
        builder.add_gate(Gate::new("Q", quadrant_gate()), GatePath::root()).unwrap();
        let ambiguous =
            BooleanGate::new(BooleanOp::Or, vec![GateRef::new("Q", GatePath::root())]).unwrap();
        builder.add_gate(Gate::new("Or1", ambiguous), GatePath::root()).unwrap();
        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("without a quadrant id"));
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let mut builder = GatingHierarchyBuilder::new();
        let self_ref =
            BooleanGate::new(BooleanOp::Not, vec![GateRef::new("Loop", GatePath::root())])
                .unwrap();
        builder.add_gate(Gate::new("Loop", self_ref), GatePath::root()).unwrap();
        let err = builder.build().unwrap_err();
        assert!(matches!(err, GateError::Hierarchy { .. }));
        assert!(err.to_string().contains("/Loop"));
    }

    #[test]
    fn test_queries() {
        let mut builder = GatingHierarchyBuilder::new();
        builder.add_gate(Gate::new("A", range("x", 1.0)), GatePath::root()).unwrap();
        builder
            .add_gate(Gate::new("B", range("y", 1.0)).with_parent("A"), ["A"])
            .unwrap();
        builder
            .add_gate(Gate::new("C", range("x", 2.0)).with_parent("B"), ["A", "B"])
            .unwrap();
        let hierarchy = builder.build().unwrap();

        assert_eq!(hierarchy.to_string(), "GatingHierarchy(3 gates)");
        assert_eq!(hierarchy.required_columns(), vec!["x", "y"]);
        assert_eq!(
            hierarchy.ancestors(&PopulationKey::new("C", ["A", "B"])),
            vec![PopulationKey::root_level("A"), PopulationKey::new("B", ["A"])]
        );
        assert_eq!(hierarchy.gate_ids().len(), 3);
    }

    #[test]
    fn test_evaluate_scopes_by_parent() {
        let mut builder = GatingHierarchyBuilder::new();
        builder.add_gate(Gate::new("A", range("x", 2.0)), GatePath::root()).unwrap();
        builder
            .add_gate(Gate::new("B", range("y", 2.0)).with_parent("A"), ["A"])
            .unwrap();
        let hierarchy = builder.build().unwrap();

        let events =
            EventTable::from_columns([("x", vec![1.0, 3.0, 3.0]), ("y", vec![3.0, 3.0, 1.0])])
                .unwrap();
        let results = hierarchy.evaluate(&events).unwrap();
        let b = PopulationKey::new("B", ["A"]);

        assert_eq!(results.raw_membership(&b).unwrap(), &[true, true, false]);
        assert_eq!(results.membership(&b).unwrap(), &[false, true, false]);
        assert_eq!(results.count(&b), Some(1));
    }
}
