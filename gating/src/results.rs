//! Per-table result store and the count report derived from it.

use crate::error::Result;
use crate::geometry::count_true;
use crate::types::PopulationKey;
use polars::prelude::*;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Report metadata recorded alongside a population's membership.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationInfo {
    gate_type: &'static str,
    parent: Option<Arc<str>>,
    quadrant_parent: Option<Arc<str>>,
}

impl PopulationInfo {
    pub(crate) fn new(
        gate_type: &'static str,
        parent: Option<Arc<str>>,
        quadrant_parent: Option<Arc<str>>,
    ) -> Self {
        Self {
            gate_type,
            parent,
            quadrant_parent,
        }
    }

    pub fn gate_type(&self) -> &'static str {
        self.gate_type
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Name of the quadrant gate for quadrant populations
    pub fn quadrant_parent(&self) -> Option<&str> {
        self.quadrant_parent.as_deref()
    }
}

/// Membership of one population over one event table
#[derive(Debug, Clone)]
pub struct PopulationResult {
    raw: Vec<bool>,
    scoped: Vec<bool>,
    count: usize,
    info: PopulationInfo,
}

impl PopulationResult {
    /// The gate's own membership, ignoring ancestors
    pub fn raw(&self) -> &[bool] {
        &self.raw
    }

    /// Raw membership ANDed with every ancestor population
    pub fn scoped(&self) -> &[bool] {
        &self.scoped
    }

    /// Number of events in the scoped membership
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn info(&self) -> &PopulationInfo {
        &self.info
    }
}

/// Result store for one evaluation, keyed by [`PopulationKey`].
///
/// Populations are kept in the order they were evaluated.
#[derive(Debug, Clone, Default)]
pub struct GatingResults {
    event_count: usize,
    order: Vec<PopulationKey>,
    populations: FxHashMap<PopulationKey, PopulationResult>,
}

impl GatingResults {
    pub(crate) fn new(event_count: usize) -> Self {
        Self {
            event_count,
            ..Default::default()
        }
    }

    pub(crate) fn insert(
        &mut self,
        key: PopulationKey,
        raw: Vec<bool>,
        scoped: Vec<bool>,
        info: PopulationInfo,
    ) {
        let count = count_true(&scoped);
        let result = PopulationResult {
            raw,
            scoped,
            count,
            info,
        };
        if self.populations.insert(key.clone(), result).is_none() {
            self.order.push(key);
        }
    }

    /// Number of events in the evaluated table
    pub fn event_count(&self) -> usize {
        self.event_count
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &PopulationKey) -> bool {
        self.populations.contains_key(key)
    }

    pub fn get(&self, key: &PopulationKey) -> Option<&PopulationResult> {
        self.populations.get(key)
    }

    /// Ancestor-scoped membership
    pub fn membership(&self, key: &PopulationKey) -> Option<&[bool]> {
        self.populations.get(key).map(PopulationResult::scoped)
    }

    pub fn raw_membership(&self, key: &PopulationKey) -> Option<&[bool]> {
        self.populations.get(key).map(PopulationResult::raw)
    }

    pub fn count(&self, key: &PopulationKey) -> Option<usize> {
        self.populations.get(key).map(PopulationResult::count)
    }

    /// Population keys in evaluation order
    pub fn keys(&self) -> impl Iterator<Item = &PopulationKey> {
        self.order.iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PopulationKey, &PopulationResult)> {
        self.order
            .iter()
            .filter_map(|key| self.populations.get(key).map(|result| (key, result)))
    }

    /// Summarise every population as one report row.
    ///
    /// Quadrant populations are reported under their quadrant gate's path,
    /// with the quadrant gate named in `quadrant_parent`.
    pub fn report(&self, sample: &str) -> GatingReport {
        let rows = self
            .iter()
            .map(|(key, result)| {
                let info = result.info();
                let gate_path = match info.quadrant_parent() {
                    Some(_) => key.path.parent().unwrap_or_default(),
                    None => key.path.clone(),
                };
                ReportRow {
                    sample: sample.to_string(),
                    level: gate_path.len() + 1,
                    gate_path: gate_path.to_string(),
                    gate_name: key.name.to_string(),
                    gate_type: info.gate_type().to_string(),
                    quadrant_parent: info.quadrant_parent().map(str::to_string),
                    parent: info.parent().map(str::to_string),
                    count: result.count(),
                }
            })
            .collect();

        GatingReport {
            event_count: self.event_count,
            rows,
        }
    }
}

/// One population of one sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub sample: String,
    pub gate_path: String,
    pub gate_name: String,
    pub gate_type: String,
    pub quadrant_parent: Option<String>,
    pub parent: Option<String>,
    pub count: usize,
    /// Depth below the root; root-level gates are level 1
    pub level: usize,
}

/// Count table for one or more samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatingReport {
    /// Total events across the reported samples
    pub event_count: usize,
    pub rows: Vec<ReportRow>,
}

impl GatingReport {
    /// Append several reports into one table
    pub fn concat(reports: impl IntoIterator<Item = GatingReport>) -> Self {
        reports
            .into_iter()
            .fold(Self::default(), |mut acc, report| {
                acc.event_count += report.event_count;
                acc.rows.extend(report.rows);
                acc
            })
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Find a row by sample, gate path string and gate name
    pub fn find(&self, sample: &str, gate_path: &str, gate_name: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|row| {
            row.sample == sample && row.gate_path == gate_path && row.gate_name == gate_name
        })
    }

    /// Render the report as a polars `DataFrame`, one row per population
    pub fn to_data_frame(&self) -> Result<DataFrame> {
        let rows = &self.rows;
        let columns = vec![
            Column::new(
                "sample".into(),
                rows.iter().map(|row| row.sample.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "gate_path".into(),
                rows.iter().map(|row| row.gate_path.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "gate_name".into(),
                rows.iter().map(|row| row.gate_name.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "gate_type".into(),
                rows.iter().map(|row| row.gate_type.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "quadrant_parent".into(),
                rows.iter()
                    .map(|row| row.quadrant_parent.as_deref())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                "parent".into(),
                rows.iter().map(|row| row.parent.as_deref()).collect::<Vec<_>>(),
            ),
            Column::new(
                "count".into(),
                rows.iter().map(|row| row.count as u64).collect::<Vec<_>>(),
            ),
            Column::new(
                "level".into(),
                rows.iter().map(|row| row.level as u32).collect::<Vec<_>>(),
            ),
        ];

        Ok(DataFrame::new(columns)?)
    }
}
