//! Columnar event tables.
//!
//! Gates never see raw instrument files. They read an [`EventTable`]: a polars
//! `DataFrame` with one row per event and one numeric column per channel or
//! derived ratio, already compensated and transformed upstream.

use crate::error::{GateError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::sync::Arc;

/// Shared, read-only event data keyed by dimension identifiers.
///
/// Cloning is cheap: the underlying `DataFrame` lives behind an `Arc`, so the
/// same table can be handed to several evaluations.
///
/// # Example
///
/// ```rust
/// use flow_gating::EventTable;
///
/// let table = EventTable::from_columns([
///     ("FSC-A", vec![10.0, 20.0, 30.0]),
///     ("SSC-A", vec![1.0, 2.0, 3.0]),
/// ])?;
/// assert_eq!(table.event_count(), 3);
/// assert!(table.has_column("SSC-A"));
/// # Ok::<(), flow_gating::GateError>(())
/// ```
#[derive(Debug, Clone)]
pub struct EventTable {
    data_frame: Arc<DataFrame>,
}

impl EventTable {
    /// Wrap an existing `DataFrame`
    pub fn new(data_frame: DataFrame) -> Self {
        Self {
            data_frame: Arc::new(data_frame),
        }
    }

    /// Wrap a `DataFrame` that is already shared elsewhere
    pub fn from_shared(data_frame: Arc<DataFrame>) -> Self {
        Self { data_frame }
    }

    /// Build a table from named `f64` columns.
    ///
    /// # Errors
    /// Fails if the columns differ in length or a name repeats.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: AsRef<str>,
    {
        let columns: Vec<Column> = columns
            .into_iter()
            .map(|(name, values)| Column::new(name.as_ref().into(), values))
            .collect();

        let data_frame = DataFrame::new(columns)
            .map_err(|e| GateError::from(e).with_context("building event table"))?;

        Ok(Self::new(data_frame))
    }

    /// Number of events (rows)
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.data_frame.height()
    }

    /// Check whether the table has no events
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.event_count() == 0
    }

    /// Column identifiers in table order
    pub fn column_names(&self) -> Vec<String> {
        self.data_frame
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Check whether a column identifier is present
    pub fn has_column(&self, column_id: &str) -> bool {
        self.data_frame.column(column_id).is_ok()
    }

    /// Borrow the underlying `DataFrame`
    pub fn data_frame(&self) -> &DataFrame {
        &self.data_frame
    }

    /// Read one column as `f64` values.
    ///
    /// Any numeric dtype is cast to `Float64`. Nulls become NaN, which fails
    /// every bounded predicate.
    ///
    /// # Errors
    /// [`GateError::MissingColumn`] if the column is absent, or an event table
    /// error if the column cannot be cast.
    pub fn column_values(&self, column_id: &str) -> Result<Vec<f64>> {
        let column = self
            .data_frame
            .column(column_id)
            .map_err(|_| GateError::missing_column(column_id, "event table"))?;

        let values = column.cast(&DataType::Float64)?;
        Ok(values
            .f64()?
            .into_iter()
            .map(|value| value.unwrap_or(f64::NAN))
            .collect())
    }

    /// Read two columns as (x, y) pairs
    pub fn xy_pairs(&self, x_column: &str, y_column: &str) -> Result<Vec<(f64, f64)>> {
        let x_values = self.column_values(x_column)?;
        let y_values = self.column_values(y_column)?;

        Ok(x_values.into_iter().zip(y_values).collect())
    }

    /// Read several columns as an `events × columns` matrix, in the given order
    pub fn points(&self, column_ids: &[&str]) -> Result<Array2<f64>> {
        let mut points = Array2::<f64>::zeros((self.event_count(), column_ids.len()));

        for (idx, column_id) in column_ids.iter().enumerate() {
            let values = Array1::from(self.column_values(column_id)?);
            points.column_mut(idx).assign(&values);
        }

        Ok(points)
    }
}

impl From<DataFrame> for EventTable {
    fn from(data_frame: DataFrame) -> Self {
        Self::new(data_frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> EventTable {
        EventTable::from_columns([
            ("FSC-A", vec![1.0, 2.0, 3.0, 4.0]),
            ("SSC-A", vec![10.0, 20.0, 30.0, 40.0]),
        ])
        .expect("valid table")
    }

    #[test]
    fn test_event_count_and_columns() {
        let table = sample_table();
        assert_eq!(table.event_count(), 4);
        assert!(!table.is_empty());
        assert_eq!(table.column_names(), vec!["FSC-A", "SSC-A"]);
        assert!(table.has_column("FSC-A"));
        assert!(!table.has_column("FL1-A"));
    }

    #[test]
    fn test_shared_frame_is_not_copied() {
        let frame = Arc::new(sample_table().data_frame().clone());
        let table = EventTable::from_shared(Arc::clone(&frame));

        assert!(std::ptr::eq(table.data_frame(), frame.as_ref()));
        assert_eq!(table.column_values("SSC-A").unwrap(), vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_missing_column() {
        let table = sample_table();
        let err = table.column_values("FL1-A").unwrap_err();
        assert!(matches!(err, GateError::MissingColumn { .. }));
        assert!(err.to_string().contains("FL1-A"));
    }

    #[test]
    fn test_integer_columns_are_cast() {
        let df = DataFrame::new(vec![Column::new("count".into(), vec![1i32, 2, 3])])
            .expect("valid frame");
        let table = EventTable::from(df);
        assert_eq!(table.column_values("count").unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_nulls_read_as_nan() {
        let df = DataFrame::new(vec![Column::new(
            "FL2-H".into(),
            vec![Some(1.5f64), None, Some(2.5)],
        )])
        .expect("valid frame");
        let values = EventTable::new(df).column_values("FL2-H").unwrap();
        assert_eq!(values[0], 1.5);
        assert!(values[1].is_nan());
    }

    #[test]
    fn test_points_matrix() {
        let table = sample_table();
        let points = table.points(&["SSC-A", "FSC-A"]).unwrap();
        assert_eq!(points.shape(), &[4, 2]);
        assert_eq!(points[[2, 0]], 30.0);
        assert_eq!(points[[2, 1]], 3.0);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let result = EventTable::from_columns([("a", vec![1.0]), ("b", vec![1.0, 2.0])]);
        assert!(result.is_err());
    }
}
