use crate::error::Result;
use crate::events::EventTable;

/// Trait for gates whose membership is a pure function of event columns
pub trait EventPredicate {
    /// Evaluate the gate over every event, returning one flag per row
    fn apply(&self, events: &EventTable) -> Result<Vec<bool>>;
}

/// Trait for gates that read event table columns
pub trait GateColumns {
    /// Column identifiers this gate reads, in declared order
    fn column_ids(&self) -> Vec<&str>;
}

/// Trait for gates carrying half-open ranges
pub trait GateRanges {
    /// `(column, min, max)` for every bounded axis
    fn ranges(&self) -> Vec<(&str, Option<f64>, Option<f64>)>;

    /// Ranges whose minimum is not below their maximum
    fn inverted_ranges(&self) -> Vec<(&str, f64, f64)> {
        self.ranges()
            .into_iter()
            .filter_map(|(column, min, max)| match (min, max) {
                (Some(min), Some(max)) if min >= max => Some((column, min, max)),
                _ => None,
            })
            .collect()
    }
}
