use rayon::prelude::*;

/// Half-open interval membership for a single value.
///
/// `min` is inclusive and `max` exclusive; an absent bound places no
/// constraint on that side. NaN fails any present bound.
#[inline]
pub fn in_interval(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value < max)
}

/// Batch half-open interval membership
pub fn interval_test(values: &[f64], min: Option<f64>, max: Option<f64>) -> Vec<bool> {
    values
        .par_iter()
        .map(|&value| in_interval(value, min, max))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_only_is_inclusive() {
        let values = vec![4.9, 5.0, 5.1];
        assert_eq!(interval_test(&values, Some(5.0), None), vec![false, true, true]);
    }

    #[test]
    fn test_max_only_is_exclusive() {
        let values = vec![4.9, 5.0, 5.1];
        assert_eq!(interval_test(&values, None, Some(5.0)), vec![true, false, false]);
    }

    #[test]
    fn test_both_bounds() {
        let values = vec![-1.0, 0.0, 5.0, 9.999, 10.0, 11.0];
        assert_eq!(
            interval_test(&values, Some(0.0), Some(10.0)),
            vec![false, true, true, true, false, false]
        );
    }

    #[test]
    fn test_unbounded_accepts_everything() {
        let values = vec![f64::MIN, 0.0, f64::MAX];
        assert_eq!(interval_test(&values, None, None), vec![true, true, true]);
    }

    #[test]
    fn test_nan_fails_bounds() {
        assert!(!in_interval(f64::NAN, Some(0.0), None));
        assert!(!in_interval(f64::NAN, None, Some(0.0)));
    }

    #[test]
    fn test_inverted_range_selects_nothing() {
        let values = vec![0.0, 5.0, 10.0];
        assert_eq!(
            interval_test(&values, Some(10.0), Some(0.0)),
            vec![false, false, false]
        );
    }
}
