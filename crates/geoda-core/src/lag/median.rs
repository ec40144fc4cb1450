//! Median-of-neighbors lag for a single observation.
use crate::stats::{median_of_sorted, sort_ascending};

/// Median of the values of `neighbors`, with `i` itself always excluded.
///
/// Returns `NaN` when no neighbor remains. No default is substituted; callers
/// that display or reuse the result must check for it.
pub(super) fn median_lag(i: usize, values: &[f64], neighbors: &[usize]) -> f64 {
    let mut nbr_values: Vec<f64> = neighbors
        .iter()
        .filter(|&&j| j != i)
        .map(|&j| values[j])
        .collect();
    sort_ascending(&mut nbr_values);
    median_of_sorted(&nbr_values).unwrap_or(f64::NAN)
}
