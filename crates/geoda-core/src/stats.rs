//! Small order-statistics helpers shared by the median lag and the join median.

/// Sort ascending with IEEE total ordering so NaN inputs cannot panic the sort.
pub fn sort_ascending(values: &mut [f64]) {
    values.sort_unstable_by(f64::total_cmp);
}

/// Median of an already sorted slice: the middle element for odd lengths,
/// the mean of the two middle elements for even lengths, `None` when empty.
pub fn median_of_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}
