//! Mean-style spatial lag for a single observation.
//!
//! Binary and weighted rows combine self-inclusion and row standardisation in
//! opposite orders:
//!
//!   binary:   sum neighbors → add self (weight 1) → divide by count
//!   weighted: sum w·neighbors → divide by Σw → add self
//!
//! The weighted order means a kernel self-weight is never standardised along
//! with the rest of the row.
use crate::error::AggregateError;
use crate::weights::{self_weight_slot, SpatialWeights};

use super::AggregationPolicy;

/// Binary (contiguity) lag at observation `i`. Indices must already be validated.
pub(super) fn binary_lag(i: usize, values: &[f64], w: &SpatialWeights, policy: AggregationPolicy) -> f64 {
    let mut lag = 0.0;
    let mut count = 0.0;

    for &j in &w.neighbors[i] {
        if j == i {
            continue;
        }
        lag += values[j];
        count += 1.0;
    }

    if policy.use_self_neighbor {
        lag += values[i];
        count += 1.0;
    }

    if policy.row_standardize {
        lag = if count == 0.0 { 0.0 } else { lag / count };
    }
    lag
}

/// Weighted (distance / kernel) lag at observation `i`.
///
/// The neighbor "count" is the accumulated weight, not the number of
/// neighbors. When the row lists `i` itself, self-inclusion uses the trailing
/// slot `weights[i][neighbors[i].len()]`; otherwise `values[i]` is added with
/// an implicit weight of 1.
pub(super) fn weighted_lag(
    i: usize,
    values: &[f64],
    neighbors: &[usize],
    row: &[f64],
    policy: AggregationPolicy,
) -> Result<f64, AggregateError> {
    let mut lag = 0.0;
    let mut weight_sum = 0.0;
    let mut self_listed = false;

    for (pos, &j) in neighbors.iter().enumerate() {
        if j == i {
            self_listed = true;
            continue;
        }
        lag += values[j] * row[pos];
        weight_sum += row[pos];
    }

    if policy.row_standardize && weight_sum > 0.0 {
        lag /= weight_sum;
    }

    if policy.use_self_neighbor {
        if self_listed {
            let self_weight = self_weight_slot(neighbors, row)
                .ok_or(AggregateError::MissingSelfWeight { observation: i })?;
            lag += values[i] * self_weight;
        } else {
            lag += values[i];
        }
    }
    Ok(lag)
}
