//! Spatial lag operators: weighted/binary mean lag and median lag.
//!
//! Both operators compute each observation independently from its neighbor
//! list, so with the `threading` feature the observation loop is sharded
//! across the rayon pool. Output is identical either way.
mod mean;
mod median;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AggregateError;
use crate::weights::SpatialWeights;

/// Self-inclusion and row standardisation flags for [`compute_lag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregationPolicy {
    /// Include the observation's own value in its lag.
    pub use_self_neighbor: bool,
    /// Divide the accumulated sum by the neighbor count (binary) or the
    /// accumulated weight (weighted).
    pub row_standardize: bool,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self { use_self_neighbor: false, row_standardize: true }
    }
}

/// Compute the mean-style spatial lag of `values` over `w`.
///
/// Binary weights when `w.weights` is `None`, weighted otherwise; see the
/// `mean` module for how the two modes order self-inclusion and
/// standardisation. An observation without neighbors yields `0` before the
/// self step is applied.
///
/// Fails when the topology does not match `values.len()` or references an
/// index outside it.
pub fn compute_lag(
    values: &[f64],
    w: &SpatialWeights,
    policy: AggregationPolicy,
) -> Result<Vec<f64>, AggregateError> {
    w.validate(values.len())?;
    debug!(
        n = values.len(),
        binary = w.is_binary(),
        use_self = policy.use_self_neighbor,
        row_standardize = policy.row_standardize,
        "computing spatial lag"
    );

    match &w.weights {
        None => map_observations(values.len(), |i| Ok(mean::binary_lag(i, values, w, policy))),
        Some(rows) => map_observations(values.len(), |i| {
            mean::weighted_lag(i, values, &w.neighbors[i], &rows[i], policy)
        }),
    }
}

/// Compute the median of each observation's neighbor values.
///
/// The observation itself is always excluded. Observations left with no
/// neighbors yield `NaN`; weights, if present, are ignored.
pub fn compute_median_lag(values: &[f64], w: &SpatialWeights) -> Result<Vec<f64>, AggregateError> {
    w.validate(values.len())?;
    debug!(n = values.len(), "computing median spatial lag");

    map_observations(values.len(), |i| Ok(median::median_lag(i, values, &w.neighbors[i])))
}

#[cfg(not(feature = "threading"))]
fn map_observations<F>(n: usize, f: F) -> Result<Vec<f64>, AggregateError>
where
    F: Fn(usize) -> Result<f64, AggregateError>,
{
    (0..n).map(f).collect()
}

#[cfg(feature = "threading")]
fn map_observations<F>(n: usize, f: F) -> Result<Vec<f64>, AggregateError>
where
    F: Fn(usize) -> Result<f64, AggregateError> + Sync + Send,
{
    use rayon::prelude::*;
    (0..n).into_par_iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::WeightsKind;
    use approx::assert_relative_eq;

    const STANDARDIZED: AggregationPolicy = AggregationPolicy { use_self_neighbor: false, row_standardize: true };
    const WITH_SELF: AggregationPolicy = AggregationPolicy { use_self_neighbor: true, row_standardize: true };
    const RAW: AggregationPolicy = AggregationPolicy { use_self_neighbor: false, row_standardize: false };

    /// 0 - 1 - 2 - 3
    fn line_of_four() -> SpatialWeights {
        SpatialWeights::binary(vec![vec![1], vec![0, 2], vec![1, 3], vec![2]])
    }

    /// Star around 0 with inverse-distance style weights.
    fn weighted_star() -> SpatialWeights {
        SpatialWeights::weighted(
            vec![vec![1, 2], vec![0], vec![0]],
            vec![vec![1.0, 3.0], vec![1.0], vec![2.0]],
            WeightsKind::Distance,
        )
    }

    // ── Binary ────────────────────────────────────────────────────────────────

    #[test]
    fn binary_standardized_is_mean_of_neighbors() {
        let lag = compute_lag(&[1.0, 2.0, 3.0, 4.0], &line_of_four(), STANDARDIZED).unwrap();
        assert_eq!(lag, vec![2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn binary_isolate_yields_zero_not_nan() {
        let w = SpatialWeights::binary(vec![vec![1], vec![0], vec![]]);
        let lag = compute_lag(&[5.0, 7.0, 9.0], &w, STANDARDIZED).unwrap();
        assert_eq!(lag[2], 0.0);
    }

    #[test]
    fn binary_with_self_is_mean_including_self() {
        let lag = compute_lag(&[1.0, 2.0, 3.0, 4.0], &line_of_four(), WITH_SELF).unwrap();
        assert_relative_eq!(lag[0], 1.5);
        assert_relative_eq!(lag[1], 2.0);
        assert_relative_eq!(lag[2], 3.0);
        assert_relative_eq!(lag[3], 3.5);
    }

    #[test]
    fn binary_isolate_with_self_is_own_value() {
        let w = SpatialWeights::binary(vec![vec![]]);
        let lag = compute_lag(&[6.0], &w, WITH_SELF).unwrap();
        assert_eq!(lag, vec![6.0]);
    }

    #[test]
    fn binary_listed_self_is_counted_once() {
        let w = SpatialWeights::binary(vec![vec![0, 1], vec![0, 1]]);
        let values = [2.0, 4.0];
        assert_eq!(compute_lag(&values, &w, STANDARDIZED).unwrap(), vec![4.0, 2.0]);
        assert_eq!(compute_lag(&values, &w, WITH_SELF).unwrap(), vec![3.0, 3.0]);
    }

    #[test]
    fn binary_raw_sum_without_standardization() {
        let lag = compute_lag(&[1.0, 2.0, 3.0, 4.0], &line_of_four(), RAW).unwrap();
        assert_eq!(lag, vec![2.0, 4.0, 6.0, 3.0]);
    }

    // ── Weighted ──────────────────────────────────────────────────────────────

    #[test]
    fn weighted_standardized_is_weighted_mean() {
        let lag = compute_lag(&[10.0, 20.0, 40.0], &weighted_star(), STANDARDIZED).unwrap();
        assert_relative_eq!(lag[0], 35.0);
        assert_relative_eq!(lag[1], 10.0);
        assert_relative_eq!(lag[2], 10.0);
    }

    #[test]
    fn weighted_raw_is_weighted_sum() {
        let lag = compute_lag(&[10.0, 20.0, 40.0], &weighted_star(), RAW).unwrap();
        assert_relative_eq!(lag[0], 140.0);
        assert_relative_eq!(lag[2], 20.0);
    }

    #[test]
    fn weighted_adds_self_after_standardizing() {
        let values = [10.0, 20.0, 40.0];
        let lag = compute_lag(&values, &weighted_star(), WITH_SELF).unwrap();
        // Standardised neighbor mean plus the raw own value.
        assert_relative_eq!(lag[0], 45.0);
        assert_relative_eq!(lag[1], 30.0);
        assert_relative_eq!(lag[2], 50.0);

        // The same topology as binary weights folds self into the mean instead.
        let binary = SpatialWeights::binary(weighted_star().neighbors);
        let lag = compute_lag(&values, &binary, WITH_SELF).unwrap();
        assert_relative_eq!(lag[0], 70.0 / 3.0);
        assert_relative_eq!(lag[1], 15.0);
    }

    /// Open ambiguity: kernel rows carry both a diagonal entry at the self
    /// position and a trailing slot. Self-inclusion reads the trailing slot and
    /// the standardised sum excludes it.
    #[test]
    fn kernel_self_weight_reads_trailing_slot_not_diagonal() {
        let w = SpatialWeights::weighted(
            vec![vec![0, 1], vec![0, 1]],
            vec![vec![1.0, 0.5, 0.8], vec![0.5, 1.0, 0.9]],
            WeightsKind::Kernel,
        );
        let lag = compute_lag(&[10.0, 20.0], &w, WITH_SELF).unwrap();
        assert_relative_eq!(lag[0], 20.0 + 10.0 * 0.8);
        assert_relative_eq!(lag[1], 10.0 + 20.0 * 0.9);
    }

    #[test]
    fn kernel_without_self_slot_fails_only_when_self_requested() {
        let w = SpatialWeights::weighted(
            vec![vec![0, 1], vec![0, 1]],
            vec![vec![1.0, 0.5], vec![0.5, 1.0]],
            WeightsKind::Kernel,
        );
        assert_eq!(
            compute_lag(&[10.0, 20.0], &w, WITH_SELF),
            Err(AggregateError::MissingSelfWeight { observation: 0 })
        );
        assert_eq!(compute_lag(&[10.0, 20.0], &w, STANDARDIZED).unwrap(), vec![20.0, 10.0]);
    }

    #[test]
    fn weighted_zero_weight_sum_skips_division() {
        let w = SpatialWeights::weighted(vec![vec![1], vec![]], vec![vec![0.0], vec![]], WeightsKind::Distance);
        let lag = compute_lag(&[3.0, 4.0], &w, STANDARDIZED).unwrap();
        assert_eq!(lag, vec![0.0, 0.0]);
        let lag = compute_lag(&[3.0, 4.0], &w, WITH_SELF).unwrap();
        assert_eq!(lag, vec![3.0, 4.0]);
    }

    // ── Contract ──────────────────────────────────────────────────────────────

    #[test]
    fn length_mismatch_is_rejected() {
        let err = compute_lag(&[1.0, 2.0], &line_of_four(), STANDARDIZED).unwrap_err();
        assert_eq!(err, AggregateError::LengthMismatch { values: 2, neighbors: 4 });
        assert!(compute_median_lag(&[1.0], &line_of_four()).is_err());
    }

    #[test]
    fn out_of_range_neighbor_is_rejected() {
        let w = SpatialWeights::binary(vec![vec![3], vec![0]]);
        assert!(matches!(
            compute_lag(&[1.0, 2.0], &w, STANDARDIZED),
            Err(AggregateError::NeighborOutOfRange { observation: 0, neighbor: 3, n: 2 })
        ));
    }

    #[test]
    fn output_is_index_aligned_and_repeatable() {
        let values = [0.3, -1.7, 2.2, 9.1];
        let first = compute_lag(&values, &line_of_four(), WITH_SELF).unwrap();
        let second = compute_lag(&values, &line_of_four(), WITH_SELF).unwrap();
        assert_eq!(first.len(), values.len());
        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn median_lag_is_index_aligned_and_repeatable() {
        let values = [3.0, 3.0, 0.0, 9.0, 8.0, 8.5];
        let w = SpatialWeights::binary(vec![vec![1], vec![0], vec![], vec![4, 5], vec![3, 5], vec![3, 4]]);
        let first = compute_median_lag(&values, &w).unwrap();
        let second = compute_median_lag(&values, &w).unwrap();
        assert_eq!(first.len(), values.len());
        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let w = SpatialWeights::binary(vec![]);
        assert!(compute_lag(&[], &w, STANDARDIZED).unwrap().is_empty());
        assert!(compute_median_lag(&[], &w).unwrap().is_empty());
    }

    // ── Median ────────────────────────────────────────────────────────────────

    #[test]
    fn median_lag_with_isolate_and_even_neighbors() {
        let values = [3.0, 3.0, 0.0, 9.0, 8.0, 8.5];
        let w = SpatialWeights::binary(vec![vec![1], vec![0], vec![], vec![4, 5], vec![3, 5], vec![3, 4]]);
        let lag = compute_median_lag(&values, &w).unwrap();

        assert_eq!(lag.len(), 6);
        assert_eq!(lag[0], 3.0);
        assert!(lag[2].is_nan(), "isolate must be flagged for the caller, got {}", lag[2]);
        assert_relative_eq!(lag[3], 8.25);
        assert_relative_eq!(lag[4], 9.0 / 2.0 + 8.5 / 2.0);
    }

    #[test]
    fn median_lag_always_excludes_self() {
        let w = SpatialWeights::binary(vec![vec![0, 1, 2], vec![0], vec![1]]);
        let lag = compute_median_lag(&[100.0, 1.0, 3.0], &w).unwrap();
        assert_eq!(lag[0], 2.0);
        assert_eq!(lag[1], 100.0);
    }

    #[test]
    fn median_lag_odd_neighbors_is_middle_value() {
        let w = SpatialWeights::binary(vec![vec![1, 2, 3], vec![0], vec![0], vec![0]]);
        let lag = compute_median_lag(&[0.0, 7.0, -2.0, 4.0], &w).unwrap();
        assert_eq!(lag[0], 4.0);
    }

    #[test]
    fn policy_defaults_when_fields_omitted() {
        let p: AggregationPolicy = serde_json::from_str(r#"{"useSelfNeighbor": true}"#).unwrap();
        assert_eq!(p, AggregationPolicy { use_self_neighbor: true, row_standardize: true });
        assert_eq!(AggregationPolicy::default(), STANDARDIZED);
    }

    #[cfg(feature = "threading")]
    #[test]
    fn parallel_matches_sequential() {
        let n = 5_000;
        let values: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).sin()).collect();
        let neighbors: Vec<Vec<usize>> = (0..n)
            .map(|i| [i.wrapping_sub(1), i + 1].into_iter().filter(|&j| j < n).collect())
            .collect();
        let w = SpatialWeights::binary(neighbors);

        let parallel = compute_lag(&values, &w, WITH_SELF).unwrap();
        let sequential: Vec<f64> = (0..n).map(|i| mean::binary_lag(i, &values, &w, WITH_SELF)).collect();
        assert_eq!(parallel, sequential);
    }
}
