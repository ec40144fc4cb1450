//! Neighbor topology consumed by the lag operators.
//!
//! The topology itself is produced upstream by a weights engine (queen/rook
//! contiguity, k-nearest, distance band or kernel). This module only holds
//! it, checks it against an observation count, and summarises it.
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::AggregateError;
use crate::stats::median_of_sorted;

/// How the weights were constructed upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightsKind {
    #[default]
    Queen,
    Rook,
    Knn,
    Distance,
    Kernel,
}

/// Per-observation neighbor lists with an optional parallel weight matrix.
///
/// `weights[i][j]` belongs to `neighbors[i][j]`. Kernel weights may carry one
/// extra trailing slot per row holding the observation's self-weight. When
/// `weights` is `None` every listed neighbor has an implicit weight of 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialWeights {
    pub neighbors: Vec<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub kind: WeightsKind,
}

impl SpatialWeights {
    /// Binary contiguity weights.
    pub fn binary(neighbors: Vec<Vec<usize>>) -> Self {
        Self { neighbors, weights: None, kind: WeightsKind::Queen }
    }

    /// Continuous weights (distance or kernel) with an explicit matrix.
    pub fn weighted(neighbors: Vec<Vec<usize>>, weights: Vec<Vec<f64>>, kind: WeightsKind) -> Self {
        Self { neighbors, weights: Some(weights), kind }
    }

    pub fn is_binary(&self) -> bool {
        self.weights.is_none()
    }

    /// Check the topology against `n` observations.
    ///
    /// Fails on a neighbor count other than `n`, any index outside `[0, n)`,
    /// or a weight row shorter than its neighbor list.
    pub fn validate(&self, n: usize) -> Result<(), AggregateError> {
        if self.neighbors.len() != n {
            return Err(AggregateError::LengthMismatch { values: n, neighbors: self.neighbors.len() });
        }
        for (i, nbrs) in self.neighbors.iter().enumerate() {
            if let Some(&bad) = nbrs.iter().find(|&&j| j >= n) {
                return Err(AggregateError::NeighborOutOfRange { observation: i, neighbor: bad, n });
            }
        }
        if let Some(weights) = &self.weights {
            if weights.len() != self.neighbors.len() {
                return Err(AggregateError::WeightRowsMismatch {
                    weights: weights.len(),
                    neighbors: self.neighbors.len(),
                });
            }
            for (i, (row, nbrs)) in weights.iter().zip(&self.neighbors).enumerate() {
                if row.len() < nbrs.len() {
                    return Err(AggregateError::WeightRowTooShort {
                        observation: i,
                        weights: row.len(),
                        neighbors: nbrs.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Kernel self-weight of a row: the trailing slot one past the last neighbor.
pub(crate) fn self_weight_slot(neighbors: &[usize], row: &[f64]) -> Option<f64> {
    row.get(neighbors.len()).copied()
}

// ── Summary ───────────────────────────────────────────────────────────────────

/// Cardinality summary shown after weights are built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightsMeta {
    pub kind: WeightsKind,
    pub num_observations: usize,
    pub min_neighbors: usize,
    pub max_neighbors: usize,
    pub mean_neighbors: f64,
    pub median_neighbors: f64,
    /// Observations with no neighbor other than themselves.
    pub isolates: usize,
    /// Topological symmetry: `j ∈ N(i)` iff `i ∈ N(j)`. Weight values are not compared.
    pub is_symmetric: bool,
}

impl WeightsMeta {
    /// Summarise neighbor cardinalities. Self-references are not counted.
    /// An empty topology reports zeros throughout and is symmetric.
    pub fn summarize(w: &SpatialWeights) -> Self {
        let mut counts: Vec<usize> = w
            .neighbors
            .iter()
            .enumerate()
            .map(|(i, nbrs)| nbrs.iter().filter(|&&j| j != i).count())
            .collect();

        let n = counts.len();
        let isolates = counts.iter().filter(|&&c| c == 0).count();
        let min_neighbors = counts.iter().copied().min().unwrap_or(0);
        let max_neighbors = counts.iter().copied().max().unwrap_or(0);
        let mean_neighbors = if n == 0 {
            0.0
        } else {
            counts.iter().sum::<usize>() as f64 / n as f64
        };

        counts.sort_unstable();
        let sorted: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
        let median_neighbors = median_of_sorted(&sorted).unwrap_or(0.0);

        Self {
            kind: w.kind,
            num_observations: n,
            min_neighbors,
            max_neighbors,
            mean_neighbors,
            median_neighbors,
            isolates,
            is_symmetric: is_symmetric(&w.neighbors),
        }
    }
}

fn is_symmetric(neighbors: &[Vec<usize>]) -> bool {
    let edges: HashSet<(usize, usize)> = neighbors
        .iter()
        .enumerate()
        .flat_map(|(i, nbrs)| nbrs.iter().filter(move |&&j| j != i).map(move |&j| (i, j)))
        .collect();
    edges.iter().all(|&(i, j)| edges.contains(&(j, i)))
}

// ── Injection seam ────────────────────────────────────────────────────────────

/// Lookup of previously built weights by id.
///
/// Callers pass a provider into the pipeline instead of reaching for a
/// process-wide engine handle, so tests can supply fixed topologies.
pub trait WeightsProvider {
    fn weights(&self, id: &str) -> Option<&SpatialWeights>;
}

impl WeightsProvider for HashMap<String, SpatialWeights> {
    fn weights(&self, id: &str) -> Option<&SpatialWeights> {
        self.get(id)
    }
}
