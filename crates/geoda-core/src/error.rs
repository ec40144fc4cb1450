//! Error types for the aggregation core and the derived-column pipeline.
//!
//! Degenerate numeric input (empty neighbor lists, empty join groups) is never
//! an error: it yields the sentinel values documented on each operation.
//! Only contract violations surface here.
use thiserror::Error;

/// Contract violations detected by the numeric core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregateError {
    #[error("neighbor list covers {neighbors} observations but {values} values were given")]
    LengthMismatch { values: usize, neighbors: usize },

    #[error("observation {observation} lists neighbor {neighbor}, outside [0, {n})")]
    NeighborOutOfRange {
        observation: usize,
        neighbor: usize,
        n: usize,
    },

    #[error("weight matrix has {weights} rows but there are {neighbors} neighbor lists")]
    WeightRowsMismatch { weights: usize, neighbors: usize },

    #[error("observation {observation} has {weights} weights for {neighbors} neighbors")]
    WeightRowTooShort {
        observation: usize,
        weights: usize,
        neighbors: usize,
    },

    /// Kernel weights list the observation itself but carry no trailing
    /// self-weight slot at `weights[i][neighbors[i].len()]`.
    #[error("observation {observation} lists itself but has no self-weight slot")]
    MissingSelfWeight { observation: usize },
}

/// Failures of the derived-column pipeline (lookups against the data store
/// and weights registry, plus wrapped core violations).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    #[error("unknown weights `{0}`")]
    UnknownWeights(String),

    #[error("column `{name}` has {len} rows, table has {rows}")]
    RaggedColumn { name: String, len: usize, rows: usize },

    #[error("{groups} join groups for a table of {rows} rows")]
    GroupCountMismatch { groups: usize, rows: usize },

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("invalid table JSON: {0}")]
    Json(#[from] serde_json::Error),
}
