//! Row-wise reduction of spatial-join match groups into a derived column.
//!
//! Each target row receives the values of every source row an external
//! spatial join matched to it. One reduction per group, no state shared
//! between groups.
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::stats::{median_of_sorted, sort_ascending};

/// Reduction applied to each join group.
///
/// Names outside the known set parse to [`JoinOperation::Unrecognized`],
/// which makes [`aggregate_joined`] hand back the original column unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JoinOperation {
    Count,
    Sum,
    Mean,
    Min,
    Max,
    Median,
    Unique,
    Unrecognized(String),
}

impl JoinOperation {
    /// Exact, case-sensitive match; never fails. Any other spelling
    /// (`"SUM"`, `" sum"`) is kept verbatim in `Unrecognized`.
    pub fn parse(name: &str) -> Self {
        match name {
            "count" => Self::Count,
            "sum" => Self::Sum,
            "mean" => Self::Mean,
            "min" => Self::Min,
            "max" => Self::Max,
            "median" => Self::Median,
            "unique" => Self::Unique,
            _ => Self::Unrecognized(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::Median => "median",
            Self::Unique => "unique",
            Self::Unrecognized(name) => name,
        }
    }

    /// Value produced for an empty group.
    ///
    /// | op     | empty group |
    /// |--------|-------------|
    /// | count  | 0           |
    /// | sum    | 0           |
    /// | mean   | NaN (0 / 0) |
    /// | min    | +∞          |
    /// | max    | −∞          |
    /// | median | 0           |
    /// | unique | 0           |
    ///
    /// `None` for an unrecognized operation, which never reduces.
    pub fn empty_value(&self) -> Option<f64> {
        match self {
            Self::Count | Self::Sum | Self::Median | Self::Unique => Some(0.0),
            Self::Mean => Some(f64::NAN),
            Self::Min => Some(f64::INFINITY),
            Self::Max => Some(f64::NEG_INFINITY),
            Self::Unrecognized(_) => None,
        }
    }

    /// Reduce one group. `None` for an unrecognized operation.
    pub fn reduce(&self, group: &[f64]) -> Option<f64> {
        if group.is_empty() {
            return self.empty_value();
        }
        let value = match self {
            Self::Count => group.len() as f64,
            Self::Sum => group.iter().sum(),
            Self::Mean => group.iter().sum::<f64>() / group.len() as f64,
            Self::Min => extremum(group, f64::INFINITY, f64::min),
            Self::Max => extremum(group, f64::NEG_INFINITY, f64::max),
            Self::Median => {
                let mut sorted = group.to_vec();
                sort_ascending(&mut sorted);
                median_of_sorted(&sorted).unwrap_or(0.0)
            }
            Self::Unique => distinct_count(group) as f64,
            Self::Unrecognized(_) => return None,
        };
        Some(value)
    }
}

impl fmt::Display for JoinOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for JoinOperation {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<JoinOperation> for String {
    fn from(op: JoinOperation) -> Self {
        op.as_str().to_string()
    }
}

/// Reduce every group with `op`, one output value per group.
///
/// An unrecognized operation returns `original_values` unchanged (and so
/// keeps the original column's length rather than the group count).
pub fn aggregate_joined(groups: &[Vec<f64>], original_values: &[f64], op: &JoinOperation) -> Vec<f64> {
    if let JoinOperation::Unrecognized(name) = op {
        warn!(operation = %name, "unrecognized join operation, passing original values through");
        return original_values.to_vec();
    }
    debug!(groups = groups.len(), operation = %op, "aggregating join groups");

    groups
        .iter()
        .map(|g| op.reduce(g).unwrap_or(f64::NAN))
        .collect()
}

/// Min/max that propagates NaN instead of skipping it.
fn extremum(group: &[f64], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    if group.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    group.iter().copied().fold(init, pick)
}

/// Distinct values by bit pattern, with `-0.0` folded into `0.0` and every
/// NaN folded into one.
fn distinct_count(group: &[f64]) -> usize {
    group
        .iter()
        .map(|&v| {
            if v.is_nan() {
                f64::NAN.to_bits()
            } else if v == 0.0 {
                0f64.to_bits()
            } else {
                v.to_bits()
            }
        })
        .collect::<HashSet<u64>>()
        .len()
}
