//! JSON job files and their execution.
use std::collections::HashMap;

use anyhow::{Context, Result};
use geoda_core::{
    aggregate_joined, compute_lag, compute_median_lag, join_column, spatial_lag_columns, AggregationPolicy,
    JoinOperation, JoinRequest, LagRequest, SpatialWeights, Table, WeightsMeta,
};
use serde::{Deserialize, Serialize};

// ── Job files ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LagJob {
    pub values: Vec<f64>,
    pub weights: SpatialWeights,
    #[serde(default)]
    pub policy: AggregationPolicy,
}

#[derive(Debug, Deserialize)]
pub struct MedianLagJob {
    pub values: Vec<f64>,
    pub weights: SpatialWeights,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinJob {
    pub groups: Vec<Vec<f64>>,
    #[serde(default)]
    pub original_values: Vec<f64>,
    pub operation: JoinOperation,
}

#[derive(Debug, Deserialize)]
pub struct JoinSpec {
    #[serde(flatten)]
    pub request: JoinRequest,
    pub groups: Vec<Vec<f64>>,
}

/// A table, a weights registry, and the derived columns to add to it.
#[derive(Debug, Deserialize)]
pub struct DeriveJob {
    pub table: Table,
    #[serde(default)]
    pub weights: HashMap<String, SpatialWeights>,
    #[serde(default)]
    pub lag: Vec<LagRequest>,
    #[serde(default)]
    pub joins: Vec<JoinSpec>,
}

/// Per-observation output with the count of non-finite entries, so callers
/// see isolates and empty groups without scanning the column.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnOutput {
    pub values: Vec<f64>,
    pub non_finite: usize,
}

impl From<Vec<f64>> for ColumnOutput {
    fn from(values: Vec<f64>) -> Self {
        let non_finite = values.iter().filter(|v| !v.is_finite()).count();
        Self { values, non_finite }
    }
}

// ── Runners ───────────────────────────────────────────────────────────────────

pub fn parse<T: for<'de> Deserialize<'de>>(json: &str, what: &str) -> Result<T> {
    serde_json::from_str(json).with_context(|| format!("parsing {what} job"))
}

pub fn run_lag(job: &LagJob) -> Result<ColumnOutput> {
    let lag = compute_lag(&job.values, &job.weights, job.policy).context("spatial lag")?;
    Ok(lag.into())
}

pub fn run_median_lag(job: &MedianLagJob) -> Result<ColumnOutput> {
    let lag = compute_median_lag(&job.values, &job.weights).context("median spatial lag")?;
    Ok(lag.into())
}

pub fn run_join(job: &JoinJob) -> ColumnOutput {
    aggregate_joined(&job.groups, &job.original_values, &job.operation).into()
}

pub fn run_weights_meta(weights: &SpatialWeights) -> WeightsMeta {
    WeightsMeta::summarize(weights)
}

/// Apply every lag request, then every join, appending each result to the
/// table so later requests see earlier names.
pub fn run_derive(job: DeriveJob) -> Result<Table> {
    let DeriveJob { mut table, weights, lag, joins } = job;

    for req in &lag {
        let cols = spatial_lag_columns(&table, &weights, req)
            .with_context(|| format!("lag over weights `{}`", req.weights_id))?;
        for col in cols {
            tracing::info!(column = %col.name, "added lag column");
            table.push(col.into())?;
        }
    }
    for spec in &joins {
        let col = join_column(&table, &spec.groups, &spec.request)
            .with_context(|| format!("{} join of `{}`", spec.request.operation, spec.request.variable))?;
        tracing::info!(column = %col.name, "added join column");
        table.push(col.into())?;
    }
    Ok(table)
}
