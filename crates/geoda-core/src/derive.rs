//! Derived-column pipeline: look up inputs, aggregate, name the result.
//!
//! The output columns are flat, row-aligned value vectors. Inserting them
//! into the database or the map layer is left to the caller.
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PipelineError;
use crate::join::{aggregate_joined, JoinOperation};
use crate::lag::{compute_lag, compute_median_lag, AggregationPolicy};
use crate::naming::{derive_column_name, VariableDescriptor};
use crate::table::{Column, ColumnStore};
use crate::weights::WeightsProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LagMethod {
    #[default]
    Mean,
    Median,
}

impl LagMethod {
    /// Operation prefix used when naming the derived column.
    pub fn column_prefix(self) -> &'static str {
        match self {
            LagMethod::Mean => "lag",
            LagMethod::Median => "median_lag",
        }
    }
}

/// Spatial lag of one or more variables over a single weights id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LagRequest {
    pub variables: Vec<String>,
    pub weights_id: String,
    #[serde(default)]
    pub method: LagMethod,
    /// Ignored by the median method.
    #[serde(default)]
    pub policy: AggregationPolicy,
}

/// Reduce spatial-join groups of `variable` into a new column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub variable: String,
    pub operation: JoinOperation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedColumn {
    pub name: String,
    pub values: Vec<f64>,
}

impl From<DerivedColumn> for Column {
    fn from(d: DerivedColumn) -> Self {
        Column { name: d.name, values: d.values }
    }
}

/// One lag column per requested variable, in request order.
///
/// Names assigned earlier in the same request count as existing variables
/// for later ones.
pub fn spatial_lag_columns<S, P>(store: &S, provider: &P, req: &LagRequest) -> Result<Vec<DerivedColumn>, PipelineError>
where
    S: ColumnStore + ?Sized,
    P: WeightsProvider + ?Sized,
{
    let w = provider
        .weights(&req.weights_id)
        .ok_or_else(|| PipelineError::UnknownWeights(req.weights_id.clone()))?;
    let mut registry = store.variables();
    let mut out = Vec::with_capacity(req.variables.len());

    for variable in &req.variables {
        let values = store
            .column(variable)
            .ok_or_else(|| PipelineError::UnknownColumn(variable.clone()))?;
        let lagged = match req.method {
            LagMethod::Mean => compute_lag(values, w, req.policy)?,
            LagMethod::Median => compute_median_lag(values, w)?,
        };
        let name = derive_column_name(variable, req.method.column_prefix(), &registry);
        debug!(variable = %variable, column = %name, weights = %req.weights_id, "derived lag column");

        registry.push(VariableDescriptor::numeric(&name));
        out.push(DerivedColumn { name, values: lagged });
    }
    Ok(out)
}

/// Reduce `groups` (one per table row) with the requested operation.
///
/// `variable` must name a column of the table; that column is the
/// pass-through result for an unrecognized operation.
pub fn join_column<S>(store: &S, groups: &[Vec<f64>], req: &JoinRequest) -> Result<DerivedColumn, PipelineError>
where
    S: ColumnStore + ?Sized,
{
    if groups.len() != store.num_rows() {
        return Err(PipelineError::GroupCountMismatch { groups: groups.len(), rows: store.num_rows() });
    }
    let original = store
        .column(&req.variable)
        .ok_or_else(|| PipelineError::UnknownColumn(req.variable.clone()))?;
    let values = aggregate_joined(groups, original, &req.operation);
    let name = derive_column_name(&req.variable, req.operation.as_str(), &store.variables());
    Ok(DerivedColumn { name, values })
}
