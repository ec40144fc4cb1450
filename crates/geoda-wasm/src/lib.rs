//! Browser bindings for the aggregation core.
//!
//! Numeric columns cross the boundary as `Float64Array`; topology, policies
//! and registries as JSON strings or plain JS objects.
use anyhow::{Context, Result};
use geoda_core::{
    aggregate_joined, compute_lag, compute_median_lag, derive_column_name, AggregationPolicy, JoinOperation,
    SpatialWeights, VariableDescriptor, WeightsMeta,
};
use wasm_bindgen::prelude::*;

fn to_js(err: anyhow::Error) -> JsValue {
    js_sys::Error::new(&format!("{err:#}")).into()
}

fn parse_weights(weights_json: &str) -> Result<SpatialWeights> {
    serde_json::from_str(weights_json).context("invalid weights JSON")
}

fn parse_policy(policy_json: &str) -> Result<AggregationPolicy> {
    if policy_json.trim().is_empty() {
        return Ok(AggregationPolicy::default());
    }
    serde_json::from_str(policy_json).context("invalid policy JSON")
}

fn lag_impl(values: &[f64], weights_json: &str, policy_json: &str) -> Result<Vec<f64>> {
    let w = parse_weights(weights_json)?;
    let policy = parse_policy(policy_json)?;
    Ok(compute_lag(values, &w, policy)?)
}

fn median_lag_impl(values: &[f64], weights_json: &str) -> Result<Vec<f64>> {
    let w = parse_weights(weights_json)?;
    Ok(compute_median_lag(values, &w)?)
}

/// Mean-style spatial lag. An empty `policy_json` selects the default
/// (row-standardised, self excluded).
#[wasm_bindgen(js_name = spatialLag)]
pub fn spatial_lag(values: Vec<f64>, weights_json: &str, policy_json: &str) -> Result<Vec<f64>, JsValue> {
    lag_impl(&values, weights_json, policy_json).map_err(to_js)
}

/// Median of neighbor values; isolates come back as `NaN`.
#[wasm_bindgen(js_name = medianSpatialLag)]
pub fn median_spatial_lag(values: Vec<f64>, weights_json: &str) -> Result<Vec<f64>, JsValue> {
    median_lag_impl(&values, weights_json).map_err(to_js)
}

/// Reduce join groups (`number[][]`) with the named operation. Unknown names
/// return `original_values` unchanged.
#[wasm_bindgen(js_name = joinAggregate)]
pub fn join_aggregate(groups: JsValue, original_values: Vec<f64>, operation: &str) -> Result<Vec<f64>, JsValue> {
    let groups: Vec<Vec<f64>> = serde_wasm_bindgen::from_value(groups)?;
    Ok(aggregate_joined(&groups, &original_values, &JoinOperation::parse(operation)))
}

/// Name for a new derived column given the existing `VariableDescriptor[]`.
#[wasm_bindgen(js_name = deriveColumnName)]
pub fn derive_name(variable: &str, operation: &str, existing: JsValue) -> Result<String, JsValue> {
    let existing: Vec<VariableDescriptor> = serde_wasm_bindgen::from_value(existing)?;
    Ok(derive_column_name(variable, operation, &existing))
}

/// Cardinality summary of a weights object.
#[wasm_bindgen(js_name = weightsMeta)]
pub fn weights_meta(weights_json: &str) -> Result<JsValue, JsValue> {
    let w = parse_weights(weights_json).map_err(to_js)?;
    Ok(serde_wasm_bindgen::to_value(&WeightsMeta::summarize(&w))?)
}
