//! Naming of derived columns against the table's variable registry.
use serde::{Deserialize, Serialize};

/// Declared column type in the variable registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VariableType {
    Numeric,
    Integer,
    String,
    Boolean,
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDescriptor {
    pub variable_name: String,
    pub variable_type: VariableType,
}

impl VariableDescriptor {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self { variable_name: name.into(), variable_type: VariableType::Numeric }
    }
}

/// `"<operation>_<variable>"`, with `"_1"` appended if that name is taken.
///
/// Only one suffix is ever tried: when `"<operation>_<variable>_1"` also
/// exists the returned name collides with it.
pub fn derive_column_name(variable: &str, operation: &str, existing: &[VariableDescriptor]) -> String {
    let candidate = format!("{operation}_{variable}");
    if existing.iter().any(|d| d.variable_name == candidate) {
        format!("{candidate}_1")
    } else {
        candidate
    }
}
