//! In-memory column store standing in for the analytical database.
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::naming::VariableDescriptor;

/// Read access to numeric columns and the variable registry.
pub trait ColumnStore {
    fn num_rows(&self) -> usize;
    fn column(&self, name: &str) -> Option<&[f64]>;
    fn variables(&self) -> Vec<VariableDescriptor>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Ordered numeric columns of equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
}

#[derive(Deserialize)]
struct RawTable {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, rejecting columns whose length differs from the first.
    pub fn new(columns: Vec<Column>) -> Result<Self, PipelineError> {
        let mut table = Self::default();
        for col in columns {
            table.push(col)?;
        }
        Ok(table)
    }

    /// Parse `{"columns": [{"name": ..., "values": [...]}, ...]}`.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let raw: RawTable = serde_json::from_str(json)?;
        Self::new(raw.columns)
    }

    /// Append a column. Names are not deduplicated here; see
    /// [`crate::naming::derive_column_name`].
    pub fn push(&mut self, col: Column) -> Result<(), PipelineError> {
        if let Some(first) = self.columns.first() {
            if col.values.len() != first.values.len() {
                return Err(PipelineError::RaggedColumn {
                    name: col.name,
                    len: col.values.len(),
                    rows: first.values.len(),
                });
            }
        }
        self.columns.push(col);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

impl ColumnStore for Table {
    fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.values.as_slice())
    }

    fn variables(&self) -> Vec<VariableDescriptor> {
        self.columns.iter().map(|c| VariableDescriptor::numeric(&c.name)).collect()
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = RawTable::deserialize(d)?;
        Table::new(raw.columns).map_err(serde::de::Error::custom)
    }
}
