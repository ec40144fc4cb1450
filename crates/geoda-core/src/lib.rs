//! Neighbor-weighted aggregation for spatial data exploration.
//!
//! - [`lag`]: mean-style spatial lag (binary or weighted) and median lag.
//! - [`join`]: reductions over spatial-join match groups.
//! - [`naming`]: collision-aware names for derived columns.
//! - [`derive`]: ties the above to a column store and a weights registry.
//!
//! Every operation is pure and synchronous over in-memory slices.
pub mod derive;
pub mod error;
pub mod join;
pub mod lag;
pub mod naming;
pub mod stats;
pub mod table;
pub mod weights;

pub use derive::{join_column, spatial_lag_columns, DerivedColumn, JoinRequest, LagMethod, LagRequest};
pub use error::{AggregateError, PipelineError};
pub use join::{aggregate_joined, JoinOperation};
pub use lag::{compute_lag, compute_median_lag, AggregationPolicy};
pub use naming::{derive_column_name, VariableDescriptor, VariableType};
pub use table::{Column, ColumnStore, Table};
pub use weights::{SpatialWeights, WeightsKind, WeightsMeta, WeightsProvider};
