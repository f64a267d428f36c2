//! Data layer: core types, loading, normalization, validation, filtering
//! and aggregation.
//!
//! Architecture:
//! ```text
//!  .csv / .xlsx / .parquet / .json
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → CostTable (headers as written)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ normalize  │  canonical headers, numeric coercion
//!   └───────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  schema   │  required columns → CostColumns | MissingColumns
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  FilterSpec → row indices
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ metrics   │  RowSubset + Metric → MetricResult
//!   └──────────┘
//! ```
//!
//! [`pipeline`] ties the stages together and reports to a `ReportSink`.

pub mod filter;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod schema;
