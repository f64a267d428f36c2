//! Cost-of-goods-manufactured report engine: ingest a cost table, validate
//! it, filter it and compute per-lot / per-gram / per-unit cost metrics.

pub mod config;
pub mod data;
pub mod format;
