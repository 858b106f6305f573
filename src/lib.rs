//! Keyword trend reports.
//!
//! Fuses a relative daily search-interest index, demographic slices, absolute monthly query
//! volume and related-keyword candidates into one [`DailyReport`](models::DailyReport).
//!
//! - [`source`]: collaborators that fetch raw series ([`source::TrendDataSource`])
//! - [`engine`]: pure aggregation: normalize, redistribute, rank, assemble
//! - [`pipeline`]: concurrent all-or-nothing fetch followed by assembly

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod source;
pub mod utils;

pub use error::{FetchError, TrendError, TrendResult};
