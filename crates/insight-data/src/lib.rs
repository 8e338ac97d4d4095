//! Data ingestion and analysis layer for the sales & rentals insights.
//!
//! Responsible for fetching the remote JSON datasets, flattening and
//! exploding them into frames, cleaning monetary and date columns, and
//! running the sales and rental analyzers that feed the dashboard.

pub mod analysis;
pub mod frame;
pub mod loader;
pub mod rentals;
pub mod sales;

pub use insight_core as core;
