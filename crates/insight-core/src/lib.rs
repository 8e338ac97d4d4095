//! Core domain layer for the sales & rentals insights pipeline.
//!
//! Holds the shared models (loader configuration, typed records, report
//! structures), the error type, the monetary/date value processors, and the
//! field validators used during cleaning.

pub mod error;
pub mod models;
pub mod processors;
pub mod validators;

pub use error::{InsightError, Result};
