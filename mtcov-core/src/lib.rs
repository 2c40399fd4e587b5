//! # Core models and utilities for mtcov.
//!
//! This crate holds the pieces shared by every stage of the coverage pipeline: the
//! [`ReferenceCatalog`](models::ReferenceCatalog) that maps sequence names to their
//! lengths, the [`StrandKey`](models::StrandKey) that partitions all depth accounting,
//! the [`Fragment`](models::Fragment) emitted by the record filter, and the error type.
//!
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::{CoverageError, Result};
