//! # bow testkit
//!
//! Test utilities for bow.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - Sample record types
//! - Property-based test generators using proptest
//! - A model-checking harness that mirrors a bucket in memory
//! - Concurrency and crash recovery helpers
//!
//! ## Usage
//!
//! ```rust
//! use bow_testkit::prelude::*;
//!
//! let db = TestDb::new();
//! db.bucket("arrows").put(&Arrow::new("123", 10)).unwrap();
//! assert_eq!(db.bucket("arrows").len().unwrap(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod models;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::models::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use models::*;
