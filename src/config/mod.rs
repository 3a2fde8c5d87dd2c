//! Build manifest parsing and validation
//!
//! This module handles parsing of ccbuild.yml manifests, which name the
//! base context and the tasks to run, and validation of their structure.

pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use types::*;
