//! ccbuild - a minimal incremental C/C++ build driver
//!
//! A YAML manifest names a base context and a list of tasks. Tasks run in
//! order, each receiving its own copy of the context, and compile tasks skip
//! any source whose object file is already newer than it.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;

// Re-export commonly used types
pub use error::{BuildError, Result};

/// Current version of ccbuild
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
