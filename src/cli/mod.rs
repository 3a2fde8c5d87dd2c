//! CLI interface and argument parsing
//!
//! This module handles command-line parsing and turns a manifest into a
//! running build.

pub mod app;

// Re-export main types
pub use app::*;
