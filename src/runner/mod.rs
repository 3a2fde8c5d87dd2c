//! Task execution engine
//!
//! This module handles the execution of tasks: context propagation,
//! sequencing, staleness checks, and compiler invocation.

pub mod command;
pub mod compile;
pub mod context;
pub mod incremental;
pub mod interpolate;
pub mod task;
pub mod tree;

// Re-export main types
pub use command::*;
pub use compile::*;
pub use context::*;
pub use incremental::*;
pub use interpolate::*;
pub use task::*;
pub use tree::*;
