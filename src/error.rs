//! Error types for ccbuild
//!
//! Errors fall into two tiers. Configuration defects are mistakes in the build
//! definition and are never retried. Operational failures happen while running
//! a well-formed build, such as a compiler exiting nonzero.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ccbuild operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Main error type for ccbuild
#[derive(Error, Debug)]
pub enum BuildError {
    /// Build definition errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task execution errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Variable interpolation errors
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl BuildError {
    /// Whether this error is a defect in the build definition rather than a
    /// failure of a well-formed build
    pub fn is_config_defect(&self) -> bool {
        matches!(
            self,
            BuildError::Config(_) | BuildError::Interpolation(_) | BuildError::Yaml(_)
        )
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        if self.is_config_defect() {
            2
        } else {
            1
        }
    }
}

/// Configuration parsing and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Context value for '{0}' is not set")]
    MissingKey(String),

    #[error("Context value for '{key}' is not a {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("Task '{0}' was given an empty directory")]
    EmptyDirectory(&'static str),

    #[error("Unsupported source file extension: '{0}'")]
    UnsupportedExtension(String),

    #[error("Output extension '{0}' must start with '.'")]
    BadExtension(String),

    #[error("Invalid definition '{0}', expected KEY=VALUE")]
    InvalidDefine(String),
}

/// Task execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("{program} failed with exit code {code:?} compiling {}", .source_file.display())]
    CompileFailed {
        program: String,
        source_file: PathBuf,
        code: Option<i32>,
    },

    #[error("Failed to launch '{program}': {error}")]
    Spawn { program: String, error: io::Error },

    #[error("Source file '{}' does not exist", .0.display())]
    MissingSource(PathBuf),

    #[error("Failed to list directory '{}': {error}", .path.display())]
    ListDir { path: PathBuf, error: io::Error },

    #[error("Failed to create directory '{}': {error}", .path.display())]
    CreateDir { path: PathBuf, error: io::Error },
}

/// Variable interpolation errors
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("Recursive interpolation detected")]
    RecursiveInterpolation,
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;
