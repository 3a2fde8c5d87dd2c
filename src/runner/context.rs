//! Execution context for task running
//!
//! The context is a key/value store threaded down the task tree. Values start
//! from a globally visible baseline and a group of tasks can override some of
//! them for its children only. Every composite hands each child its own
//! duplicate, so overrides never leak to siblings or back to the parent.

use crate::error::{ConfigError, ConfigResult};
use colored::Colorize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Key holding the output directory for compiled objects
pub const OUT_DIR: &str = "OUT_DIR";

/// Key holding the C compiler program
pub const CC: &str = "CC";

/// Key holding the C++ compiler program
pub const CXX: &str = "CXX";

/// Key holding the object file extension, including the leading '.'
pub const OBJ_EXT: &str = "OBJ_EXT";

/// Key holding the default semicolon-separated include directories
pub const INCLUDE_DIRS: &str = "INCLUDE_DIRS";

/// Key holding extra compiler arguments
pub const CFLAGS: &str = "CFLAGS";

/// A context value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Path(PathBuf),
    Int(i64),
    List(Vec<String>),
}

impl Value {
    /// Human readable type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Path(_) => "path",
            Value::Int(_) => "integer",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Path(p) => write!(f, "{}", p.display()),
            Value::Int(i) => write!(f, "{}", i),
            Value::List(items) => f.write_str(&items.join(";")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<PathBuf> for Value {
    fn from(p: PathBuf) -> Self {
        Value::Path(p)
    }
}

impl From<&Path> for Value {
    fn from(p: &Path) -> Self {
        Value::Path(p.to_path_buf())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

/// Execution context passed to every task
#[derive(Debug, Clone)]
pub struct Context {
    vars: HashMap<String, Value>,

    /// Verbosity level
    pub verbosity: Verbosity,

    /// Report stale files without compiling or creating directories
    pub dry_run: bool,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Context {
            vars: HashMap::new(),
            verbosity: Verbosity::Normal,
            dry_run: false,
        }
    }

    /// Set a value, builder style
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set a single value, replacing any previous one
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Remove a value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.vars.remove(key)
    }

    /// Copy of this context that can be changed without affecting the original
    pub fn duplicate(&self) -> Context {
        self.clone()
    }

    /// Apply every override on top of the current values
    pub fn extend<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.vars.extend(overrides);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Get a value of any type
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    /// Get a string value. Other types read as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.vars.get(key) {
            Some(Value::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Get a path. String values are accepted as paths.
    pub fn get_path(&self, key: &str) -> Option<&Path> {
        match self.vars.get(key) {
            Some(Value::Path(p)) => Some(p),
            Some(Value::Str(s)) => Some(Path::new(s)),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.vars.get(key) {
            Some(Value::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        match self.vars.get(key) {
            Some(Value::List(items)) => Some(items),
            _ => None,
        }
    }

    /// Get a value that the build cannot proceed without
    pub fn get_required(&self, key: &str) -> ConfigResult<&Value> {
        self.vars
            .get(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    pub fn require_str(&self, key: &str) -> ConfigResult<&str> {
        match self.get_required(key)? {
            Value::Str(s) => Ok(s),
            _ => Err(wrong_type(key, "string")),
        }
    }

    pub fn require_path(&self, key: &str) -> ConfigResult<&Path> {
        match self.get_required(key)? {
            Value::Path(p) if !p.as_os_str().is_empty() => Ok(p),
            Value::Str(s) if !s.is_empty() => Ok(Path::new(s)),
            _ => Err(wrong_type(key, "path")),
        }
    }

    pub fn require_list(&self, key: &str) -> ConfigResult<&[String]> {
        match self.get_required(key)? {
            Value::List(items) => Ok(items),
            _ => Err(wrong_type(key, "list")),
        }
    }

    /// Flatten every value to a string, for interpolation
    pub fn string_vars(&self) -> HashMap<String, String> {
        self.vars
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    /// Print info message
    pub fn print_info(&self, label: &str, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}", format!("[{}]", label).cyan().bold(), message);
        }
    }

    /// Print warning message
    pub fn print_warning(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}", "[WARN]".yellow().bold(), message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("{} {}", "[ERROR]".red().bold(), message);
        }
    }

    /// Print debug message (only in verbose mode)
    pub fn print_debug(&self, label: &str, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            eprintln!("{} {}", format!("[{}]", label).dimmed(), message);
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

fn wrong_type(key: &str, expected: &'static str) -> ConfigError {
    ConfigError::WrongType {
        key: key.to_string(),
        expected,
    }
}
