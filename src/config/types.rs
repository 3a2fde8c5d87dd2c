//! Core configuration types
//!
//! This module defines the data structures that represent a ccbuild.yml manifest.

use crate::runner::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level manifest structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Build name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Base context values visible to every task
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, ContextValue>,

    /// Tasks run in order
    #[serde(default)]
    pub tasks: Vec<TaskDef>,
}

/// A context value as written in YAML
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Int(i64),
    Str(String),
    List(Vec<String>),
}

impl From<ContextValue> for Value {
    fn from(value: ContextValue) -> Self {
        match value {
            ContextValue::Int(i) => Value::Int(i),
            ContextValue::Str(s) => Value::Str(s),
            ContextValue::List(items) => Value::List(items),
        }
    }
}

/// A task definition, selected by its `type` field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TaskDef {
    /// Create one directory
    Mkdir { dir: String },

    /// Create the directory named by `OUT_DIR`
    MkdirOut,

    /// Compile one source file
    #[serde(rename_all = "kebab-case")]
    Compile {
        file: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        include_dirs: Option<String>,
    },

    /// Compile the listed files of a directory
    #[serde(rename_all = "kebab-case")]
    CompileDir {
        dir: String,
        #[serde(default)]
        files: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        include_dirs: Option<String>,
    },

    /// Compile every source file of a directory except `exclude`
    #[serde(rename_all = "kebab-case")]
    CompileDirAll {
        dir: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        exclude: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        include_dirs: Option<String>,
    },

    /// Nested tasks with their own context overrides
    Group {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        context: BTreeMap<String, ContextValue>,
        #[serde(default)]
        tasks: Vec<TaskDef>,
    },
}

impl TaskDef {
    /// The `type` name of this task
    pub fn kind(&self) -> &'static str {
        match self {
            TaskDef::Mkdir { .. } => "mkdir",
            TaskDef::MkdirOut => "mkdir-out",
            TaskDef::Compile { .. } => "compile",
            TaskDef::CompileDir { .. } => "compile-dir",
            TaskDef::CompileDirAll { .. } => "compile-dir-all",
            TaskDef::Group { .. } => "group",
        }
    }
}
