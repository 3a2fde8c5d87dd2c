//! Manifest validation
//!
//! Catches mistakes in the build definition before any task runs, so a bad
//! manifest never gets as far as launching a compiler.

use crate::config::types::{Config, ContextValue, TaskDef};
use crate::error::{ConfigError, ConfigResult};
use crate::runner::{is_source_file, CFLAGS, OBJ_EXT};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Validate a complete manifest
///
/// Returns warnings for problems that do not stop the build, such as two
/// sources that would write the same object file.
pub fn validate_config(config: &Config) -> ConfigResult<Vec<String>> {
    validate_context(&config.context)?;

    let mut outputs = HashMap::new();
    let mut warnings = Vec::new();
    for task in &config.tasks {
        validate_task(task, &mut outputs, &mut warnings)?;
    }

    Ok(warnings)
}

/// Validate context values with a fixed meaning
fn validate_context(context: &BTreeMap<String, ContextValue>) -> ConfigResult<()> {
    match context.get(OBJ_EXT) {
        None => {}
        Some(ContextValue::Str(ext)) if ext.starts_with('.') => {}
        Some(ContextValue::Str(ext)) => return Err(ConfigError::BadExtension(ext.clone())),
        Some(_) => {
            return Err(ConfigError::WrongType {
                key: OBJ_EXT.to_string(),
                expected: "string",
            })
        }
    }

    match context.get(CFLAGS) {
        None | Some(ContextValue::List(_)) => Ok(()),
        Some(_) => Err(ConfigError::WrongType {
            key: CFLAGS.to_string(),
            expected: "list",
        }),
    }
}

/// Validate a single task definition, recursing into groups
pub fn validate_task(
    task: &TaskDef,
    outputs: &mut HashMap<String, String>,
    warnings: &mut Vec<String>,
) -> ConfigResult<()> {
    match task {
        TaskDef::Mkdir { dir } => require_dir("mkdir", dir),
        TaskDef::MkdirOut => Ok(()),
        TaskDef::Compile { file, .. } => {
            if file.is_empty() {
                return Err(ConfigError::Invalid("compile task needs a file".to_string()));
            }
            check_source(file, outputs, warnings)
        }
        TaskDef::CompileDir { dir, files, .. } => {
            require_dir("compile-dir", dir)?;
            for file in files {
                check_source(&format!("{}/{}", dir, file), outputs, warnings)?;
            }
            Ok(())
        }
        TaskDef::CompileDirAll { dir, .. } => require_dir("compile-dir-all", dir),
        TaskDef::Group { context, tasks, .. } => {
            validate_context(context)?;
            for task in tasks {
                validate_task(task, outputs, warnings)?;
            }
            Ok(())
        }
    }
}

fn require_dir(kind: &'static str, dir: &str) -> ConfigResult<()> {
    if dir.trim().is_empty() {
        return Err(ConfigError::EmptyDirectory(kind));
    }
    Ok(())
}

/// Check an explicitly named source and record the object file it produces
fn check_source(
    file: &str,
    outputs: &mut HashMap<String, String>,
    warnings: &mut Vec<String>,
) -> ConfigResult<()> {
    // names built from context values are only known at run time
    if file.contains("${") {
        return Ok(());
    }

    let path = Path::new(file);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !is_source_file(&name) {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Err(ConfigError::UnsupportedExtension(ext));
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if let Some(previous) = outputs.get(&stem) {
        if previous != file {
            warnings.push(format!(
                "{} and {} both compile to {}",
                previous, file, stem
            ));
        }
    } else {
        outputs.insert(stem, file.to_string());
    }

    Ok(())
}
