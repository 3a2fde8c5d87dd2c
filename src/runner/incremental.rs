//! Staleness checks and output naming
//!
//! An object file is derived from its source by name alone, and it is only
//! rebuilt when it is missing or not strictly newer than the source. Headers
//! are not tracked.

use crate::error::{BuildError, ConfigError, ConfigResult, ExecutionError, ExecutionResult, Result};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Language of a source file, decided by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    C,
    Cpp,
}

impl SourceKind {
    /// Classify a path by its extension, case-insensitively
    pub fn of(path: &Path) -> Option<SourceKind> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "c" => Some(SourceKind::C),
            "cpp" | "cc" | "cxx" => Some(SourceKind::Cpp),
            _ => None,
        }
    }

    /// Like [`SourceKind::of`], but an unknown extension is a configuration defect
    pub fn require(path: &Path) -> ConfigResult<SourceKind> {
        SourceKind::of(path).ok_or_else(|| {
            ConfigError::UnsupportedExtension(
                path.extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            )
        })
    }
}

/// Whether a file name has a recognized source extension
pub fn is_source_file(name: &str) -> bool {
    SourceKind::of(Path::new(name)).is_some()
}

/// Derive the output path for `source` inside `target_dir`
///
/// The source's directory and extension are dropped and `ext` is appended,
/// so `src/utils/Foo.cpp` with `.o` becomes `<target_dir>/Foo.o`. Sources
/// with the same file stem in different directories map to the same output.
pub fn output_path(target_dir: &Path, source: &Path, ext: &str) -> ConfigResult<PathBuf> {
    if !ext.starts_with('.') {
        return Err(ConfigError::BadExtension(ext.to_string()));
    }
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(target_dir.join(format!("{}{}", stem, ext)))
}

/// Whether `output` exists and is strictly newer than `source`
///
/// Equal modification times count as stale. A missing source is an error.
pub fn is_up_to_date(source: &Path, output: &Path) -> Result<bool> {
    let source_meta = fs::metadata(source).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            BuildError::from(ExecutionError::MissingSource(source.to_path_buf()))
        }
        _ => BuildError::from(e),
    })?;

    let output_meta = match fs::metadata(output) {
        Ok(meta) => meta,
        Err(_) => return Ok(false),
    };

    Ok(output_meta.modified()? > source_meta.modified()?)
}

/// List the source files directly inside `dir`, minus `exclude`
///
/// Only regular files with a recognized extension are returned, sorted by
/// name so repeated runs compile in the same order.
pub fn select_sources(dir: &Path, exclude: &HashSet<String>) -> ExecutionResult<Vec<String>> {
    let list_err = |error| ExecutionError::ListDir {
        path: dir.to_path_buf(),
        error,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_source_file(&name) && !exclude.contains(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
