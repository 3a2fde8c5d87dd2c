//! Compile tasks
//!
//! Each variant resolves a list of source files and compiles the stale ones
//! into the output directory, one at a time.

use crate::error::{ConfigError, Result};
use crate::runner::{
    compiler_flags, interpolate, interpolate_list, is_up_to_date, output_path, select_sources,
    Compiler, Context, SourceKind, Task, TaskFailure, TaskOutput, TaskResult, INCLUDE_DIRS,
    OBJ_EXT, OUT_DIR,
};
use crate::runner::task::resolve_dir;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Object file extension used when `OBJ_EXT` is not set
pub const DEFAULT_OBJ_EXT: &str = ".o";

/// Include directories for a task: its own list, else the context default
fn resolve_include_dirs(own: Option<&str>, ctx: &Context) -> Result<String> {
    match own {
        Some(dirs) => Ok(interpolate(dirs, ctx)?),
        None => match ctx.get(INCLUDE_DIRS) {
            Some(value) => Ok(interpolate(&value.to_string(), ctx)?),
            None => Ok(String::new()),
        },
    }
}

/// Compile every stale file in `sources`
///
/// Outputs of successful compiles are combined. On failure the output
/// gathered so far travels with the error.
fn compile_sources(
    sources: &[PathBuf],
    include_dirs: &str,
    compiler: &dyn Compiler,
    ctx: &Context,
) -> TaskResult {
    let out_dir = ctx.require_path(OUT_DIR)?;
    let ext = match ctx.get(OBJ_EXT) {
        Some(_) => ctx.require_str(OBJ_EXT)?,
        None => DEFAULT_OBJ_EXT,
    };
    compiler_flags(ctx)?;

    // resolve every name first so a bad definition fails before any process runs
    let mut jobs = Vec::with_capacity(sources.len());
    for src in sources {
        SourceKind::require(src)?;
        jobs.push((src, output_path(out_dir, src, ext)?));
    }

    let mut combined = TaskOutput::default();
    for (src, dst) in jobs {
        if is_up_to_date(src, &dst).map_err(|e| TaskFailure::new(e, combined.clone()))? {
            ctx.print_debug("SKIP", &format!("{} is up to date", src.display()));
            continue;
        }
        if ctx.dry_run {
            ctx.print_info("STALE", &src.display().to_string());
            continue;
        }
        match compiler.compile(src, &dst, include_dirs, ctx) {
            Ok(output) => combined.append(output),
            Err(mut failure) => {
                let mut output = combined;
                output.append(failure.output);
                failure.output = output;
                return Err(failure);
            }
        }
    }

    Ok(combined)
}

/// Compiles a single source file
pub struct CompileFileTask {
    /// Source path, may reference context values as `${KEY}`
    pub file: String,
    pub include_dirs: Option<String>,
    compiler: Arc<dyn Compiler>,
    ctx: Context,
}

impl CompileFileTask {
    pub fn new(file: impl Into<String>, compiler: Arc<dyn Compiler>) -> Self {
        CompileFileTask {
            file: file.into(),
            include_dirs: None,
            compiler,
            ctx: Context::new(),
        }
    }

    pub fn with_include_dirs(mut self, dirs: impl Into<String>) -> Self {
        self.include_dirs = Some(dirs.into());
        self
    }
}

impl Task for CompileFileTask {
    fn describe(&self) -> String {
        format!("compile {}", self.file)
    }

    fn set_context(&mut self, ctx: Context) {
        self.ctx = ctx;
    }

    fn run(&mut self) -> TaskResult {
        if self.file.is_empty() {
            return Err(ConfigError::Invalid("compile task needs a file".to_string()).into());
        }
        let file = PathBuf::from(interpolate(&self.file, &self.ctx)?);
        let include_dirs = resolve_include_dirs(self.include_dirs.as_deref(), &self.ctx)?;
        compile_sources(&[file], &include_dirs, self.compiler.as_ref(), &self.ctx)
    }
}

/// Compiles a fixed list of files found in one directory
pub struct CompileDirTask {
    pub dir: String,
    pub files: Vec<String>,
    pub include_dirs: Option<String>,
    compiler: Arc<dyn Compiler>,
    ctx: Context,
}

impl CompileDirTask {
    pub fn new(dir: impl Into<String>, files: Vec<String>, compiler: Arc<dyn Compiler>) -> Self {
        CompileDirTask {
            dir: dir.into(),
            files,
            include_dirs: None,
            compiler,
            ctx: Context::new(),
        }
    }

    pub fn with_include_dirs(mut self, dirs: impl Into<String>) -> Self {
        self.include_dirs = Some(dirs.into());
        self
    }
}

impl Task for CompileDirTask {
    fn describe(&self) -> String {
        format!("compile {} files in {}", self.files.len(), self.dir)
    }

    fn set_context(&mut self, ctx: Context) {
        self.ctx = ctx;
    }

    fn run(&mut self) -> TaskResult {
        let dir = resolve_dir("compile-dir", &self.dir, &self.ctx)?;
        let sources: Vec<PathBuf> = interpolate_list(&self.files, &self.ctx)?
            .iter()
            .map(|f| dir.join(f))
            .collect();
        let include_dirs = resolve_include_dirs(self.include_dirs.as_deref(), &self.ctx)?;
        compile_sources(&sources, &include_dirs, self.compiler.as_ref(), &self.ctx)
    }
}

/// Compiles every C and C++ file in a directory, minus an exclude list
pub struct CompileDirAllTask {
    pub dir: String,
    pub exclude: HashSet<String>,
    pub include_dirs: Option<String>,
    compiler: Arc<dyn Compiler>,
    ctx: Context,
}

impl CompileDirAllTask {
    pub fn new(dir: impl Into<String>, compiler: Arc<dyn Compiler>) -> Self {
        CompileDirAllTask {
            dir: dir.into(),
            exclude: HashSet::new(),
            include_dirs: None,
            compiler,
            ctx: Context::new(),
        }
    }

    pub fn with_exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_include_dirs(mut self, dirs: impl Into<String>) -> Self {
        self.include_dirs = Some(dirs.into());
        self
    }
}

impl Task for CompileDirAllTask {
    fn describe(&self) -> String {
        format!("compile all in {}", self.dir)
    }

    fn set_context(&mut self, ctx: Context) {
        self.ctx = ctx;
    }

    fn run(&mut self) -> TaskResult {
        let dir = resolve_dir("compile-dir-all", &self.dir, &self.ctx)?;
        // fail on a missing OUT_DIR before touching the filesystem
        self.ctx.require_path(OUT_DIR)?;

        let sources: Vec<PathBuf> = select_sources(&dir, &self.exclude)?
            .iter()
            .map(|f| dir.join(f))
            .collect();
        let include_dirs = resolve_include_dirs(self.include_dirs.as_deref(), &self.ctx)?;
        compile_sources(&sources, &include_dirs, self.compiler.as_ref(), &self.ctx)
    }
}
