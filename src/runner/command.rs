//! Compiler invocation
//!
//! This is the only place that launches external processes. Everything else
//! talks to a [`Compiler`], which turns one source file into one object file.

use crate::error::{ConfigResult, ExecutionError};
use crate::runner::{Context, SourceKind, TaskFailure, TaskOutput, TaskResult, CC, CFLAGS, CXX};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};

/// C compiler used when the context does not name one
pub const DEFAULT_CC: &str = "cc";

/// C++ compiler used when the context does not name one
pub const DEFAULT_CXX: &str = "c++";

/// Compiles one source file into one output file
pub trait Compiler: Send + Sync {
    /// `include_dirs` is a ';' separated list of include directories
    fn compile(&self, source: &Path, output: &Path, include_dirs: &str, ctx: &Context)
        -> TaskResult;
}

/// Runs the compiler program named by the `CC` or `CXX` context values
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalCompiler;

impl Compiler for ExternalCompiler {
    fn compile(
        &self,
        source: &Path,
        output: &Path,
        include_dirs: &str,
        ctx: &Context,
    ) -> TaskResult {
        let program = compiler_program(source, ctx)?;
        let flags = compiler_flags(ctx)?;
        let args = compile_args(source, output, include_dirs, flags);

        ctx.print_info("RUN", &command_line(&program, &args));

        let result = StdCommand::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|error| ExecutionError::Spawn {
                program: program.to_string_lossy().into_owned(),
                error,
            })?;

        let captured = TaskOutput::new(result.stdout, result.stderr);
        if !result.status.success() {
            return Err(TaskFailure::new(
                ExecutionError::CompileFailed {
                    program: program.to_string_lossy().into_owned(),
                    source_file: source.to_path_buf(),
                    code: result.status.code(),
                },
                captured,
            ));
        }

        Ok(captured)
    }
}

/// Pick the compiler program for a source file
pub fn compiler_program(source: &Path, ctx: &Context) -> ConfigResult<OsString> {
    let (key, default) = match SourceKind::require(source)? {
        SourceKind::C => (CC, DEFAULT_CC),
        SourceKind::Cpp => (CXX, DEFAULT_CXX),
    };
    if !ctx.contains(key) {
        return Ok(OsString::from(default));
    }
    Ok(ctx.require_path(key)?.as_os_str().to_os_string())
}

/// Extra flags from `CFLAGS`, which must be a list when set
pub fn compiler_flags(ctx: &Context) -> ConfigResult<&[String]> {
    if !ctx.contains(CFLAGS) {
        return Ok(&[]);
    }
    ctx.require_list(CFLAGS)
}

/// Build the argument list `[-I dir]* [flags]* -o output -c source`
pub fn compile_args(
    source: &Path,
    output: &Path,
    include_dirs: &str,
    flags: &[String],
) -> Vec<OsString> {
    let mut args = Vec::new();
    for dir in include_dirs.split(';').filter(|d| !d.is_empty()) {
        args.push(OsString::from("-I"));
        args.push(OsString::from(dir));
    }
    args.extend(flags.iter().map(OsString::from));
    args.push(OsString::from("-o"));
    args.push(output.as_os_str().to_os_string());
    args.push(OsString::from("-c"));
    args.push(source.as_os_str().to_os_string());
    args
}

/// Render a command line for display
pub fn command_line(program: &OsString, args: &[OsString]) -> String {
    std::iter::once(program)
        .chain(args)
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
