//! Main CLI application

use crate::config::{load_env_file, parse_config_auto, parse_config_file, validate_config, Config};
use crate::error::{BuildError, ConfigError};
use crate::runner::{
    base_context, build_tree, Context, ExternalCompiler, Task, Verbosity, CFLAGS, OUT_DIR,
};
use crate::VERSION;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// CLI application
pub struct App {
    /// Parsed manifest
    config: Config,
    /// Manifest file path
    config_path: PathBuf,
}

impl App {
    /// Create a new app from the manifest found by discovery
    pub fn new() -> Result<Self, BuildError> {
        let (config, config_path) = parse_config_auto()?;
        Ok(App {
            config,
            config_path,
        })
    }

    /// Create app with a specific manifest file
    pub fn with_config_file(path: PathBuf) -> Result<Self, BuildError> {
        let config = parse_config_file(&path)?;
        Ok(App {
            config,
            config_path: path,
        })
    }

    /// Run the build with parsed command line arguments
    pub fn run(self, matches: &ArgMatches) -> Result<(), BuildError> {
        let verbosity = get_verbosity(matches);
        let reporter = Context::new().with_verbosity(verbosity);

        for warning in validate_config(&self.config)? {
            reporter.print_warning(&warning);
        }

        load_env_file(&self.config_path)?;
        let ctx = build_context(&self.config, matches)?
            .with_verbosity(verbosity)
            .with_dry_run(matches.get_flag("dry-run"));

        // task paths in the manifest are relative to the manifest
        let base_dir = manifest_dir(&self.config_path);
        env::set_current_dir(&base_dir).map_err(|e| {
            ConfigError::Invalid(format!("Failed to enter {}: {}", base_dir.display(), e))
        })?;
        ctx.print_debug("DIR", &base_dir.display().to_string());

        let mut root = build_tree(&self.config, Arc::new(ExternalCompiler));
        root.set_context(ctx.duplicate());

        match root.run() {
            Ok(output) => {
                if verbosity >= Verbosity::Quiet {
                    write_streams(&output.stdout, &output.stderr)?;
                }
                ctx.print_info("DONE", &root.describe());
                Ok(())
            }
            Err(failure) => {
                ctx.print_error(&format!("{} failed", root.describe()));
                if verbosity >= Verbosity::Quiet {
                    eprintln!("stdout:");
                    write_streams(&[], &failure.output.stdout)?;
                    eprintln!("stderr:");
                    write_streams(&[], &failure.output.stderr)?;
                }
                Err(failure.error)
            }
        }
    }
}

/// Build the clap command
pub fn build_command() -> Command {
    Command::new("ccbuild")
        .version(VERSION)
        .about("A minimal incremental C/C++ build driver")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Path to ccbuild.yml manifest"),
        )
        .arg(
            Arg::new("out-dir")
                .short('o')
                .long("out-dir")
                .value_name("DIR")
                .help("Directory for compiled objects, relative to the current directory (overrides OUT_DIR)"),
        )
        .arg(
            Arg::new("define")
                .short('D')
                .long("define")
                .value_name("KEY=VALUE")
                .help("Set a context value; CFLAGS is split on whitespace")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .help("Report stale files without compiling")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print compiler output and errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Base context from the manifest plus command line overrides
fn build_context(config: &Config, matches: &ArgMatches) -> Result<Context, BuildError> {
    let mut ctx = base_context(config);

    if let Some(defines) = matches.get_many::<String>("define") {
        for define in defines {
            let (key, value) = parse_define(define)?;
            if key == CFLAGS {
                let flags: Vec<String> = value.split_whitespace().map(String::from).collect();
                ctx.set(key, flags);
            } else {
                ctx.set(key, value);
            }
        }
    }

    // resolved now, before the build changes into the manifest directory
    if let Some(out_dir) = matches.get_one::<String>("out-dir") {
        if out_dir.trim().is_empty() {
            return Err(ConfigError::EmptyDirectory("out-dir").into());
        }
        ctx.set(OUT_DIR, env::current_dir()?.join(out_dir));
    }

    Ok(ctx)
}

/// Split a `KEY=VALUE` definition
fn parse_define(define: &str) -> Result<(&str, &str), ConfigError> {
    match define.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(ConfigError::InvalidDefine(define.to_string())),
    }
}

fn manifest_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn write_streams(stdout: &[u8], stderr: &[u8]) -> io::Result<()> {
    write_stream(&mut io::stdout().lock(), stdout)?;
    write_stream(&mut io::stderr().lock(), stderr)
}

/// Write captured bytes followed by a newline; nothing for an empty capture
fn write_stream(w: &mut impl Write, bytes: &[u8]) -> io::Result<()> {
    if bytes.is_empty() {
        return Ok(());
    }
    w.write_all(bytes)?;
    w.write_all(b"\n")?;
    w.flush()
}

/// Run the CLI application with process arguments
pub fn run() -> Result<(), BuildError> {
    run_from(env::args_os())
}

/// Run the CLI application with explicit arguments
pub fn run_from<I, T>(args: I) -> Result<(), BuildError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_command().get_matches_from(args);

    let app = match matches.get_one::<String>("file") {
        Some(path) => App::with_config_file(PathBuf::from(path))?,
        None => App::new()?,
    };

    app.run(&matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_get_verbosity_normal() {
        let matches = build_command().get_matches_from(vec!["ccbuild"]);
        assert_eq!(get_verbosity(&matches), Verbosity::Normal);
    }

    #[test]
    fn test_get_verbosity_flags() {
        let matches = build_command().get_matches_from(vec!["ccbuild", "-v"]);
        assert_eq!(get_verbosity(&matches), Verbosity::Verbose);

        let matches = build_command().get_matches_from(vec!["ccbuild", "-q", "-v"]);
        assert_eq!(get_verbosity(&matches), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_define() {
        assert_eq!(parse_define("CC=gcc").unwrap(), ("CC", "gcc"));
        assert_eq!(parse_define("CFLAGS=").unwrap(), ("CFLAGS", ""));
        assert_eq!(parse_define("A=b=c").unwrap(), ("A", "b=c"));
        assert!(parse_define("CC").is_err());
        assert!(parse_define("=gcc").is_err());
    }

    #[test]
    fn test_build_context_overrides() {
        let config = parse_config(
            r#"
context:
  OUT_DIR: rel
  CC: gcc
"#,
        )
        .unwrap();
        let matches = build_command().get_matches_from(vec![
            "ccbuild",
            "-D",
            "CC=clang",
            "--define",
            "EXTRA=1",
            "--out-dir",
            "build/obj",
        ]);

        let ctx = build_context(&config, &matches).unwrap();
        assert_eq!(ctx.get_str("CC"), Some("clang"));
        assert_eq!(ctx.get_str("EXTRA"), Some("1"));
        let expected = env::current_dir().unwrap().join("build/obj");
        assert_eq!(ctx.get_path(OUT_DIR), Some(expected.as_path()));
    }

    #[test]
    fn test_cflags_define_becomes_list() {
        let config = parse_config("tasks: []").unwrap();
        let matches =
            build_command().get_matches_from(vec!["ccbuild", "-D", "CFLAGS=-O2  -Wall"]);

        let ctx = build_context(&config, &matches).unwrap();
        assert_eq!(
            ctx.require_list(CFLAGS).unwrap(),
            ["-O2".to_string(), "-Wall".to_string()]
        );
    }

    #[test]
    fn test_empty_out_dir_is_rejected() {
        let config = parse_config("tasks: []").unwrap();
        let matches = build_command().get_matches_from(vec!["ccbuild", "-o", ""]);

        let err = build_context(&config, &matches).unwrap_err();
        assert!(err.is_config_defect());
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_stream() {
        let mut buf = Vec::new();
        write_stream(&mut buf, b"").unwrap();
        assert!(buf.is_empty());

        write_stream(&mut buf, b"a.c: warning").unwrap();
        assert_eq!(buf, b"a.c: warning\n");
    }

    #[test]
    fn test_write_stream_reports_errors() {
        let err = write_stream(&mut ClosedPipe, b"built a.c").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(matches!(BuildError::from(err), BuildError::Io(_)));
    }

    #[test]
    fn test_manifest_dir() {
        assert_eq!(manifest_dir(Path::new("ccbuild.yml")), PathBuf::from("."));
        assert_eq!(
            manifest_dir(Path::new("proj/ccbuild.yml")),
            PathBuf::from("proj")
        );
    }
}
