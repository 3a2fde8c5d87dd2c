//! Task abstraction and sequencing
//!
//! A task is a single build operation, e.g. running the compiler for one
//! `.c` file. Tasks receive their [`Context`] from whoever runs them and
//! report the output they captured, so a failing build can show the
//! compiler's diagnostics.

use crate::error::{BuildError, ConfigError, ExecutionError, InterpolationError};
use crate::runner::{interpolate, Context, Value, OUT_DIR};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Output captured while running a task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl TaskOutput {
    pub fn new(stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        TaskOutput { stdout, stderr }
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }

    /// Append another task's output, stream by stream
    pub fn append(&mut self, other: TaskOutput) {
        combine_output(&mut self.stdout, other.stdout);
        combine_output(&mut self.stderr, other.stderr);
    }
}

/// Append `additional` to `combined`, separated by a single newline
///
/// Empty contributions add nothing, not even the separator.
pub fn combine_output(combined: &mut Vec<u8>, additional: Vec<u8>) {
    if additional.is_empty() {
        return;
    }
    if combined.is_empty() {
        *combined = additional;
        return;
    }
    combined.push(b'\n');
    combined.extend(additional);
}

/// A failed task: the error plus whatever output was captured before it
#[derive(Debug)]
pub struct TaskFailure {
    pub error: BuildError,
    pub output: TaskOutput,
}

impl TaskFailure {
    pub fn new(error: impl Into<BuildError>, output: TaskOutput) -> Self {
        TaskFailure {
            error: error.into(),
            output,
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for TaskFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<BuildError> for TaskFailure {
    fn from(error: BuildError) -> Self {
        TaskFailure::new(error, TaskOutput::default())
    }
}

impl From<ConfigError> for TaskFailure {
    fn from(error: ConfigError) -> Self {
        BuildError::from(error).into()
    }
}

impl From<ExecutionError> for TaskFailure {
    fn from(error: ExecutionError) -> Self {
        BuildError::from(error).into()
    }
}

impl From<InterpolationError> for TaskFailure {
    fn from(error: InterpolationError) -> Self {
        BuildError::from(error).into()
    }
}

impl From<io::Error> for TaskFailure {
    fn from(error: io::Error) -> Self {
        BuildError::from(error).into()
    }
}

/// Result of running a task
pub type TaskResult = std::result::Result<TaskOutput, TaskFailure>;

/// A unit of build work
///
/// A task starts without a context. `set_context` makes it runnable and can
/// be called again to replace the context. Running a task that never got a
/// context fails on the first required value it looks up.
pub trait Task {
    /// Short description used in log messages
    fn describe(&self) -> String;

    fn set_context(&mut self, ctx: Context);

    fn run(&mut self) -> TaskResult;
}

/// Create `dir` and its parents; an existing directory is fine
pub(crate) fn ensure_dir(dir: &Path, ctx: &Context) -> TaskResult {
    ctx.print_info("MKDIR", &dir.display().to_string());
    if ctx.dry_run {
        return Ok(TaskOutput::default());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder
        .create(dir)
        .map_err(|error| ExecutionError::CreateDir {
            path: dir.to_path_buf(),
            error,
        })?;

    Ok(TaskOutput::default())
}

/// Interpolate a directory argument; an empty result is a definition error
pub(crate) fn resolve_dir(
    kind: &'static str,
    raw: &str,
    ctx: &Context,
) -> crate::error::Result<PathBuf> {
    let dir = interpolate(raw, ctx)?;
    if dir.trim().is_empty() {
        return Err(ConfigError::EmptyDirectory(kind).into());
    }
    Ok(PathBuf::from(dir))
}

/// Creates a single directory
#[derive(Debug, Clone)]
pub struct MkdirTask {
    /// Directory to create, may reference context values as `${KEY}`
    pub dir: String,
    ctx: Context,
}

impl MkdirTask {
    pub fn new(dir: impl Into<String>) -> Self {
        MkdirTask {
            dir: dir.into(),
            ctx: Context::new(),
        }
    }
}

impl Task for MkdirTask {
    fn describe(&self) -> String {
        format!("mkdir {}", self.dir)
    }

    fn set_context(&mut self, ctx: Context) {
        self.ctx = ctx;
    }

    fn run(&mut self) -> TaskResult {
        let dir = resolve_dir("mkdir", &self.dir, &self.ctx)?;
        ensure_dir(&dir, &self.ctx)
    }
}

/// Creates the output directory named by `OUT_DIR`
#[derive(Debug, Clone, Default)]
pub struct MkdirOutTask {
    ctx: Context,
}

impl MkdirOutTask {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Task for MkdirOutTask {
    fn describe(&self) -> String {
        "mkdir $OUT_DIR".to_string()
    }

    fn set_context(&mut self, ctx: Context) {
        self.ctx = ctx;
    }

    fn run(&mut self) -> TaskResult {
        let dir = self.ctx.require_path(OUT_DIR)?.to_path_buf();
        ensure_dir(&dir, &self.ctx)
    }
}

/// An ordered list of tasks run one after another
///
/// Every child gets its own duplicate of the sequence's context, with the
/// sequence's overrides applied. The first failing child stops the sequence;
/// its output is reported after the output of the children that succeeded.
// TODO: run groups marked parallel on a thread pool; contexts are already per-child
pub struct Sequence {
    /// Optional label for log messages
    pub name: Option<String>,
    /// Values this sequence sets for its children
    pub overrides: Vec<(String, Value)>,
    pub tasks: Vec<Box<dyn Task>>,
    ctx: Context,
}

impl Sequence {
    pub fn new(tasks: Vec<Box<dyn Task>>) -> Self {
        Sequence {
            name: None,
            overrides: Vec::new(),
            tasks,
            ctx: Context::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Task for Sequence {
    fn describe(&self) -> String {
        match &self.name {
            Some(name) => format!("group {}", name),
            None => format!("group of {} tasks", self.tasks.len()),
        }
    }

    fn set_context(&mut self, ctx: Context) {
        self.ctx = ctx;
        self.ctx.extend(self.overrides.iter().cloned());
    }

    fn run(&mut self) -> TaskResult {
        let mut combined = TaskOutput::default();

        for task in &mut self.tasks {
            self.ctx.print_debug("TASK", &task.describe());
            task.set_context(self.ctx.duplicate());
            match task.run() {
                Ok(output) => combined.append(output),
                Err(mut failure) => {
                    combined.append(failure.output);
                    failure.output = combined;
                    return Err(failure);
                }
            }
        }

        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Records runs and the context it saw, then returns a canned result
    struct Scripted {
        label: &'static str,
        fail: bool,
        stdout: &'static str,
        log: Rc<RefCell<Vec<String>>>,
        seen: Rc<RefCell<Vec<Context>>>,
        ctx: Context,
    }

    impl Scripted {
        fn new(label: &'static str, stdout: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Self {
            Scripted {
                label,
                fail: false,
                stdout,
                log: Rc::clone(log),
                seen: Rc::new(RefCell::new(Vec::new())),
                ctx: Context::new(),
            }
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }
    }

    impl Task for Scripted {
        fn describe(&self) -> String {
            self.label.to_string()
        }

        fn set_context(&mut self, ctx: Context) {
            self.ctx = ctx;
        }

        fn run(&mut self) -> TaskResult {
            self.log.borrow_mut().push(self.label.to_string());
            self.seen.borrow_mut().push(self.ctx.clone());
            // a child that scribbles on its own context
            self.ctx.set("SCRATCH", self.label);
            let output = TaskOutput::new(self.stdout.as_bytes().to_vec(), Vec::new());
            if self.fail {
                return Err(TaskFailure::new(
                    ExecutionError::CompileFailed {
                        program: "cc".to_string(),
                        source_file: self.label.into(),
                        code: Some(1),
                    },
                    output,
                ));
            }
            Ok(output)
        }
    }

    fn quiet() -> Context {
        Context::new().with_verbosity(crate::runner::Verbosity::Silent)
    }

    #[test]
    fn test_combine_output() {
        let mut buf = Vec::new();
        combine_output(&mut buf, b"one".to_vec());
        assert_eq!(buf, b"one");

        combine_output(&mut buf, Vec::new());
        assert_eq!(buf, b"one");

        combine_output(&mut buf, b"two".to_vec());
        assert_eq!(buf, b"one\ntwo");
    }

    #[test]
    fn test_sequence_combines_output() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut seq = Sequence::new(vec![
            Box::new(Scripted::new("a", "first", &log)),
            Box::new(Scripted::new("b", "", &log)),
            Box::new(Scripted::new("c", "third", &log)),
        ]);
        seq.set_context(quiet());

        let output = seq.run().unwrap();
        assert_eq!(output.stdout, b"first\nthird");
        assert!(output.stderr.is_empty());
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sequence_stops_at_first_failure() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut seq = Sequence::new(vec![
            Box::new(Scripted::new("one", "out1", &log)),
            Box::new(Scripted::new("two", "out2", &log).failing()),
            Box::new(Scripted::new("three", "out3", &log)),
        ]);
        seq.set_context(quiet());

        let failure = seq.run().unwrap_err();
        assert_eq!(*log.borrow(), vec!["one", "two"]);
        assert_eq!(failure.output.stdout, b"out1\nout2");
        assert!(matches!(
            failure.error,
            BuildError::Execution(ExecutionError::CompileFailed { .. })
        ));
    }

    #[test]
    fn test_sequence_children_get_independent_contexts() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = Scripted::new("first", "", &log);
        let second = Scripted::new("second", "", &log);
        let second_seen = Rc::clone(&second.seen);

        let mut seq = Sequence::new(vec![Box::new(first), Box::new(second)]);
        seq.set_context(quiet().with_var("K", "base"));
        seq.run().unwrap();

        let seen = second_seen.borrow();
        assert_eq!(seen[0].get_str("K"), Some("base"));
        // the first child's scribble did not reach its sibling
        assert_eq!(seen[0].get("SCRATCH"), None);
    }

    #[test]
    fn test_nested_overrides_stay_inside_group() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner = Scripted::new("inner", "", &log);
        let inner_seen = Rc::clone(&inner.seen);
        let after = Scripted::new("after", "", &log);
        let after_seen = Rc::clone(&after.seen);

        let group = Sequence::new(vec![Box::new(inner)])
            .with_name("zlib")
            .with_override("INCLUDE_DIRS", "ext/zlib");
        let mut root = Sequence::new(vec![Box::new(group), Box::new(after)]);
        let base = quiet().with_var("INCLUDE_DIRS", "src/utils");
        root.set_context(base.clone());
        root.run().unwrap();

        assert_eq!(inner_seen.borrow()[0].get_str("INCLUDE_DIRS"), Some("ext/zlib"));
        assert_eq!(after_seen.borrow()[0].get_str("INCLUDE_DIRS"), Some("src/utils"));
        assert_eq!(base.get_str("INCLUDE_DIRS"), Some("src/utils"));
    }

    #[test]
    fn test_empty_sequence_succeeds() {
        let mut seq = Sequence::new(Vec::new());
        seq.set_context(quiet());
        assert!(seq.run().unwrap().is_empty());
    }

    #[test]
    fn test_mkdir_task_creates_nested_dirs() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a/b/c");

        let mut task = MkdirTask::new(target.display().to_string());
        task.set_context(quiet());
        task.run().unwrap();
        assert!(target.is_dir());

        // existing directory is not an error
        task.run().unwrap();
    }

    #[test]
    fn test_mkdir_task_interpolates_context() {
        let temp = TempDir::new().unwrap();
        let mut task = MkdirTask::new("${OUT_DIR}/extra");
        task.set_context(quiet().with_var(OUT_DIR, temp.path()));
        task.run().unwrap();
        assert!(temp.path().join("extra").is_dir());
    }

    #[test]
    fn test_mkdir_task_empty_dir_is_config_defect() {
        let mut task = MkdirTask::new("");
        task.set_context(quiet());
        let failure = task.run().unwrap_err();
        assert!(failure.error.is_config_defect());
    }

    #[test]
    fn test_mkdir_task_empty_after_interpolation() {
        let mut task = MkdirTask::new("${EMPTY_DIR}");
        task.set_context(quiet().with_var("EMPTY_DIR", ""));
        let failure = task.run().unwrap_err();
        assert!(matches!(
            failure.error,
            BuildError::Config(ConfigError::EmptyDirectory("mkdir"))
        ));
    }

    #[test]
    fn test_mkdir_out_task_empty_out_dir() {
        let mut task = MkdirOutTask::new();
        task.set_context(quiet().with_var(OUT_DIR, PathBuf::new()));
        let failure = task.run().unwrap_err();
        assert!(matches!(
            failure.error,
            BuildError::Config(ConfigError::WrongType { ref key, .. }) if key == OUT_DIR
        ));
    }

    #[test]
    fn test_mkdir_out_task() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("rel-mingw");

        let mut task = MkdirOutTask::new();
        task.set_context(quiet().with_var(OUT_DIR, out.clone()));
        task.run().unwrap();
        assert!(out.is_dir());
    }

    #[test]
    fn test_mkdir_out_task_without_out_dir() {
        let mut task = MkdirOutTask::new();
        task.set_context(quiet());
        let failure = task.run().unwrap_err();
        assert!(matches!(
            failure.error,
            BuildError::Config(ConfigError::MissingKey(ref k)) if k == OUT_DIR
        ));
    }

    #[test]
    fn test_task_without_context_fails_on_lookup() {
        let mut task = MkdirOutTask::new();
        assert!(task.run().unwrap_err().error.is_config_defect());
    }

    #[test]
    fn test_dry_run_creates_nothing() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");

        let mut task = MkdirOutTask::new();
        task.set_context(quiet().with_var(OUT_DIR, out.clone()).with_dry_run(true));
        task.run().unwrap();
        assert!(!out.exists());
    }
}
