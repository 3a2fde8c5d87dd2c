//! Common test utilities

#![allow(dead_code)]

use ccbuild::runner::{Compiler, Context, TaskOutput, TaskResult};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;
use tempfile::TempDir;

/// Create a temporary project with a ccbuild.yml and the given source files
pub fn create_project(manifest: &str, sources: &[&str]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ccbuild.yml");
    fs::write(&config_path, manifest).unwrap();
    for source in sources {
        let path = temp_dir.path().join(source);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "int main(void) { return 0; }\n").unwrap();
    }
    (temp_dir, config_path)
}

/// Set a file's modification time
pub fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

/// Compiler that writes the object file and remembers what it compiled
#[derive(Default)]
pub struct RecordingCompiler {
    pub compiled: Mutex<Vec<PathBuf>>,
}

impl RecordingCompiler {
    pub fn names(&self) -> Vec<String> {
        self.compiled
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }
}

impl Compiler for RecordingCompiler {
    fn compile(&self, source: &Path, output: &Path, _include_dirs: &str, _ctx: &Context) -> TaskResult {
        self.compiled.lock().unwrap().push(source.to_path_buf());
        fs::write(output, b"obj").unwrap();
        Ok(TaskOutput::default())
    }
}

/// Write an executable shell script that acts as a compiler
///
/// The script touches the file after `-o` and prints what it built.
#[cfg(unix)]
pub fn fake_compiler(dir: &Path, name: &str) -> PathBuf {
    write_script(
        dir,
        name,
        r#"#!/bin/sh
out=""
src=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift ;;
    -c) src="$2"; shift ;;
  esac
  shift
done
: > "$out"
echo "built $src"
"#,
    )
}

/// Write an executable shell script that always fails with a diagnostic
#[cfg(unix)]
pub fn broken_compiler(dir: &Path, name: &str) -> PathBuf {
    write_script(
        dir,
        name,
        "#!/bin/sh\necho \"fatal error: boom\" >&2\nexit 3\n",
    )
}

#[cfg(unix)]
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}
