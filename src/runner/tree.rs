//! Building the task tree from a manifest

use crate::config::{Config, TaskDef};
use crate::runner::{
    CompileDirAllTask, CompileDirTask, CompileFileTask, Compiler, Context, MkdirOutTask,
    MkdirTask, Sequence, Task, CC, CXX,
};
use std::env;
use std::sync::Arc;

/// Base context for a manifest
///
/// `CC` and `CXX` start from the environment variables of the same name;
/// values in the manifest take precedence.
pub fn base_context(config: &Config) -> Context {
    let mut ctx = Context::new();
    for key in [CC, CXX] {
        if let Ok(program) = env::var(key) {
            if !program.is_empty() {
                ctx.set(key, program);
            }
        }
    }
    ctx.extend(
        config
            .context
            .iter()
            .map(|(k, v)| (k.clone(), v.clone().into())),
    );
    ctx
}

/// Build the root sequence for a manifest
pub fn build_tree(config: &Config, compiler: Arc<dyn Compiler>) -> Sequence {
    let tasks = config
        .tasks
        .iter()
        .map(|def| build_task(def, &compiler))
        .collect();
    let root = Sequence::new(tasks);
    match &config.name {
        Some(name) => root.with_name(name.clone()),
        None => root,
    }
}

/// Build one task, recursing into groups
pub fn build_task(def: &TaskDef, compiler: &Arc<dyn Compiler>) -> Box<dyn Task> {
    match def {
        TaskDef::Mkdir { dir } => Box::new(MkdirTask::new(dir.clone())),
        TaskDef::MkdirOut => Box::new(MkdirOutTask::new()),
        TaskDef::Compile { file, include_dirs } => {
            let mut task = CompileFileTask::new(file.clone(), Arc::clone(compiler));
            task.include_dirs = include_dirs.clone();
            Box::new(task)
        }
        TaskDef::CompileDir {
            dir,
            files,
            include_dirs,
        } => {
            let mut task = CompileDirTask::new(dir.clone(), files.clone(), Arc::clone(compiler));
            task.include_dirs = include_dirs.clone();
            Box::new(task)
        }
        TaskDef::CompileDirAll {
            dir,
            exclude,
            include_dirs,
        } => {
            let mut task = CompileDirAllTask::new(dir.clone(), Arc::clone(compiler))
                .with_exclude(exclude.iter().cloned());
            task.include_dirs = include_dirs.clone();
            Box::new(task)
        }
        TaskDef::Group {
            name,
            context,
            tasks,
        } => {
            let children = tasks.iter().map(|t| build_task(t, compiler)).collect();
            let mut group = Sequence::new(children);
            group.name = name.clone();
            group.overrides = context
                .iter()
                .map(|(k, v)| (k.clone(), v.clone().into()))
                .collect();
            Box::new(group)
        }
    }
}
