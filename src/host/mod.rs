//! Host collaboration surface
//!
//! The task runner that jit-tasks plugs into is an external collaborator. This
//! module defines the narrow surface the plugin layer consumes from it:
//!
//! - **`Host`**: the task registry, its "load all tasks in a directory"
//!   primitive, the module loader, current-task bookkeeping, and the log.
//! - **`TaskResolver`**: the documented seam a host consults whenever it needs
//!   to turn a task name into an implementation. The dispatch interceptor is
//!   installed here instead of patching the host's internals.
//! - **`ModuleExport`**: what loading a single-file plugin yields, either a
//!   registration callable or a plain value.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Result, TaskNotFound};

#[cfg(test)]
pub(crate) mod testing;

/// The host log's replaceable write function.
pub type WriteFn = Arc<dyn Fn(&str) + Send + Sync>;

/// A task implementation. Receives the invocation that dispatched it.
pub type TaskFn = Arc<dyn Fn(&TaskInvocation) -> Result<()> + Send + Sync>;

/// The registration capability a single-file plugin exports.
pub type Registration = Box<dyn FnOnce(&mut dyn Host) -> Result<()>>;

/// Line-oriented log whose write function can be swapped out.
pub struct HostLog {
    write: WriteFn,
}

impl HostLog {
    /// Create a log writing through `write`.
    pub fn new(write: WriteFn) -> Self {
        Self { write }
    }

    /// A log that prints to stdout.
    pub fn stdout() -> Self {
        Self::new(Arc::new(|s: &str| print!("{}", s)))
    }

    /// A write function that discards everything.
    pub fn silent() -> WriteFn {
        Arc::new(|_: &str| {})
    }

    /// The current write function.
    pub fn writer(&self) -> WriteFn {
        Arc::clone(&self.write)
    }

    /// Install a new write function, returning the previous one.
    pub fn replace_writer(&mut self, write: WriteFn) -> WriteFn {
        std::mem::replace(&mut self.write, write)
    }

    pub fn write(&self, msg: &str) {
        (self.write)(msg);
    }

    pub fn writeln(&self, msg: &str) {
        (self.write)(&format!("{}\n", msg));
    }

    /// Write a section header: a blank line followed by the message.
    pub fn header(&self, msg: &str) {
        self.writeln("");
        self.writeln(msg);
    }
}

impl Default for HostLog {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for HostLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostLog").finish_non_exhaustive()
    }
}

/// What a task implementation sees when it is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInvocation {
    /// Registered task name.
    pub name: String,
    /// The full invocation string, e.g. `copy:dist:verbose`.
    pub name_args: String,
    /// Colon-separated arguments following the task name.
    pub args: Vec<String>,
    /// Every argument mapped to `true`.
    pub flags: BTreeMap<String, bool>,
}

/// A registered task.
#[derive(Clone)]
pub struct TaskDef {
    pub name: String,
    pub description: String,
    pub run: TaskFn,
}

impl TaskDef {
    pub fn new(name: impl Into<String>, description: impl Into<String>, run: TaskFn) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            run,
        }
    }
}

impl fmt::Debug for TaskDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDef")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Result of splitting an invocation string against the task registry.
#[derive(Debug, Clone)]
pub struct TaskLookup {
    /// The matched task, if any.
    pub task: Option<TaskDef>,
    pub name_args: String,
    /// Arguments after the matched task name. On a miss, every colon segment.
    pub args: Vec<String>,
    pub flags: BTreeMap<String, bool>,
}

impl TaskLookup {
    /// Build a lookup from a matched (or missing) task and its arguments.
    pub fn new(name_args: &str, task: Option<TaskDef>, args: Vec<String>) -> Self {
        let flags = args.iter().map(|a| (a.clone(), true)).collect();
        Self {
            task,
            name_args: name_args.to_string(),
            args,
            flags,
        }
    }

    pub fn is_found(&self) -> bool {
        self.task.is_some()
    }

    /// The task name a miss should be resolved for: the first colon segment.
    pub fn requested_name(&self) -> &str {
        self.args
            .first()
            .map(String::as_str)
            .unwrap_or(self.name_args.as_str())
    }

    /// Turn a found lookup into the invocation handed to the task.
    pub fn invocation(&self) -> Option<TaskInvocation> {
        let task = self.task.as_ref()?;
        Some(TaskInvocation {
            name: task.name.clone(),
            name_args: self.name_args.clone(),
            args: self.args.clone(),
            flags: self.flags.clone(),
        })
    }
}

/// What loading a single-file plugin produced.
pub enum ModuleExport {
    /// A registration function, invoked with the host.
    Callable(Registration),
    /// Anything else. Nothing gets invoked.
    Value(Value),
}

impl fmt::Debug for ModuleExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleExport::Callable(_) => f.write_str("ModuleExport::Callable"),
            ModuleExport::Value(v) => write!(f, "ModuleExport::Value({})", v),
        }
    }
}

/// Outcome of resolving an invocation string.
#[derive(Debug)]
pub enum Resolution {
    Found(TaskLookup),
    Failed(TaskNotFound),
}

impl Resolution {
    /// Resolve against the host's own registry only.
    pub fn from_lookup(lookup: TaskLookup) -> Self {
        if lookup.is_found() {
            Resolution::Found(lookup)
        } else {
            Resolution::Failed(TaskNotFound {
                task: lookup.requested_name().to_string(),
                name_args: lookup.name_args,
            })
        }
    }
}

/// Resolver middleware a host consults to map an invocation string to a task.
pub trait TaskResolver: Send + Sync {
    fn resolve(&self, host: &mut dyn Host, name_args: &str) -> Resolution;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// The task runner as seen by the plugin layer.
pub trait Host {
    /// The host's own name-to-implementation lookup.
    fn task_plus_args(&self, name_args: &str) -> TaskLookup;

    /// Load every task definition found in `dir` into the registry.
    fn load_tasks(&mut self, dir: &Path) -> Result<()>;

    /// Load a single-file plugin.
    fn load_module(&mut self, path: &Path) -> Result<ModuleExport>;

    fn register_task(&mut self, task: TaskDef);

    /// `name_args` of the task currently running, if any.
    fn current_name_args(&self) -> Option<String>;

    fn set_current_name_args(&mut self, name_args: Option<String>);

    fn log(&self) -> &HostLog;

    fn log_mut(&mut self) -> &mut HostLog;

    /// A host option such as `verbose`.
    fn option(&self, key: &str) -> Option<String>;

    fn has_resolver(&self) -> bool;

    fn install_resolver(&mut self, resolver: Arc<dyn TaskResolver>);
}
