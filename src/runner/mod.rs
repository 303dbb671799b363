//! Reference task runner
//!
//! A small synchronous host for the plugin layer: a task registry keyed by
//! name, `name:arg:arg` invocation parsing, manifest-based task loading, and a
//! resolver seam the lazy plugin interceptor is installed into.

pub mod command;
pub mod manifest;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{JitError, Result};
use crate::host::{Host, HostLog, ModuleExport, Resolution, TaskDef, TaskLookup, TaskResolver};

use self::command::command_task;
use self::manifest::{discover_manifests, is_manifest_value, parse_manifest, read_value};

/// Registry and dispatcher for tasks.
pub struct TaskRunner {
    tasks: HashMap<String, TaskDef>,
    current: Option<String>,
    log: HostLog,
    options: HashMap<String, String>,
    resolver: Option<Arc<dyn TaskResolver>>,
}

impl TaskRunner {
    /// Create an empty runner logging to stdout.
    pub fn new() -> Self {
        Self::with_log(HostLog::stdout())
    }

    pub fn with_log(log: HostLog) -> Self {
        Self {
            tasks: HashMap::new(),
            current: None,
            log,
            options: HashMap::new(),
            resolver: None,
        }
    }

    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options.insert(key.into(), value.into());
    }

    pub fn has_task(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Registered task names, sorted.
    pub fn task_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tasks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve `name_args` and run the task it names.
    pub fn run(&mut self, name_args: &str) -> Result<()> {
        let resolution = match self.resolver.clone() {
            Some(resolver) => resolver.resolve(self, name_args),
            None => Resolution::from_lookup(self.task_plus_args(name_args)),
        };

        match resolution {
            Resolution::Found(lookup) => self.dispatch(&lookup),
            Resolution::Failed(err) => Err(err.into()),
        }
    }

    /// Run tasks in order, stopping at the first failure.
    pub fn run_all<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        for name in names {
            self.run(name.as_ref())?;
        }
        Ok(())
    }

    fn dispatch(&mut self, lookup: &TaskLookup) -> Result<()> {
        let (Some(task), Some(invocation)) = (lookup.task.as_ref(), lookup.invocation()) else {
            return Err(JitError::NotFound(lookup.name_args.clone()));
        };

        self.log
            .header(&format!("Running \"{}\" task", invocation.name_args));
        info!(task = %task.name, args = ?invocation.args, "Running task");

        let previous = self.current.replace(invocation.name_args.clone());
        let result = (task.run)(&invocation);
        self.current = previous;
        result
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for TaskRunner {
    /// Match the longest registered colon-prefix of `name_args`.
    fn task_plus_args(&self, name_args: &str) -> TaskLookup {
        let parts: Vec<String> = name_args.split(':').map(str::to_string).collect();
        for i in (1..=parts.len()).rev() {
            let name = parts[..i].join(":");
            if let Some(task) = self.tasks.get(&name) {
                return TaskLookup::new(name_args, Some(task.clone()), parts[i..].to_vec());
            }
        }
        TaskLookup::new(name_args, None, parts)
    }

    fn load_tasks(&mut self, dir: &Path) -> Result<()> {
        let manifests = discover_manifests(dir)?;
        let mut count = 0;
        for (path, manifest) in manifests {
            let base = path.parent().unwrap_or(dir);
            for spec in manifest.tasks {
                self.register_task(command_task(spec, base));
                count += 1;
            }
        }
        info!(dir = %dir.display(), tasks = count, "Loaded tasks");
        Ok(())
    }

    fn load_module(&mut self, path: &Path) -> Result<ModuleExport> {
        let value = read_value(path)?;
        if !is_manifest_value(&value) {
            return Ok(ModuleExport::Value(value));
        }

        let manifest = parse_manifest(value)?;
        let base = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Ok(ModuleExport::Callable(Box::new(move |host: &mut dyn Host| {
            for spec in manifest.tasks {
                host.register_task(command_task(spec, &base));
            }
            Ok(())
        })))
    }

    fn register_task(&mut self, task: TaskDef) {
        debug!(task = %task.name, "Registered task");
        self.tasks.insert(task.name.clone(), task);
    }

    fn current_name_args(&self) -> Option<String> {
        self.current.clone()
    }

    fn set_current_name_args(&mut self, name_args: Option<String>) {
        self.current = name_args;
    }

    fn log(&self) -> &HostLog {
        &self.log
    }

    fn log_mut(&mut self) -> &mut HostLog {
        &mut self.log
    }

    fn option(&self, key: &str) -> Option<String> {
        self.options.get(key).cloned()
    }

    fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    fn install_resolver(&mut self, resolver: Arc<dyn TaskResolver>) {
        self.resolver = Some(resolver);
    }
}
