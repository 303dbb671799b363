//! Recording host used by the plugin layer's unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::{Host, HostLog, ModuleExport, TaskDef, TaskInvocation, TaskLookup, TaskResolver};
use crate::error::{JitError, Result};

/// What a fake directory or module load should do.
pub(crate) enum FakeLoad {
    /// Register these task names.
    Register(Vec<String>),
    /// Yield a non-callable module export.
    NonCallable,
    /// Fail the load.
    Fail,
}

pub(crate) struct FakeHost {
    pub tasks: HashMap<String, TaskDef>,
    pub loaded_dirs: Vec<PathBuf>,
    pub loaded_modules: Vec<PathBuf>,
    pub current: Option<String>,
    pub log: HostLog,
    pub output: Arc<Mutex<String>>,
    pub options: HashMap<String, String>,
    pub resolver: Option<Arc<dyn TaskResolver>>,
    pub install_count: usize,
    /// Behavior of `load_tasks`/`load_module`, keyed by path.
    pub behaviors: HashMap<PathBuf, FakeLoad>,
    /// `current_name_args` observed during each load.
    pub names_during_load: Vec<Option<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        let output = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&output);
        Self {
            tasks: HashMap::new(),
            loaded_dirs: Vec::new(),
            loaded_modules: Vec::new(),
            current: None,
            log: HostLog::new(Arc::new(move |s: &str| {
                sink.lock().unwrap().push_str(s);
            })),
            output,
            options: HashMap::new(),
            resolver: None,
            install_count: 0,
            behaviors: HashMap::new(),
            names_during_load: Vec::new(),
        }
    }

    pub fn on_load(&mut self, path: &Path, behavior: FakeLoad) {
        self.behaviors.insert(path.to_path_buf(), behavior);
    }

    pub fn output(&self) -> String {
        self.output.lock().unwrap().clone()
    }

    fn apply(&mut self, path: &Path) -> Result<Option<Value>> {
        self.names_during_load.push(self.current.clone());
        let behavior = match self.behaviors.get(path) {
            Some(FakeLoad::Register(names)) => Ok(Some(names.clone())),
            Some(FakeLoad::NonCallable) => {
                return Ok(Some(Value::String("not a function".into())));
            }
            Some(FakeLoad::Fail) => Err(JitError::Load(format!("boom: {}", path.display()))),
            None => Ok(None),
        };
        for name in behavior?.unwrap_or_default() {
            self.register_task(noop_task(&name));
        }
        Ok(None)
    }
}

pub(crate) fn noop_task(name: &str) -> TaskDef {
    TaskDef::new(name, "", Arc::new(|_: &TaskInvocation| Ok(())))
}

impl Host for FakeHost {
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
        self.loaded_dirs.push(dir.to_path_buf());
        self.apply(dir).map(|_| ())
    }

    fn load_module(&mut self, path: &Path) -> Result<ModuleExport> {
        self.loaded_modules.push(path.to_path_buf());
        let register = matches!(self.behaviors.get(path), Some(FakeLoad::Register(_)));
        if register {
            let names = match self.behaviors.remove(path) {
                Some(FakeLoad::Register(names)) => names,
                _ => Vec::new(),
            };
            self.names_during_load.push(self.current.clone());
            return Ok(ModuleExport::Callable(Box::new(move |host: &mut dyn Host| {
                for name in names {
                    host.register_task(noop_task(&name));
                }
                Ok(())
            })));
        }
        match self.apply(path)? {
            Some(value) => Ok(ModuleExport::Value(value)),
            None => Ok(ModuleExport::Value(Value::Null)),
        }
    }

    fn register_task(&mut self, task: TaskDef) {
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
        self.install_count += 1;
        self.resolver = Some(resolver);
    }
}
