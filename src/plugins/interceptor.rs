//! Task dispatch interception.
//!
//! The interceptor is the `TaskResolver` installed into the host. It asks the
//! host's own lookup first; on a miss it locates and loads the plugin that
//! should provide the task, then asks again. Whatever happens during
//! resolution stays here: the caller only ever sees a `Resolution`.
//!
//! Strategies, first hit wins:
//!
//! 1. explicit mapping (path: load the file; package: locate its tasks dir)
//! 2. the custom task directory (`<dir>/<task>.<ext>`)
//! 3. convention search over prefixed, dash-cased package names

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::host::{Host, Resolution, TaskResolver};

use super::context::JitContext;
use super::loader::{load_plugin, PluginLocation};
use super::mapping::Locator;
use super::naming::package_candidates;
use super::scanner::find_custom_file;

/// Which strategy located a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Mapping,
    CustomDir,
    Convention,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::Mapping => "mapping",
            Strategy::CustomDir => "custom tasks dir",
            Strategy::Convention => "naming convention",
        };
        f.write_str(s)
    }
}

/// A plugin located for a task, not yet loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlugin {
    /// Plugin name shown in the loading header.
    pub name: String,
    pub location: PluginLocation,
    pub strategy: Strategy,
}

pub struct Interceptor {
    ctx: Arc<JitContext>,
}

impl Interceptor {
    pub fn new(ctx: Arc<JitContext>) -> Self {
        Self { ctx }
    }

    /// Work out which plugin would provide `task_name`, without loading it.
    pub fn locate(&self, task_name: &str) -> Option<ResolvedPlugin> {
        let config = self.ctx.config();
        let locator = self.ctx.locator();

        match self.ctx.lookup_mapping(task_name) {
            Some(Locator::Path(path)) => {
                // Explicit paths are authoritative: no fallback search.
                if path.exists() {
                    return Some(ResolvedPlugin {
                        name: task_name.to_string(),
                        location: PluginLocation::File(path),
                        strategy: Strategy::Mapping,
                    });
                }
                warn!(task = task_name, path = %path.display(), "Mapped plugin path does not exist");
                return None;
            }
            Some(Locator::Package(package)) => {
                if let Some(tasks) = locator.locate(&package) {
                    return Some(ResolvedPlugin {
                        name: package,
                        location: PluginLocation::Directory(tasks),
                        strategy: Strategy::Mapping,
                    });
                }
                debug!(task = task_name, package = %package, "Mapped package not found, continuing");
            }
            None => {}
        }

        if let Some(dir) = &config.custom_tasks_dir {
            if let Some(file) = find_custom_file(dir, task_name, config.extensions.as_slice()) {
                return Some(ResolvedPlugin {
                    name: task_name.to_string(),
                    location: PluginLocation::File(file),
                    strategy: Strategy::CustomDir,
                });
            }
        }

        package_candidates(task_name, config.prefixes.as_slice())
            .into_iter()
            .find_map(|package| {
                locator.locate(&package).map(|tasks| ResolvedPlugin {
                    name: package,
                    location: PluginLocation::Directory(tasks),
                    strategy: Strategy::Convention,
                })
            })
    }

    /// Locate and load the plugin for `task_name`. Returns whether a plugin
    /// was loaded; failures are logged, never raised.
    pub fn find_plugin(&self, host: &mut dyn Host, task_name: &str) -> bool {
        let Some(plugin) = self.locate(task_name) else {
            report_not_found(host, task_name);
            return false;
        };

        debug!(
            task = task_name,
            plugin = %plugin.name,
            strategy = %plugin.strategy,
            "Resolved plugin"
        );

        match load_plugin(host, &plugin.name, &plugin.location, self.ctx.hide_header()) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    task = task_name,
                    plugin = %plugin.name,
                    error = %e,
                    "Failed to load plugin"
                );
                false
            }
        }
    }
}

impl TaskResolver for Interceptor {
    fn resolve(&self, host: &mut dyn Host, name_args: &str) -> Resolution {
        let lookup = host.task_plus_args(name_args);
        if lookup.is_found() {
            return Resolution::Found(lookup);
        }

        let task_name = lookup.requested_name().to_string();
        if self.ctx.mark_attempted(&task_name) {
            self.find_plugin(host, &task_name);
        } else {
            debug!(task = %task_name, "Plugin resolution already attempted");
        }

        let resolution = Resolution::from_lookup(host.task_plus_args(name_args));
        if let Resolution::Failed(ref err) = resolution {
            debug!(task = %err.task, name_args = %err.name_args, "Task still missing after resolution");
        }
        resolution
    }

    fn name(&self) -> &str {
        "jit-tasks"
    }
}

fn report_not_found(host: &dyn Host, task_name: &str) {
    warn!(task = task_name, "Plugin not found");
    let log = host.log();
    log.writeln("");
    log.writeln(&format!("Plugin for the \"{}\" task not found.", task_name));
    log.writeln("If you have installed the plugin already, please set a static mapping.");
    log.writeln("");
}
