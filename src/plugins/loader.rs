//! Plugin loading into the host.
//!
//! Loading a plugin temporarily rewrites two pieces of host state so the
//! "Loading ... plugin" header reads correctly:
//!
//! - the current task name is set to `loading <plugin>` for the whole load;
//! - the log's write function is muted around the header when headers are
//!   hidden.
//!
//! Both are held by guards that restore the previous value on drop, so an
//! error (or a panic) during loading still leaves the host as it was.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::host::{Host, HostLog, ModuleExport, WriteFn};

/// A located plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginLocation {
    /// A directory of task definitions, loaded through the host.
    Directory(PathBuf),
    /// A single-file plugin, loaded as a module.
    File(PathBuf),
}

impl PluginLocation {
    pub fn path(&self) -> &Path {
        match self {
            PluginLocation::Directory(p) | PluginLocation::File(p) => p,
        }
    }

    pub fn is_single_file(&self) -> bool {
        matches!(self, PluginLocation::File(_))
    }
}

/// Sets the host's current task name and restores the previous one on drop.
pub struct CurrentTaskGuard<'h> {
    host: &'h mut dyn Host,
    previous: Option<String>,
}

impl<'h> CurrentTaskGuard<'h> {
    pub fn enter(host: &'h mut dyn Host, name_args: String) -> Self {
        let previous = host.current_name_args();
        host.set_current_name_args(Some(name_args));
        Self { host, previous }
    }
}

impl<'h> Deref for CurrentTaskGuard<'h> {
    type Target = dyn Host + 'h;

    fn deref(&self) -> &Self::Target {
        &*self.host
    }
}

impl<'h> DerefMut for CurrentTaskGuard<'h> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.host
    }
}

impl Drop for CurrentTaskGuard<'_> {
    fn drop(&mut self) {
        self.host.set_current_name_args(self.previous.take());
    }
}

/// Swaps in a silent write function and puts the original back on drop.
pub struct MutedLog<'l> {
    log: &'l mut HostLog,
    saved: Option<WriteFn>,
}

impl<'l> MutedLog<'l> {
    /// Mute `log` if `mute` is set; otherwise a pass-through.
    pub fn enter(log: &'l mut HostLog, mute: bool) -> Self {
        let saved = mute.then(|| log.replace_writer(HostLog::silent()));
        Self { log, saved }
    }

    pub fn log(&self) -> &HostLog {
        &*self.log
    }
}

impl Drop for MutedLog<'_> {
    fn drop(&mut self) {
        if let Some(write) = self.saved.take() {
            self.log.replace_writer(write);
        }
    }
}

/// Load the plugin `name` from `location` into `host`.
///
/// Directories go through the host's own task loading. Single files are
/// loaded as modules; a callable export is invoked with the host, anything
/// else is left alone.
pub fn load_plugin(
    host: &mut dyn Host,
    name: &str,
    location: &PluginLocation,
    hide_header: bool,
) -> Result<()> {
    let mut host = CurrentTaskGuard::enter(host, format!("loading {}", name));

    {
        let muted = MutedLog::enter(host.log_mut(), hide_header);
        muted.log().header(&format!("Loading \"{}\" plugin", name));
    }

    match location {
        PluginLocation::Directory(dir) => {
            info!(plugin = name, dir = %dir.display(), "Loading plugin tasks");
            host.load_tasks(dir)?;
        }
        PluginLocation::File(path) => {
            info!(plugin = name, file = %path.display(), "Loading plugin file");
            match host.load_module(path)? {
                ModuleExport::Callable(register) => register(&mut *host)?,
                ModuleExport::Value(value) => {
                    debug!(
                        plugin = name,
                        export = %value,
                        "Plugin file exports no registration function"
                    );
                }
            }
        }
    }

    Ok(())
}
