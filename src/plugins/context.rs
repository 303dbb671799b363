//! Process-wide plugin resolution context.
//!
//! One `JitContext` is built at startup and shared (via `Arc`) by the
//! configuration entry point and the installed interceptor. It owns the
//! mapping registry, the header-suppression flag, and the flag recording that
//! the interceptor has been installed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::{is_truthy, JitConfig};
use crate::error::Result;
use crate::host::Host;

use super::interceptor::Interceptor;
use super::locator::PluginLocator;
use super::mapping::{Locator, MappingRegistry};

/// Shared state for lazy plugin resolution.
#[derive(Debug)]
pub struct JitContext {
    config: JitConfig,
    cwd: PathBuf,
    hide_header: OnceCell<bool>,
    mappings: RwLock<MappingRegistry>,
    /// Task names resolution has already been attempted for.
    attempted: Mutex<HashSet<String>>,
    installed: AtomicBool,
}

impl JitContext {
    /// Build a context rooted at the process working directory.
    pub fn new(config: JitConfig) -> Result<Arc<Self>> {
        let cwd = std::env::current_dir()?;
        Self::with_cwd(config, &cwd)
    }

    /// Build a context whose relative paths resolve against `cwd`.
    pub fn with_cwd(mut config: JitConfig, cwd: &Path) -> Result<Arc<Self>> {
        config.validate()?;
        config.resolve_paths(cwd);

        let mut mappings = MappingRegistry::new();
        mappings.merge(config.mappings.clone());

        Ok(Arc::new(Self {
            config,
            cwd: cwd.to_path_buf(),
            hide_header: OnceCell::new(),
            mappings: RwLock::new(mappings),
            attempted: Mutex::new(HashSet::new()),
            installed: AtomicBool::new(false),
        }))
    }

    /// Configuration entry point. Safe to call any number of times.
    ///
    /// The first call derives the header flag and installs the interceptor
    /// into `host`; every call merges `mappings`. Returns `true` only for the
    /// call that installed the interceptor.
    pub fn configure<I, K, V>(self: &Arc<Self>, host: &mut dyn Host, mappings: I) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.hide_header.get_or_init(|| {
            let verbose = self.config.verbose
                || host.option("verbose").map(|v| is_truthy(&v)).unwrap_or(false);
            !verbose
        });

        let mut installed = false;
        if self.claim_install() {
            if host.has_resolver() {
                warn!("Host already has a task resolver, not installing interceptor");
                self.installed.store(false, Ordering::Release);
            } else {
                host.install_resolver(Arc::new(Interceptor::new(Arc::clone(self))));
                info!("Installed lazy plugin interceptor");
                installed = true;
            }
        }

        let merged = self
            .mappings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(mappings);
        if merged > 0 {
            // New mappings may make earlier misses resolvable.
            self.attempted
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
            debug!(merged, "Merged task mappings");
        }

        installed
    }

    /// Atomically claim the installed flag. Only one caller wins while it is set.
    fn claim_install(&self) -> bool {
        self.installed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    /// Whether plugin loading headers are suppressed.
    pub fn hide_header(&self) -> bool {
        self.hide_header
            .get()
            .copied()
            .unwrap_or(!self.config.verbose)
    }

    pub fn config(&self) -> &JitConfig {
        &self.config
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// The explicit locator for `task_name`, with paths made absolute.
    pub fn lookup_mapping(&self, task_name: &str) -> Option<Locator> {
        self.mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .lookup(task_name)
            .map(|locator| locator.resolved(&self.cwd))
    }

    /// Snapshot of the current mappings.
    pub fn mappings(&self) -> MappingRegistry {
        self.mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn locator(&self) -> PluginLocator<'_> {
        PluginLocator::new(
            &self.config.plugins_root,
            &self.config.dependency_dir,
            self.config.max_ancestor_depth,
        )
    }

    /// Record an attempt for `task_name`. `false` if it was already attempted.
    pub(crate) fn mark_attempted(&self, task_name: &str) -> bool {
        self.attempted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(task_name.to_string())
    }
}
