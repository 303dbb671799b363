//! Configuration for jit-tasks
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. `jit-tasks.json` in the working directory (or an explicit path). Parsed
//!    as JSON5, so comments and trailing commas are fine.
//! 2. Environment variables (`JIT_TASKS_PLUGINS_ROOT`, `JIT_TASKS_CUSTOM_DIR`,
//!    `JIT_TASKS_VERBOSE`).
//! 3. Command-line flags, applied by the binary.
//!
//! # Example jit-tasks.json
//!
//! ```json
//! {
//!   // Where plugin packages live
//!   "plugins_root": "node_modules",
//!   "custom_tasks_dir": "build/tasks",
//!   "mappings": {
//!     "sprite": "grunt-spritesmith",
//!     "release": "tools/release.json"
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{JitError, Result};
use crate::plugins::locator::DEFAULT_MAX_ANCESTOR_DEPTH;
use crate::plugins::naming::DEFAULT_PREFIXES;
use crate::plugins::scanner::DEFAULT_EXTENSIONS;

/// Conventional dependency directory; also the marker that enables ancestor search.
pub const DEFAULT_DEPENDENCY_DIR: &str = "node_modules";

/// Resolution settings for the plugin layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitConfig {
    /// Directory holding plugin packages as `<root>/<package>/tasks`.
    pub plugins_root: PathBuf,

    /// Name of the nested dependency directory searched in ancestors.
    pub dependency_dir: String,

    /// Optional directory of single-file task definitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_tasks_dir: Option<PathBuf>,

    /// Package name prefixes, most specific first.
    pub prefixes: Vec<String>,

    /// Single-file task extensions in priority order, without the dot.
    pub extensions: Vec<String>,

    /// How many ancestor directories the upward search may visit.
    pub max_ancestor_depth: usize,

    /// Show plugin loading headers.
    pub verbose: bool,

    /// Explicit task name to locator overrides.
    pub mappings: HashMap<String, String>,
}

impl Default for JitConfig {
    fn default() -> Self {
        Self {
            plugins_root: PathBuf::from(DEFAULT_DEPENDENCY_DIR),
            dependency_dir: DEFAULT_DEPENDENCY_DIR.to_string(),
            custom_tasks_dir: None,
            prefixes: DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_ancestor_depth: DEFAULT_MAX_ANCESTOR_DEPTH,
            verbose: false,
            mappings: HashMap::new(),
        }
    }
}

impl JitConfig {
    /// Config file name looked up in the working directory.
    pub const FILE_NAME: &'static str = "jit-tasks.json";

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            JitError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: JitConfig = json5::from_str(&content)?;
        debug!(path = %path.display(), mappings = config.mappings.len(), "Loaded config");
        Ok(config)
    }

    /// Load `jit-tasks.json` from `dir` if present, defaults otherwise.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(Self::FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("JIT_TASKS_PLUGINS_ROOT").filter(|v| !v.is_empty()) {
            self.plugins_root = PathBuf::from(root);
        }
        if let Some(dir) = lookup("JIT_TASKS_CUSTOM_DIR").filter(|v| !v.is_empty()) {
            self.custom_tasks_dir = Some(PathBuf::from(dir));
        }
        if let Some(verbose) = lookup("JIT_TASKS_VERBOSE") {
            self.verbose = is_truthy(&verbose);
        }
    }

    /// Make relative directories absolute against `cwd`.
    pub fn resolve_paths(&mut self, cwd: &Path) {
        if self.plugins_root.is_relative() {
            self.plugins_root = cwd.join(&self.plugins_root);
        }
        if let Some(dir) = self.custom_tasks_dir.as_mut() {
            if dir.is_relative() {
                *dir = cwd.join(&*dir);
            }
        }
    }

    /// Check values the resolver cannot work without.
    pub fn validate(&self) -> Result<()> {
        if self.prefixes.is_empty() {
            return Err(JitError::Config(
                "prefixes must contain at least one entry (use \"\" for no prefix)".into(),
            ));
        }
        if self.extensions.is_empty() {
            return Err(JitError::Config(
                "extensions must contain at least one entry".into(),
            ));
        }
        if let Some(bad) = self.extensions.iter().find(|e| e.trim().is_empty()) {
            return Err(JitError::Config(format!("Invalid extension '{}'", bad)));
        }
        if self.dependency_dir.trim().is_empty() {
            return Err(JitError::Config("dependency_dir must not be empty".into()));
        }
        if self.max_ancestor_depth == 0 {
            return Err(JitError::Config(
                "max_ancestor_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// `1`, `true`, `yes` and `on` (any case) count as set.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
