//! Explicit task name to plugin locator overrides.
//!
//! Entries are stored as raw strings and only classified when looked up, so a
//! bad locator surfaces at resolution time rather than at configuration time.

use std::collections::HashMap;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Where an explicit mapping points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A package name, located the same way convention search does.
    Package(String),
    /// A single-file plugin path, relative to the working directory.
    Path(PathBuf),
}

impl Locator {
    /// Anything containing a path separator is a path.
    pub fn parse(raw: &str) -> Self {
        if raw.contains('/') || raw.contains(MAIN_SEPARATOR) {
            Locator::Path(PathBuf::from(raw))
        } else {
            Locator::Package(raw.to_string())
        }
    }

    /// Resolve a path locator against `cwd`. Package locators are unchanged.
    pub fn resolved(self, cwd: &Path) -> Self {
        match self {
            Locator::Path(p) if p.is_relative() => Locator::Path(cwd.join(p)),
            other => other,
        }
    }
}

/// Task name to locator table. Later merges overwrite earlier entries.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    entries: HashMap<String, String>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite entries. Returns how many were merged.
    pub fn merge<I, K, V>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut merged = 0;
        for (task, locator) in entries {
            self.entries.insert(task.into(), locator.into());
            merged += 1;
        }
        merged
    }

    pub fn lookup(&self, task_name: &str) -> Option<Locator> {
        self.entries.get(task_name).map(|raw| Locator::parse(raw))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries sorted by task name.
    pub fn list(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        out.sort();
        out
    }
}
