//! Plugin package location.
//!
//! A package's tasks live at `<plugins_root>/<package>/tasks`. When the plugins
//! root sits inside a dependency directory, the package may also have been
//! hoisted to an ancestor, so the locator walks upward looking for
//! `<ancestor>/<dependency_dir>/<package>`, matching both segments
//! case-insensitively.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};

/// Default bound on the number of ancestors the upward search visits.
pub const DEFAULT_MAX_ANCESTOR_DEPTH: usize = 32;

const TASKS_DIR: &str = "tasks";

/// Finds the `tasks` directory of a plugin package.
#[derive(Debug, Clone)]
pub struct PluginLocator<'a> {
    plugins_root: &'a Path,
    dependency_dir: &'a str,
    max_depth: usize,
}

impl<'a> PluginLocator<'a> {
    pub fn new(plugins_root: &'a Path, dependency_dir: &'a str, max_depth: usize) -> Self {
        Self {
            plugins_root,
            dependency_dir,
            max_depth,
        }
    }

    /// Locate the task directory of `package`. `None` is an ordinary outcome.
    pub fn locate(&self, package: &str) -> Option<PathBuf> {
        let direct = self.plugins_root.join(package).join(TASKS_DIR);
        if direct.is_dir() {
            trace!(package, path = %direct.display(), "Found plugin under plugins root");
            return Some(direct);
        }

        if !self.root_is_dependency_dir() {
            return None;
        }

        let package_dir = self.find_up(package)?;
        let tasks = package_dir.join(TASKS_DIR);
        if tasks.is_dir() {
            debug!(package, path = %tasks.display(), "Found hoisted plugin");
            Some(tasks)
        } else {
            None
        }
    }

    /// Whether the plugins root lexically mentions the dependency directory.
    pub fn root_is_dependency_dir(&self) -> bool {
        self.plugins_root
            .to_string_lossy()
            .contains(self.dependency_dir)
    }

    /// Walk from the plugins root toward the filesystem root, at most
    /// `max_depth` directories, returning the first matching package dir.
    fn find_up(&self, package: &str) -> Option<PathBuf> {
        let mut current = Some(self.plugins_root);
        let mut visited = 0;

        while let Some(dir) = current {
            if visited >= self.max_depth {
                debug!(
                    package,
                    max_depth = self.max_depth,
                    "Ancestor search bound reached"
                );
                return None;
            }
            visited += 1;

            let relative = Path::new(self.dependency_dir).join(package);
            if let Some(found) = find_case_insensitive(dir, &relative) {
                return Some(found);
            }
            current = dir.parent();
        }

        None
    }
}

/// Join `relative` onto `base`, matching each component case-insensitively.
/// An exact-case entry wins over a case-folded one.
fn find_case_insensitive(base: &Path, relative: impl AsRef<Path>) -> Option<PathBuf> {
    let mut path = base.to_path_buf();
    for component in relative.as_ref().components() {
        let name = match component {
            Component::Normal(name) => name.to_string_lossy().into_owned(),
            _ => return None,
        };

        let exact = path.join(&name);
        if exact.exists() {
            path = exact;
            continue;
        }

        let entries = fs::read_dir(&path).ok()?;
        let folded = entries
            .filter_map(|entry| entry.ok())
            .find(|entry| entry.file_name().to_string_lossy().eq_ignore_ascii_case(&name))?;
        path = folded.path();
    }
    Some(path)
}
