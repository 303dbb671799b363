//! Custom task directory scanning.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

/// Single-file task extensions, highest priority first.
pub const DEFAULT_EXTENSIONS: &[&str] = &["json", "json5"];

/// Find `<dir>/<task_name>.<ext>` for the first extension that exists.
///
/// Task names that would escape `dir` (separators, `..`) never match.
pub fn find_custom_file<S: AsRef<str>>(
    dir: &Path,
    task_name: &str,
    extensions: &[S],
) -> Option<PathBuf> {
    if !is_plain_file_name(task_name) {
        debug!(task = task_name, "Task name is not a plain file name, skipping custom dir");
        return None;
    }

    extensions.iter().find_map(|ext| {
        let ext = ext.as_ref().trim_start_matches('.');
        let candidate = dir.join(format!("{}.{}", task_name, ext));
        candidate.is_file().then_some(candidate)
    })
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains('/')
        && !name.contains('\\')
}
