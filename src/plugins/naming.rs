//! Naming convention search: task name to candidate package names.

use once_cell::sync::Lazy;
use regex::Regex;

/// Package prefixes tried by convention search, most specific first.
pub const DEFAULT_PREFIXES: &[&str] = &["grunt-contrib-", "grunt-", ""];

static UPPERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z])").unwrap());
static UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());

/// Dash-case a task name: `copyFiles` -> `copy-files`, `foo__bar` -> `foo-bar`.
pub fn dash_case(task_name: &str) -> String {
    let dashed = UPPERCASE.replace_all(task_name, "-$1");
    UNDERSCORES.replace_all(&dashed, "-").to_lowercase()
}

/// Candidate package names for `task_name`, one per prefix, in prefix order.
pub fn package_candidates<S: AsRef<str>>(task_name: &str, prefixes: &[S]) -> Vec<String> {
    let base = dash_case(task_name);
    prefixes
        .iter()
        .map(|prefix| format!("{}{}", prefix.as_ref(), base))
        .collect()
}
