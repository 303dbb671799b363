//! Task manifest files
//!
//! A plugin's `tasks` directory (or a single-file plugin) holds manifests in
//! JSON or JSON5:
//!
//! ```json
//! {
//!   "plugin": "grunt-contrib-copy",
//!   "tasks": [
//!     {
//!       "name": "copy",
//!       "description": "Copy build output",
//!       "command": "cp -r src/{{0}} dist/",
//!       "working_dir": "..",
//!       "env": { "LANG": "C" }
//!     }
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{JitError, Result};

static TASK_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_\-]{0,63}$").unwrap());

/// Extensions recognized as task manifests.
pub const MANIFEST_EXTENSIONS: &[&str] = &["json", "json5"];

/// A file of task definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskManifest {
    /// Optional plugin name, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,

    pub tasks: Vec<TaskSpec>,
}

/// One task definition: a shell command template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Task name. Letters, digits, `_` and `-`, starting with a letter.
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Shell command. `{{name}}`, `{{args}}` and `{{0}}`..`{{n}}` are interpolated.
    pub command: String,

    /// Working directory, relative to the manifest's directory.
    #[serde(default)]
    pub working_dir: Option<String>,

    #[serde(default)]
    pub env: Option<HashMap<String, String>>,
}

/// Whether `path` has a manifest extension.
pub fn is_manifest_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MANIFEST_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Parse a JSON or JSON5 file into a value, picking the parser by extension.
pub fn read_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .map_err(|e| JitError::Load(format!("Failed to read {}: {}", path.display(), e)))?;

    let is_json5 = path.extension().and_then(|e| e.to_str()) == Some("json5");
    if is_json5 {
        Ok(json5::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

/// Whether a parsed value looks like a task manifest.
pub fn is_manifest_value(value: &Value) -> bool {
    value.get("tasks").map(Value::is_array).unwrap_or(false)
}

/// Convert and validate a parsed value.
pub fn parse_manifest(value: Value) -> Result<TaskManifest> {
    let manifest: TaskManifest = serde_json::from_value(value)?;
    validate_manifest(&manifest)?;
    Ok(manifest)
}

pub fn load_manifest(path: &Path) -> Result<TaskManifest> {
    parse_manifest(read_value(path)?)
}

/// Load every manifest in `dir`, in file name order.
///
/// Invalid manifests are logged and skipped; an unreadable directory is an
/// error.
pub fn discover_manifests(dir: &Path) -> Result<Vec<(PathBuf, TaskManifest)>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        JitError::Load(format!(
            "Failed to read task directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| JitError::Load(format!("Failed to read directory entry: {}", e)))?;
        let path = entry.path();
        if path.is_file() && is_manifest_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut manifests = Vec::new();
    for path in paths {
        match load_manifest(&path) {
            Ok(manifest) => {
                debug!(path = %path.display(), tasks = manifest.tasks.len(), "Loaded task manifest");
                manifests.push((path, manifest));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid task manifest, skipping");
            }
        }
    }

    Ok(manifests)
}

/// Validate a manifest.
///
/// - At least one task must be defined
/// - Task names must match `^[a-zA-Z][a-zA-Z0-9_-]{0,63}$` and be unique
/// - Commands must be non-empty
pub fn validate_manifest(manifest: &TaskManifest) -> Result<()> {
    let label = manifest.plugin.as_deref().unwrap_or("<unnamed>");

    if manifest.tasks.is_empty() {
        return Err(JitError::Load(format!(
            "Manifest '{}' must define at least one task",
            label
        )));
    }

    let mut seen = HashSet::new();
    for task in &manifest.tasks {
        if !TASK_NAME.is_match(&task.name) {
            return Err(JitError::Load(format!(
                "Invalid task name '{}' in '{}': must be 1-64 letters, digits, '_' or '-', starting with a letter",
                task.name, label
            )));
        }
        if !seen.insert(task.name.as_str()) {
            return Err(JitError::Load(format!(
                "Task '{}' is defined twice in '{}'",
                task.name, label
            )));
        }
        if task.command.trim().is_empty() {
            return Err(JitError::Load(format!(
                "Task '{}' in '{}' has an empty command",
                task.name, label
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn valid_manifest() -> TaskManifest {
        TaskManifest {
            plugin: Some("grunt-test".to_string()),
            tasks: vec![TaskSpec {
                name: "test".to_string(),
                description: "Run tests".to_string(),
                command: "echo test".to_string(),
                working_dir: None,
                env: None,
            }],
        }
    }

    fn write_manifest(dir: &Path, file: &str, manifest: &TaskManifest) -> PathBuf {
        let path = dir.join(file);
        fs::write(&path, serde_json::to_string_pretty(manifest).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_parse_full_manifest() {
        let manifest = parse_manifest(json!({
            "plugin": "grunt-contrib-copy",
            "tasks": [
                {
                    "name": "copy",
                    "description": "Copy files",
                    "command": "cp {{0}} {{1}}",
                    "working_dir": "..",
                    "env": { "LANG": "C" }
                },
                { "name": "copy_all", "command": "cp -r src dist" }
            ]
        }))
        .unwrap();

        assert_eq!(manifest.plugin.as_deref(), Some("grunt-contrib-copy"));
        assert_eq!(manifest.tasks.len(), 2);
        assert_eq!(manifest.tasks[0].working_dir.as_deref(), Some(".."));
        assert!(manifest.tasks[0].env.is_some());
        assert_eq!(manifest.tasks[1].description, "");
    }

    #[test]
    fn test_parse_missing_tasks_field() {
        assert!(parse_manifest(json!({ "plugin": "x" })).is_err());
    }

    #[test]
    fn test_is_manifest_value() {
        assert!(is_manifest_value(&json!({ "tasks": [] })));
        assert!(!is_manifest_value(&json!({ "tasks": "nope" })));
        assert!(!is_manifest_value(&json!("just a string")));
        assert!(!is_manifest_value(&json!(42)));
    }

    #[test]
    fn test_read_value_json5() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("deploy.json5");
        fs::write(
            &path,
            "{ // deploy\n tasks: [{ name: 'deploy', command: 'echo deploy', },], }",
        )
        .unwrap();

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.tasks[0].name, "deploy");
    }

    #[test]
    fn test_read_value_rejects_json5_syntax_in_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("deploy.json");
        fs::write(&path, "{ tasks: [] }").unwrap();
        assert!(matches!(read_value(&path), Err(JitError::Json(_))));
    }

    #[test]
    fn test_discover_manifests_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let mut b = valid_manifest();
        b.tasks[0].name = "beta".to_string();
        write_manifest(tmp.path(), "b.json", &b);
        let mut a = valid_manifest();
        a.tasks[0].name = "alpha".to_string();
        write_manifest(tmp.path(), "a.json", &a);
        fs::write(tmp.path().join("README.md"), "# tasks").unwrap();
        fs::write(tmp.path().join("broken.json"), "{ broken").unwrap();
        fs::create_dir(tmp.path().join("nested.json")).unwrap();

        let found = discover_manifests(tmp.path()).unwrap();
        let names: Vec<&str> = found
            .iter()
            .map(|(_, m)| m.tasks[0].name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_discover_manifests_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let result = discover_manifests(&tmp.path().join("nope"));
        assert!(matches!(result, Err(JitError::Load(_))));
    }

    #[test]
    fn test_validate_valid() {
        assert!(validate_manifest(&valid_manifest()).is_ok());
    }

    #[test]
    fn test_validate_no_tasks() {
        let mut manifest = valid_manifest();
        manifest.tasks.clear();
        let err = validate_manifest(&manifest).unwrap_err();
        assert!(err.to_string().contains("at least one task"));
    }

    #[test]
    fn test_validate_task_names() {
        let mut manifest = valid_manifest();
        for good in ["copy", "copyFiles", "sass-lint", "build_all2"] {
            manifest.tasks[0].name = good.to_string();
            assert!(validate_manifest(&manifest).is_ok(), "{}", good);
        }
        let too_long = "a".repeat(65);
        for bad in ["", "1copy", "copy files", "copy:dist", "-copy", too_long.as_str()] {
            manifest.tasks[0].name = bad.to_string();
            assert!(validate_manifest(&manifest).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_validate_duplicate_names() {
        let mut manifest = valid_manifest();
        manifest.tasks.push(manifest.tasks[0].clone());
        let err = validate_manifest(&manifest).unwrap_err();
        assert!(err.to_string().contains("defined twice"));
    }

    #[test]
    fn test_validate_empty_command() {
        let mut manifest = valid_manifest();
        manifest.tasks[0].command = "   ".to_string();
        assert!(validate_manifest(&manifest).is_err());
    }

    #[test]
    fn test_is_manifest_file() {
        assert!(is_manifest_file(Path::new("a/copy.json")));
        assert!(is_manifest_file(Path::new("copy.json5")));
        assert!(!is_manifest_file(Path::new("copy.js")));
        assert!(!is_manifest_file(Path::new("copy")));
    }
}
