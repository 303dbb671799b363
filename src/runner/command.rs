//! Shell command tasks.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::error::{JitError, Result};
use crate::host::{TaskDef, TaskInvocation};

use super::manifest::TaskSpec;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").unwrap());

/// Fill `{{name}}`, `{{args}}` and positional `{{N}}` placeholders.
///
/// Missing positional arguments and unknown placeholders become empty.
pub fn interpolate(template: &str, invocation: &TaskInvocation) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "name" => invocation.name.clone(),
            "args" => invocation.args.join(" "),
            key => key
                .parse::<usize>()
                .ok()
                .and_then(|i| invocation.args.get(i).cloned())
                .unwrap_or_default(),
        })
        .into_owned()
}

/// Build a registrable task that runs `spec.command` in a shell.
///
/// A relative `working_dir` is taken relative to `base_dir`, the directory
/// the manifest was loaded from.
pub fn command_task(spec: TaskSpec, base_dir: &Path) -> TaskDef {
    let working_dir = match &spec.working_dir {
        Some(dir) => base_dir.join(dir),
        None => base_dir.to_path_buf(),
    };
    let template = spec.command;
    let env = spec.env.unwrap_or_default();

    TaskDef::new(
        spec.name,
        spec.description,
        Arc::new(move |invocation: &TaskInvocation| {
            let command = interpolate(&template, invocation);
            run_shell(&command, &working_dir, &env)
        }),
    )
}

fn run_shell(command: &str, working_dir: &Path, env: &HashMap<String, String>) -> Result<()> {
    debug!(command, dir = %working_dir.display(), "Running task command");

    let mut cmd = shell(command);
    cmd.current_dir(working_dir).envs(env);

    let status = cmd
        .status()
        .map_err(|e| JitError::Task(format!("Failed to spawn '{}': {}", command, e)))?;

    if status.success() {
        Ok(())
    } else {
        Err(JitError::Task(format!(
            "Command '{}' exited with {}",
            command,
            status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "a signal".to_string())
        )))
    }
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn invocation(args: &[&str]) -> TaskInvocation {
        TaskInvocation {
            name: "copy".to_string(),
            name_args: std::iter::once("copy")
                .chain(args.iter().copied())
                .collect::<Vec<_>>()
                .join(":"),
            args: args.iter().map(|a| a.to_string()).collect(),
            flags: BTreeMap::new(),
        }
    }

    fn spec(command: &str) -> TaskSpec {
        TaskSpec {
            name: "copy".to_string(),
            description: "Copy files".to_string(),
            command: command.to_string(),
            working_dir: None,
            env: None,
        }
    }

    #[test]
    fn test_interpolate_placeholders() {
        let inv = invocation(&["dist", "force"]);
        assert_eq!(
            interpolate("run {{name}} {{ 0 }} -- {{args}}", &inv),
            "run copy dist -- dist force"
        );
    }

    #[test]
    fn test_interpolate_missing_and_unknown() {
        let inv = invocation(&[]);
        assert_eq!(interpolate("cp {{0}}{{1}} {{nope}}.", &inv), "cp  .");
        assert_eq!(interpolate("no placeholders", &inv), "no placeholders");
    }

    #[test]
    fn test_command_task_metadata() {
        let task = command_task(spec("true"), Path::new("/tmp"));
        assert_eq!(task.name, "copy");
        assert_eq!(task.description, "Copy files");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_task_success_and_failure() {
        let ok = command_task(spec("test {{0}} = dist"), Path::new("/"));
        assert!((ok.run)(&invocation(&["dist"])).is_ok());

        let err = (ok.run)(&invocation(&["src"])).unwrap_err();
        assert!(err.to_string().contains("exited with 1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_task_working_dir_and_env() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("out")).unwrap();

        let mut s = spec("printf %s \"$GREETING\" > greeting.txt");
        s.working_dir = Some("out".to_string());
        s.env = Some(HashMap::from([("GREETING".to_string(), "hi".to_string())]));

        let task = command_task(s, tmp.path());
        (task.run)(&invocation(&[])).unwrap();

        let written = std::fs::read_to_string(tmp.path().join("out").join("greeting.txt")).unwrap();
        assert_eq!(written, "hi");
    }

    #[test]
    fn test_command_task_missing_working_dir() {
        let mut s = spec("true");
        s.working_dir = Some("definitely/not/here".to_string());
        let task = command_task(s, Path::new("/nonexistent-base"));
        let err = (task.run)(&invocation(&[])).unwrap_err();
        assert!(matches!(err, JitError::Task(_)));
    }
}
