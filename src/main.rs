use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use jit_tasks::config::JitConfig;
use jit_tasks::plugins::{Interceptor, JitContext};
use jit_tasks::runner::TaskRunner;

#[derive(Parser)]
#[command(name = "jit-tasks")]
#[command(version, about = "Run tasks, loading their plugins on first use", long_about = None)]
struct Cli {
    /// Config file (defaults to ./jit-tasks.json when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding plugin packages
    #[arg(long, global = true)]
    plugins_root: Option<PathBuf>,

    /// Directory of single-file task definitions
    #[arg(long, global = true)]
    custom_tasks_dir: Option<PathBuf>,

    /// Explicit mapping, repeatable
    #[arg(short = 'm', long = "map", value_name = "TASK=LOCATOR", value_parser = parse_mapping, global = true)]
    mappings: Vec<(String, String)>,

    /// Show plugin loading headers and debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run tasks in order (`name` or `name:arg:arg`)
    Run {
        #[arg(required = true)]
        tasks: Vec<String>,
    },
    /// Show which plugin would provide a task, without loading it
    Locate { task: String },
    /// Print the effective configuration
    Config,
}

fn parse_mapping(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((task, locator)) if !task.trim().is_empty() && !locator.trim().is_empty() => {
            Ok((task.trim().to_string(), locator.trim().to_string()))
        }
        _ => Err(format!("expected TASK=LOCATOR, got '{}'", s)),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "jit_tasks=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let mut config = match &cli.config {
        Some(path) => JitConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => JitConfig::load_or_default(&cwd)?,
    };
    config.apply_env_overrides();
    if let Some(root) = cli.plugins_root {
        config.plugins_root = root;
    }
    if let Some(dir) = cli.custom_tasks_dir {
        config.custom_tasks_dir = Some(dir);
    }
    if cli.verbose {
        config.verbose = true;
    }
    debug!(?config, "Effective configuration");

    match cli.command {
        Commands::Config => {
            config.mappings.extend(cli.mappings);
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Locate { task } => {
            let ctx = JitContext::with_cwd(config, &cwd)?;
            let mut runner = TaskRunner::new();
            ctx.configure(&mut runner, cli.mappings);

            match Interceptor::new(ctx).locate(&task) {
                Some(plugin) => println!(
                    "{} -> {} ({}, via {})",
                    task,
                    plugin.location.path().display(),
                    plugin.name,
                    plugin.strategy
                ),
                None => bail!("No plugin found for task \"{}\"", task),
            }
        }
        Commands::Run { tasks } => {
            let ctx = JitContext::with_cwd(config, &cwd)?;
            let mut runner = TaskRunner::new();
            if cli.verbose {
                runner.set_option("verbose", "true");
            }
            ctx.configure(&mut runner, cli.mappings);

            runner.run_all(&tasks)?;
            println!("\nDone.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping() {
        assert_eq!(
            parse_mapping("sprite=grunt-spritesmith").unwrap(),
            ("sprite".to_string(), "grunt-spritesmith".to_string())
        );
        assert_eq!(
            parse_mapping(" release = tools/release.json ").unwrap(),
            ("release".to_string(), "tools/release.json".to_string())
        );
        assert!(parse_mapping("sprite").is_err());
        assert!(parse_mapping("=pkg").is_err());
        assert!(parse_mapping("task=").is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::parse_from([
            "jit-tasks",
            "run",
            "copy:dist",
            "lint",
            "-m",
            "sprite=grunt-spritesmith",
            "-v",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.mappings.len(), 1);
        match cli.command {
            Commands::Run { tasks } => assert_eq!(tasks, vec!["copy:dist", "lint"]),
            _ => panic!("expected run"),
        }
    }
}
