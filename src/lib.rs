//! jit-tasks - just-in-time plugin resolution for task runners

pub mod config;
pub mod error;
pub mod host;
pub mod plugins;
pub mod runner;

pub use config::JitConfig;
pub use error::{JitError, Result, TaskNotFound};
pub use plugins::JitContext;
pub use runner::TaskRunner;
