//! Lazy plugin resolution for jit-tasks
//!
//! Instead of loading every installed task plugin up front, the host is given
//! an interceptor that resolves plugins the first time one of their tasks is
//! invoked.
//!
//! # Architecture
//!
//! - **naming**: task name to prefixed, dash-cased package name candidates
//! - **mapping**: explicit task name to locator overrides
//! - **locator**: finds `<root>/<package>/tasks`, including hoisted packages
//! - **scanner**: single-file task definitions in a custom tasks directory
//! - **loader**: loads a located plugin into the host
//! - **interceptor**: the `TaskResolver` tying the above together
//! - **context**: shared state and the once-only installation entry point
//!
//! # Plugin Directory Structure
//!
//! ```text
//! project/
//! ├── jit-tasks.json
//! ├── build/tasks/
//! │   └── release.json          # custom task file for `release`
//! └── node_modules/
//!     ├── grunt-contrib-copy/
//!     │   └── tasks/            # provides `copy`
//!     │       └── copy.json
//!     └── grunt-shell/
//!         └── tasks/            # provides `shell`
//!             └── shell.json
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use jit_tasks::config::JitConfig;
//! use jit_tasks::plugins::JitContext;
//! use jit_tasks::runner::TaskRunner;
//!
//! let ctx = JitContext::new(JitConfig::default()).unwrap();
//! let mut runner = TaskRunner::new();
//! ctx.configure(&mut runner, [("sprite", "grunt-spritesmith")]);
//!
//! // `copy` is not registered yet; its plugin is located and loaded now.
//! runner.run("copy:dist").unwrap();
//! ```

mod context;
mod interceptor;
pub mod loader;
pub mod locator;
pub mod mapping;
pub mod naming;
pub mod scanner;

pub use context::JitContext;
pub use interceptor::{Interceptor, ResolvedPlugin, Strategy};
pub use loader::{load_plugin, PluginLocation};
pub use locator::PluginLocator;
pub use mapping::{Locator, MappingRegistry};
pub use naming::{dash_case, package_candidates};
pub use scanner::find_custom_file;
