//! Error types for jit-tasks
//!
//! This module defines the error types used throughout the crate. Uses
//! `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.
//!
//! Plugin resolution itself never raises: every failure on the resolution
//! path is absorbed and turned into a "not found" signal. The only failure
//! that leaves the interceptor is [`TaskNotFound`], and it leaves as a value.

use thiserror::Error;

/// A task invocation that still had no implementation after plugin resolution.
///
/// Returned (not raised) by the dispatch interceptor so the host can decide
/// how to report it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Task \"{name_args}\" failed.")]
pub struct TaskNotFound {
    /// The full invocation string, e.g. `copy:dist`.
    pub name_args: String,
    /// The task name resolution was attempted for (first colon segment).
    pub task: String,
}

/// The primary error type for jit-tasks operations.
#[derive(Error, Debug)]
pub enum JitError {
    /// Configuration-related errors (invalid config values, unreadable config file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Plugin loading errors (unreadable task directory, bad manifest, etc.)
    #[error("Plugin load error: {0}")]
    Load(String),

    /// Task execution errors (command failed, non-zero exit, etc.)
    #[error("Task error: {0}")]
    Task(String),

    /// Resource not found (plugin file, task directory, etc.)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Dispatch failed after plugin resolution was attempted
    #[error(transparent)]
    TaskNotFound(#[from] TaskNotFound),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON5 parse errors (config files, `.json5` manifests)
    #[error("JSON5 error: {0}")]
    Json5(#[from] json5::Error),
}

/// A specialized `Result` type for jit-tasks operations.
pub type Result<T> = std::result::Result<T, JitError>;
