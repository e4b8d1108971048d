//! Error types for the reconcile crate

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading or normalizing resources
#[derive(Error, Debug)]
pub enum Error {
    /// A file or directory could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory enumeration failed
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// A document in a stream could not be decoded
    #[error("failed to decode yaml stream from {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The command could not be started, awaited, or its output read
    #[error("failed to execute {command}: {source}")]
    CommandIo {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran but exited unsuccessfully
    #[error("command '{command}' failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The command did not finish before its deadline
    #[error("command '{command}' timed out after {timeout:?}")]
    CommandTimeout { command: String, timeout: Duration },

    /// The worker pool could not be created
    #[error("failed to create thread pool: {0}")]
    ThreadPool(String),
}

/// Result type for reconcile operations
pub type Result<T> = std::result::Result<T, Error>;
