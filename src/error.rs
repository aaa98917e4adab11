//! Error types for descriptor resolution and command execution

use std::path::PathBuf;
use thiserror::Error;

/// A descriptor file could not be turned into a button record
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("descriptor {path:?} is unavailable: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("descriptor {path:?} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("button has no descriptor file or index")]
    MissingIdentity,
}

/// An external command failed to run to a zero exit
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn interpreter: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },

    #[error("command exited with code {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },
}
