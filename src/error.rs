//! Centralized error types for deckhand
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed line {line} in {path}: expected KEY=value")]
    Malformed { path: String, line: usize },

    #[error("Missing configuration key {key}. Set it in the .env file or the environment")]
    MissingKey { key: &'static str },
}

/// Subprocess execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command exited with status {code}: {command}")]
    Failed { command: String, code: i32 },
}
