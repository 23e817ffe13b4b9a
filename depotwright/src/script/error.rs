//! Error types for install scripts.

use std::path::PathBuf;

use thiserror::Error;

use crate::host::HostError;
use crate::installer::CopyError;

/// Errors raised while parsing or executing an install script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Malformed script text. Line and column are 1-based.
    #[error("syntax error in {file} at {line},{column}: {message}")]
    Syntax {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// A setup process exited with a non-zero code that was not ignored.
    #[error("{process} exited with code {exit_code}, executing {script} was stopped")]
    ProcessFailed {
        process: PathBuf,
        exit_code: i32,
        script: String,
    },

    /// A boolean option was neither `0` nor `1`.
    #[error("invalid boolean value '{value}' for {key}")]
    InvalidBoolean { key: String, value: String },

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Copy(#[from] CopyError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
