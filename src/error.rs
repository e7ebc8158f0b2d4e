//! Error types for the autosign pipeline.
//!
//! None of these ever reach the host process: the orchestrator folds them into
//! an integer code and the close shim only logs that code.

use std::path::PathBuf;
use thiserror::Error;

use crate::io::error::IoError;
use crate::signer::SignerOutcome;

/// Failure code for errors that have no exit status of their own.
pub const FAILURE_CODE: i32 = -1;

/// Main error type for a single signing attempt.
#[derive(Debug, Error)]
pub enum AutosignError {
    /// The candidate could not be opened read-write
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The candidate could not be mapped
    #[error("failed to map {}: {source}", .path.display())]
    Map {
        path: PathBuf,
        #[source]
        source: IoError,
    },

    /// The signer process could not be created
    #[error("failed to spawn {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The signer ran but did not succeed
    #[error("signer {0}")]
    SignerFailed(SignerOutcome),

    /// The original permission bits could not be put back
    #[error("failed to restore mode {mode:#o} on {}: {source}", .path.display())]
    RestoreMode {
        path: PathBuf,
        mode: u32,
        #[source]
        source: std::io::Error,
    },
}

impl AutosignError {
    /// Attach the candidate path to a mapping failure.
    pub fn from_image(path: impl Into<PathBuf>, err: IoError) -> Self {
        let path = path.into();
        match err {
            IoError::Open(source) => AutosignError::Open { path, source },
            other => AutosignError::Map {
                path,
                source: other,
            },
        }
    }

    /// Integer code reported by [`crate::autosign()`].
    pub fn code(&self) -> i32 {
        match self {
            AutosignError::SignerFailed(outcome) => outcome.code(),
            _ => FAILURE_CODE,
        }
    }
}

/// Result type alias for autosign operations
pub type Result<T> = std::result::Result<T, AutosignError>;
