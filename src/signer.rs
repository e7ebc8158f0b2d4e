//! External signer invocation.
//!
//! The signer is a black box: `<program> -s <path>` rewrites the file in place
//! and reports through its exit status. [`Signer`] is the seam the
//! orchestrator is generic over, so tests can swap the subprocess out.

use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

use crate::config::SignerConfig;
use crate::error::{AutosignError, Result};

/// How a signer process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerOutcome {
    /// Normal exit with a status code
    Exited(i32),
    /// Terminated by a signal
    Signaled(i32),
}

impl SignerOutcome {
    /// Shell convention: the exit code, or `128 + signal`.
    pub fn code(self) -> i32 {
        match self {
            SignerOutcome::Exited(code) => code,
            SignerOutcome::Signaled(sig) => 128 + sig,
        }
    }

    pub fn success(self) -> bool {
        self.code() == 0
    }
}

impl From<ExitStatus> for SignerOutcome {
    fn from(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(code), _) => SignerOutcome::Exited(code),
            (None, Some(sig)) => SignerOutcome::Signaled(sig),
            // Stopped/continued never surface from a blocking wait; treat
            // anything else as a generic failure.
            (None, None) => SignerOutcome::Exited(1),
        }
    }
}

impl fmt::Display for SignerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerOutcome::Exited(code) => write!(f, "exited with code {}", code),
            SignerOutcome::Signaled(sig) => write!(f, "terminated by signal {}", sig),
        }
    }
}

/// Something that can sign a file in place.
pub trait Signer {
    /// Run the signer on `path` and block until it finishes.
    ///
    /// `Err` means the signer could not be started at all.
    fn sign(&self, path: &Path) -> Result<SignerOutcome>;
}

/// Runs the configured signing tool as a child process.
#[derive(Debug, Clone)]
pub struct ProcessSigner {
    program: PathBuf,
    sign_flag: String,
}

impl ProcessSigner {
    pub fn new(config: &SignerConfig) -> Self {
        Self {
            program: config.program.clone(),
            sign_flag: config.sign_flag.clone(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for ProcessSigner {
    fn default() -> Self {
        Self::new(&SignerConfig::default())
    }
}

impl Signer for ProcessSigner {
    fn sign(&self, path: &Path) -> Result<SignerOutcome> {
        debug!(program = %self.program.display(), path = %path.display(), "Spawning signer");
        // Environment is inherited; the signer gets no stdin.
        let status = Command::new(&self.program)
            .arg(&self.sign_flag)
            .arg(path)
            .stdin(Stdio::null())
            .status()
            .map_err(|source| AutosignError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        Ok(SignerOutcome::from(status))
    }
}
