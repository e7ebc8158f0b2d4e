//! Signing orchestrator: map, classify, sign, restore mode.

use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::AutosignConfig;
use crate::error::{AutosignError, Result};
use crate::filter::{should_inspect, CandidateFile};
use crate::formats::macho::classify_with_limit;
use crate::hook::CloseHandler;
use crate::io::MappedImage;
use crate::signer::{ProcessSigner, Signer};

/// What happened to a candidate that made it through [`Autosigner::try_autosign`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignStatus {
    /// Not an arm64 Mach-O module that needs a signature
    NotRequired,
    /// Signed and mode restored
    Signed,
}

/// Drives one candidate from "file closed" to "file signed".
#[derive(Debug, Clone)]
pub struct Autosigner<S = ProcessSigner> {
    config: AutosignConfig,
    signer: S,
}

impl Autosigner<ProcessSigner> {
    pub fn from_config(config: AutosignConfig) -> Self {
        let signer = ProcessSigner::new(&config.signer);
        Self { config, signer }
    }
}

impl Default for Autosigner<ProcessSigner> {
    fn default() -> Self {
        Self::from_config(AutosignConfig::default())
    }
}

impl<S: Signer> Autosigner<S> {
    pub fn new(config: AutosignConfig, signer: S) -> Self {
        Self { config, signer }
    }

    pub fn config(&self) -> &AutosignConfig {
        &self.config
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    /// Map the first `size` bytes of `path` and classify them.
    ///
    /// The mapping and its descriptor are released before this returns.
    pub fn requires_signing(&self, path: &Path, size: u64) -> Result<bool> {
        let image =
            MappedImage::open(path, size).map_err(|e| AutosignError::from_image(path, e))?;
        let required = classify_with_limit(
            image.bytes(),
            image.len(),
            self.config.classifier.max_fat_arches,
        );
        if required {
            debug!(path = %path.display(), "found mach-o that needs to be resigned");
        }
        Ok(required)
    }

    /// Classify `path` and, if needed, sign it and put `mode` back.
    pub fn try_autosign(&self, path: &Path, mode: u32, size: u64) -> Result<SignStatus> {
        if !self.requires_signing(path, size)? {
            return Ok(SignStatus::NotRequired);
        }

        let outcome = self.signer.sign(path)?;
        // The signer rewrites the file and may leave it with different bits.
        let restored = restore_mode(path, mode);

        if !outcome.success() {
            if let Err(e) = restored {
                warn!(error = %e, "mode restore failed after signer failure");
            }
            return Err(AutosignError::SignerFailed(outcome));
        }
        restored?;

        info!(path = %path.display(), "signed");
        Ok(SignStatus::Signed)
    }

    /// Integer form of [`Self::try_autosign`]: 0 for "nothing to do" or
    /// success, otherwise [`AutosignError::code`].
    pub fn autosign(&self, path: &Path, mode: u32, size: u64) -> i32 {
        match self.try_autosign(path, mode, size) {
            Ok(_) => 0,
            Err(e) => {
                let code = e.code();
                warn!(path = %path.display(), error = %e, code, "autosign failed");
                code
            }
        }
    }
}

impl<S: Signer> CloseHandler for Autosigner<S> {
    fn on_close(&self, candidate: &CandidateFile) {
        if !should_inspect(candidate, &self.config.filter) {
            return;
        }
        debug!(
            path = %candidate.path.display(),
            fd = candidate.descriptor,
            size = candidate.size,
            "inspecting closed file"
        );
        self.autosign(&candidate.path, candidate.mode, candidate.size);
    }
}

/// `chmod(path, mode & 07777)`.
fn restore_mode(path: &Path, mode: u32) -> Result<()> {
    let mode = mode & 0o7777;
    debug!(path = %path.display(), "fixing file permissions: mode {:o}", mode);
    fs::set_permissions(path, Permissions::from_mode(mode)).map_err(|source| {
        AutosignError::RestoreMode {
            path: path.to_path_buf(),
            mode,
            source,
        }
    })
}

/// Run the default pipeline (`/usr/bin/ldid -s`) on one file.
pub fn autosign(path: &Path, mode: u32, size: u64) -> i32 {
    Autosigner::default().autosign(path, mode, size)
}
