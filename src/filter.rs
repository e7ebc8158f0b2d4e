//! Cheap gate run on every intercepted close.
//!
//! Almost every close in an installer is for something we do not care about,
//! so the checks are ordered cheapest first and never allocate.

use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::RawFd;
use std::path::PathBuf;

use crate::config::FilterConfig;

/// A file that was just closed, as seen right before the close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub descriptor: RawFd,
    pub size: u64,
    /// Full `st_mode`, file type bits included.
    pub mode: u32,
    pub is_regular_file: bool,
}

impl CandidateFile {
    /// Permission bits only, as `chmod` expects them.
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }
}

/// Whether `candidate` looks like a file dpkg is in the middle of installing.
pub fn should_inspect(candidate: &CandidateFile, rules: &FilterConfig) -> bool {
    if !candidate.is_regular_file || candidate.size <= rules.min_size {
        return false;
    }
    let path = candidate.path.as_os_str().as_bytes();
    path.ends_with(rules.staging_suffix.as_bytes())
        || path.starts_with(rules.staging_prefix.as_bytes())
}
