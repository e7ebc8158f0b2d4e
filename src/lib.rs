//! Automatic re-signing of Mach-O binaries written by a package installer.
//!
//! The library is injected into the installer process. It wraps `close(2)`,
//! and when a freshly written dpkg staging file turns out to contain an arm64
//! Mach-O module it runs `ldid -s` on it and puts the original mode back.

pub mod autosign;
pub mod config;
pub mod error;
pub mod filter;
pub mod formats;
pub mod hook;
pub mod io;
pub mod logging;
pub mod signer;

pub use autosign::{autosign, Autosigner};
pub use config::AutosignConfig;
pub use error::{AutosignError, Result};
pub use filter::{should_inspect, CandidateFile};
pub use formats::macho::classify;
pub use signer::{ProcessSigner, Signer, SignerOutcome};
