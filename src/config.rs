//! Configuration for the autosign pipeline.
//!
//! Everything here is compiled in. The defaults are the values dpkg on
//! jailbroken iOS relies on and must not drift.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Master configuration for the close-to-sign pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosignConfig {
    /// Which closed files are worth classifying.
    pub filter: FilterConfig,
    /// Limits applied while decoding Mach-O headers.
    pub classifier: ClassifierConfig,
    /// External signer invocation.
    pub signer: SignerConfig,
}

/// Path and size rules for installer staging files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// dpkg writes unpacked files as `<name>.dpkg-new` before renaming them.
    pub staging_suffix: String,
    /// dpkg extracts maintainer scripts into `tmp.ci` under its admin dir.
    pub staging_prefix: String,
    /// Files must be strictly larger than this to be inspected.
    pub min_size: u64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            staging_suffix: ".dpkg-new".to_string(),
            staging_prefix: "/Library/dpkg/tmp.ci".to_string(),
            min_size: 0x100,
        }
    }
}

/// Bounds for the Mach-O classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Fat headers claiming more slices than this are rejected. Java class
    /// files share the `0xcafebabe` magic and carry their version there.
    pub max_fat_arches: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { max_fat_arches: 30 }
    }
}

/// How the external signer is invoked: `<program> <sign_flag> <path>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    pub program: PathBuf,
    pub sign_flag: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("/usr/bin/ldid"),
            sign_flag: "-s".to_string(),
        }
    }
}
