//! Scoped, read-only mapping of a candidate file.
//!
//! `MappedImage` owns both the descriptor and the mapping. Dropping it unmaps
//! and closes on every path out of the orchestrator, early returns included.

pub mod error;

use crate::io::error::{IoError, Result};
use memmap2::{Mmap, MmapOptions};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Read-only view over the first `len` bytes of a file.
pub struct MappedImage {
    path: PathBuf,
    mmap: Mmap,
    // Held so the descriptor lives exactly as long as the mapping.
    _file: File,
}

impl MappedImage {
    /// Opens `path` read-write and maps up to `declared_size` bytes read-only.
    ///
    /// The mapping is clamped to the file's current length so a file that
    /// shrank after `fstat` cannot fault on access. Write access is requested
    /// because the signer will rewrite the same file; a file we could not
    /// write is not one we can fix anyway.
    pub fn open<P: AsRef<Path>>(path: P, declared_size: u64) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(IoError::Open)?;
        let current = file.metadata().map_err(IoError::Map)?.len();
        let len = declared_size.min(current);

        debug!(
            path = %path.display(),
            declared_size,
            current_size = current,
            "Mapping candidate"
        );

        // memmap cannot map empty files.
        if len == 0 {
            return Err(IoError::Empty);
        }
        let len = usize::try_from(len).map_err(|_| {
            IoError::Map(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "file larger than the address space",
            ))
        })?;

        // Safety: read-only private mapping of a regular file; the length is
        // bounded by the size reported for the open descriptor.
        let mmap = unsafe { MmapOptions::new().len(len).map(&file) }.map_err(IoError::Map)?;

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            _file: file,
        })
    }

    /// The mapped bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// Number of mapped bytes.
    pub fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MappedImage {
    fn drop(&mut self) {
        trace!(path = %self.path.display(), "Releasing mapping");
    }
}
