//! Descriptor to path and metadata lookups.
//!
//! Both lookups must run while the descriptor is still open. Either may fail
//! (pipes, sockets, unlinked files); the shim then skips the descriptor.

use std::os::unix::io::RawFd;
use std::path::PathBuf;

/// What `fstat` told us about a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub mode: u32,
    pub is_regular_file: bool,
}

impl FileStat {
    pub fn from_mode(mode: u32, size: u64) -> Self {
        Self {
            size,
            mode,
            is_regular_file: (mode & libc::S_IFMT as u32) == libc::S_IFREG as u32,
        }
    }
}

/// Resolves what an open descriptor refers to.
pub trait DescriptorInspector {
    /// Path the descriptor was opened with, if still knowable.
    fn path_of(&self, fd: RawFd) -> Option<PathBuf>;

    /// Type, size and permission bits of the descriptor's file.
    fn stat(&self, fd: RawFd) -> Option<FileStat>;
}

/// Asks the kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInspector;

impl DescriptorInspector for SystemInspector {
    #[cfg(target_vendor = "apple")]
    fn path_of(&self, fd: RawFd) -> Option<PathBuf> {
        use std::ffi::{CStr, OsStr};
        use std::os::unix::ffi::OsStrExt;

        if fd < 0 {
            return None;
        }
        let mut buf = [0u8; libc::PATH_MAX as usize];
        // Safety: F_GETPATH writes at most MAXPATHLEN bytes into `buf`.
        let ret = unsafe { libc::fcntl(fd, libc::F_GETPATH, buf.as_mut_ptr()) };
        if ret != 0 || buf[0] == 0 {
            return None;
        }
        let path = CStr::from_bytes_until_nul(&buf).ok()?;
        Some(PathBuf::from(OsStr::from_bytes(path.to_bytes())))
    }

    #[cfg(not(target_vendor = "apple"))]
    fn path_of(&self, fd: RawFd) -> Option<PathBuf> {
        if fd < 0 {
            return None;
        }
        let path = std::fs::read_link(format!("/proc/self/fd/{fd}")).ok()?;
        // Pipes and sockets resolve to things like "pipe:[1234]".
        path.is_absolute().then_some(path)
    }

    fn stat(&self, fd: RawFd) -> Option<FileStat> {
        if fd < 0 {
            return None;
        }
        let mut st = std::mem::MaybeUninit::<libc::stat>::uninit();
        // Safety: fstat fills `st` on success and we only read it then.
        let st = unsafe {
            if libc::fstat(fd, st.as_mut_ptr()) != 0 {
                return None;
            }
            st.assume_init()
        };
        let size = u64::try_from(st.st_size).ok()?;
        Some(FileStat::from_mode(st.st_mode as u32, size))
    }
}
