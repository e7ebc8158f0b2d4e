//! `close(2)` interception.
//!
//! The shim resolves the descriptor's path and metadata, forwards to the real
//! `close`, and only then hands the closed file to a [`CloseHandler`]. The
//! caller always sees exactly the return value and `errno` the real `close`
//! produced; nothing the handler does can leak back.

pub mod errno;
pub mod inspect;
#[cfg(feature = "interpose")]
mod interpose;

use libc::c_int;
use once_cell::sync::OnceCell;
use std::cell::Cell;
use std::os::unix::io::RawFd;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

use crate::autosign::Autosigner;
use crate::filter::CandidateFile;
use errno::ErrnoGuard;
pub use inspect::{DescriptorInspector, FileStat, SystemInspector};

/// Signature of `close(2)`.
pub type CloseFn = unsafe extern "C" fn(c_int) -> c_int;

/// The real `close`, captured once and never changed afterwards.
#[derive(Clone, Copy)]
pub struct OriginalClose(CloseFn);

impl OriginalClose {
    pub const fn new(f: CloseFn) -> Self {
        Self(f)
    }

    /// The `close` the platform would have called without us.
    ///
    /// dyld never applies interpose tuples to the image that declares them, so
    /// on Apple platforms libc's `close` is already the original.
    #[cfg(target_vendor = "apple")]
    pub fn resolve() -> Self {
        Self(libc::close)
    }

    /// The `close` the platform would have called without us.
    ///
    /// With `LD_PRELOAD` our own `close` shadows libc's, so look up the next
    /// definition, falling back to the raw syscall.
    #[cfg(not(target_vendor = "apple"))]
    pub fn resolve() -> Self {
        // Safety: RTLD_NEXT lookup of a NUL-terminated symbol name.
        let sym = unsafe { libc::dlsym(libc::RTLD_NEXT, b"close\0".as_ptr().cast()) };
        if sym.is_null() {
            return Self(raw_close);
        }
        // Safety: the symbol named "close" has the signature of close(2).
        Self(unsafe { std::mem::transmute::<*mut libc::c_void, CloseFn>(sym) })
    }

    /// Invoke the original `close`.
    pub fn call(&self, fd: RawFd) -> c_int {
        // Safety: close accepts any integer and reports bad ones via EBADF.
        unsafe { (self.0)(fd) }
    }
}

impl std::fmt::Debug for OriginalClose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OriginalClose({:p})", self.0 as *const ())
    }
}

#[cfg(not(target_vendor = "apple"))]
unsafe extern "C" fn raw_close(fd: c_int) -> c_int {
    libc::syscall(libc::SYS_close, fd) as c_int
}

/// Receives every file whose descriptor was closed through the shim.
pub trait CloseHandler {
    fn on_close(&self, candidate: &CandidateFile);
}

thread_local! {
    static IN_SHIM: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as inside the shim.
///
/// The handler closes descriptors of its own (the mapped file, the pipes
/// `Command` uses while spawning) and those must go straight to the original.
#[derive(Debug)]
pub struct ReentryGuard(());

impl ReentryGuard {
    /// `None` if this thread is already inside the shim, or its
    /// thread-locals are being torn down.
    pub fn enter() -> Option<Self> {
        IN_SHIM
            .try_with(|flag| {
                if flag.get() {
                    None
                } else {
                    flag.set(true);
                    Some(ReentryGuard(()))
                }
            })
            .ok()
            .flatten()
    }
}

impl Drop for ReentryGuard {
    fn drop(&mut self) {
        let _ = IN_SHIM.try_with(|flag| flag.set(false));
    }
}

/// The `close` replacement: original first, handler second.
#[derive(Debug)]
pub struct CloseShim<I, H> {
    original: OriginalClose,
    inspector: I,
    handler: H,
}

impl<I: DescriptorInspector, H: CloseHandler> CloseShim<I, H> {
    pub fn new(original: OriginalClose, inspector: I, handler: H) -> Self {
        Self {
            original,
            inspector,
            handler,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Close `fd` exactly like the original would, then inspect the file.
    pub fn close(&self, fd: RawFd) -> c_int {
        let Some(_reentry) = ReentryGuard::enter() else {
            return self.original.call(fd);
        };

        // Both lookups need the descriptor open.
        let path = errno::preserved(|| self.inspector.path_of(fd));
        let stat = errno::preserved(|| self.inspector.stat(fd));

        let ret = self.original.call(fd);
        let _errno = ErrnoGuard::capture();

        if let (Some(path), Some(stat)) = (path, stat) {
            let candidate = CandidateFile {
                path,
                descriptor: fd,
                size: stat.size,
                mode: stat.mode,
                is_regular_file: stat.is_regular_file,
            };
            if catch_unwind(AssertUnwindSafe(|| self.handler.on_close(&candidate))).is_err() {
                error!(path = %candidate.path.display(), "close handler panicked");
            }
        }

        ret
    }
}

/// The shim installed into the host process.
pub type ProcessShim = CloseShim<SystemInspector, Autosigner>;

static SHIM: OnceCell<ProcessShim> = OnceCell::new();

/// Install `shim` as the process-wide close replacement.
///
/// Returns `false` if one was already installed; the first one wins.
pub fn install(shim: ProcessShim) -> bool {
    SHIM.set(shim).is_ok()
}

/// The installed shim, created with defaults on first use.
pub fn installed() -> &'static ProcessShim {
    SHIM.get_or_init(|| {
        CloseShim::new(
            OriginalClose::resolve(),
            SystemInspector,
            Autosigner::default(),
        )
    })
}

/// Entry point used by the exported `close`.
pub fn hooked_close(fd: RawFd) -> c_int {
    installed().close(fd)
}
