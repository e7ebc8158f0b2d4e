//! Saving and restoring `errno` around calls the host did not ask for.

use libc::c_int;

#[cfg(any(target_os = "linux", target_os = "android"))]
unsafe fn errno_location() -> *mut c_int {
    #[cfg(target_os = "android")]
    {
        libc::__errno()
    }
    #[cfg(target_os = "linux")]
    {
        libc::__errno_location()
    }
}

#[cfg(any(target_vendor = "apple", target_os = "freebsd"))]
unsafe fn errno_location() -> *mut c_int {
    libc::__error()
}

/// Current thread's `errno`.
pub fn get() -> c_int {
    // Safety: the location is thread-local and always valid.
    unsafe { *errno_location() }
}

/// Overwrite the current thread's `errno`.
pub fn set(value: c_int) {
    // Safety: as above.
    unsafe { *errno_location() = value }
}

/// Puts `errno` back to the value it had at capture when dropped.
#[derive(Debug)]
pub struct ErrnoGuard {
    saved: c_int,
}

impl ErrnoGuard {
    pub fn capture() -> Self {
        Self { saved: get() }
    }

    pub fn saved(&self) -> c_int {
        self.saved
    }
}

impl Drop for ErrnoGuard {
    fn drop(&mut self) {
        set(self.saved);
    }
}

/// Run `f` without letting it change `errno`.
pub fn preserved<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ErrnoGuard::capture();
    f()
}
