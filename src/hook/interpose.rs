//! Symbol-level hook installation for the injectable dylib.
//!
//! Linux: `LD_PRELOAD` makes our exported `close` win symbol resolution.
//! Apple: a `__DATA,__interpose` tuple asks dyld to route every other image's
//! `close` through us.

use libc::c_int;
use std::panic::{catch_unwind, AssertUnwindSafe};

#[ctor::ctor]
fn autosign_init() {
    crate::logging::init_tracing();
    // Resolve the original close before the first intercepted call.
    super::installed();
    tracing::debug!("Autosign loaded");
}

/// Replacement `close`. Never unwinds into C.
unsafe extern "C" fn close_hook(fd: c_int) -> c_int {
    match catch_unwind(AssertUnwindSafe(|| super::hooked_close(fd))) {
        Ok(ret) => ret,
        // Handler panics are caught inside the shim, so this is only reached
        // if a lookup panicked before the original close ran.
        Err(_) => super::OriginalClose::resolve().call(fd),
    }
}

#[cfg(not(target_vendor = "apple"))]
#[no_mangle]
pub unsafe extern "C" fn close(fd: c_int) -> c_int {
    close_hook(fd)
}

#[cfg(target_vendor = "apple")]
#[repr(C)]
struct Interpose {
    replacement: *const (),
    original: *const (),
}

// Safety: two immutable code addresses.
#[cfg(target_vendor = "apple")]
unsafe impl Sync for Interpose {}

#[cfg(target_vendor = "apple")]
#[used]
#[link_section = "__DATA,__interpose"]
static CLOSE_INTERPOSE: Interpose = Interpose {
    replacement: close_hook as *const (),
    original: libc::close as *const (),
};
