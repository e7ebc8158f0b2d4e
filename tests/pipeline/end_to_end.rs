use std::io::Write;
use std::os::unix::io::IntoRawFd;
use std::path::Path;

use autosign::formats::macho::{CPU_TYPE_ARM64, MH_EXECUTE, MH_OBJECT};
use autosign::hook::{errno, CloseShim, OriginalClose, SystemInspector};
use autosign::{should_inspect, AutosignConfig, Autosigner, CandidateFile};

use crate::common::{thin_image, write_file, CountingSigner};

fn shim() -> CloseShim<SystemInspector, Autosigner<CountingSigner>> {
    CloseShim::new(
        OriginalClose::resolve(),
        SystemInspector,
        Autosigner::new(AutosignConfig::default(), CountingSigner::default()),
    )
}

/// Create `dir/name`, write `content`, and hand back the still-open descriptor.
fn open_written(dir: &Path, name: &str, content: &[u8]) -> i32 {
    let mut f = std::fs::File::create(dir.join(name)).unwrap();
    f.write_all(content).unwrap();
    f.into_raw_fd()
}

#[test]
fn staged_binary_is_signed_on_close() {
    let dir = tempfile::tempdir().unwrap();
    let shim = shim();
    let fd = open_written(
        dir.path(),
        "ls.dpkg-new",
        &thin_image(CPU_TYPE_ARM64, MH_EXECUTE, 0x800),
    );

    errno::set(libc::EINTR);
    assert_eq!(shim.close(fd), 0);
    // a successful close leaves errno as the real close left it
    assert_eq!(errno::get(), libc::EINTR);

    let signer = shim.handler().signer();
    let signed = signer.signed.lock().unwrap();
    assert_eq!(signed.len(), 1);
    assert_eq!(
        signed[0],
        dir.path().join("ls.dpkg-new").canonicalize().unwrap()
    );
}

#[test]
fn object_files_are_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let shim = shim();
    let fd = open_written(
        dir.path(),
        "crt1.o.dpkg-new",
        &thin_image(CPU_TYPE_ARM64, MH_OBJECT, 0x800),
    );
    assert_eq!(shim.close(fd), 0);
    assert_eq!(shim.handler().signer().calls(), 0);
}

#[test]
fn five_byte_file_is_never_signed() {
    let dir = tempfile::tempdir().unwrap();
    let shim = shim();
    let fd = open_written(dir.path(), "tiny.dpkg-new", b"\xcf\xfa\xed\xfe\x0c");
    assert_eq!(shim.close(fd), 0);
    assert_eq!(shim.handler().signer().calls(), 0);

    // Going straight to the orchestrator: classified as not a container.
    let path = dir.path().join("tiny.dpkg-new");
    let signer = Autosigner::new(AutosignConfig::default(), CountingSigner::default());
    assert!(!signer.requires_signing(&path, 5).unwrap());
    assert_eq!(signer.autosign(&path, 0o644, 5), 0);
    assert_eq!(signer.signer().calls(), 0);
}

#[test]
fn non_staging_path_is_never_classified() {
    let dir = tempfile::tempdir().unwrap();
    let shim = shim();
    let content = thin_image(CPU_TYPE_ARM64, MH_EXECUTE, 0x800);
    let fd = open_written(dir.path(), "ls", &content);
    assert_eq!(shim.close(fd), 0);
    assert_eq!(shim.handler().signer().calls(), 0);

    let candidate = CandidateFile {
        path: dir.path().join("ls"),
        descriptor: fd,
        size: content.len() as u64,
        mode: libc::S_IFREG as u32 | 0o755,
        is_regular_file: true,
    };
    assert!(!should_inspect(&candidate, &AutosignConfig::default().filter));
}

#[test]
fn repeated_runs_classify_the_same() {
    let dir = tempfile::tempdir().unwrap();
    let content = thin_image(CPU_TYPE_ARM64, MH_EXECUTE, 0x800);
    let path = write_file(dir.path(), "ls.dpkg-new", &content, 0o755);
    let signer = Autosigner::new(AutosignConfig::default(), CountingSigner::default());

    let first = signer.requires_signing(&path, content.len() as u64).unwrap();
    assert_eq!(signer.autosign(&path, 0o755, content.len() as u64), 0);
    let second = signer.requires_signing(&path, content.len() as u64).unwrap();
    assert_eq!(signer.autosign(&path, 0o755, content.len() as u64), 0);

    assert!(first);
    assert_eq!(first, second);
    assert_eq!(signer.signer().calls(), 2);
}

#[test]
fn pipe_close_passes_through() {
    let shim = shim();
    let mut fds = [0 as libc::c_int; 2];
    assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
    assert_eq!(shim.close(fds[0]), 0);
    assert_eq!(shim.close(fds[1]), 0);
    assert_eq!(shim.handler().signer().calls(), 0);
}
