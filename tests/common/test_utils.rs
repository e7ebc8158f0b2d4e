//! Shared builders for Mach-O images and staged files.

use autosign::error::Result;
use autosign::formats::macho::{FAT_ARCH_64_SIZE, FAT_ARCH_SIZE, FAT_HEADER_SIZE, MH_MAGIC_64};
use autosign::{Signer, SignerOutcome};
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const CPU_TYPE_X86_64: u32 = 0x0100_0007;

/// A 64-bit little-endian Mach-O header padded to `len` bytes.
pub fn thin_image(cpu: u32, filetype: u32, len: usize) -> Vec<u8> {
    let mut v = vec![0u8; len.max(32)];
    v[0..4].copy_from_slice(&MH_MAGIC_64.to_le_bytes());
    v[4..8].copy_from_slice(&cpu.to_le_bytes());
    v[12..16].copy_from_slice(&filetype.to_le_bytes());
    v
}

/// A universal binary with each slice placed on its own 0x1000 boundary.
pub fn fat_image(slices: &[(u32, Vec<u8>)], wide: bool) -> Vec<u8> {
    let magic: u32 = if wide { 0xcafe_babf } else { 0xcafe_babe };
    let entry = if wide { FAT_ARCH_64_SIZE } else { FAT_ARCH_SIZE };
    assert!(FAT_HEADER_SIZE + entry * slices.len() <= 0x1000);

    let mut out = Vec::new();
    out.extend_from_slice(&magic.to_be_bytes());
    out.extend_from_slice(&(slices.len() as u32).to_be_bytes());
    for (i, (cpu, body)) in slices.iter().enumerate() {
        let offset = 0x1000 * (i + 1);
        out.extend_from_slice(&cpu.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        if wide {
            out.extend_from_slice(&(offset as u64).to_be_bytes());
            out.extend_from_slice(&(body.len() as u64).to_be_bytes());
            out.extend_from_slice(&12u32.to_be_bytes());
            out.extend_from_slice(&0u32.to_be_bytes());
        } else {
            out.extend_from_slice(&(offset as u32).to_be_bytes());
            out.extend_from_slice(&(body.len() as u32).to_be_bytes());
            out.extend_from_slice(&12u32.to_be_bytes());
        }
    }
    for (i, (_, body)) in slices.iter().enumerate() {
        out.resize(0x1000 * (i + 1), 0);
        out.extend_from_slice(body);
    }
    out
}

/// Write `content` to `dir/name` with permission bits `mode`.
pub fn write_file(dir: &Path, name: &str, content: &[u8], mode: u32) -> PathBuf {
    let path = dir.join(name);
    let mut f = fs::File::create(&path).unwrap();
    f.write_all(content).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    path
}

pub fn mode_of(path: &Path) -> u32 {
    fs::metadata(path).unwrap().permissions().mode() & 0o7777
}

/// Records every path it is asked to sign and always succeeds.
#[derive(Default)]
pub struct CountingSigner {
    pub signed: Mutex<Vec<PathBuf>>,
}

impl CountingSigner {
    pub fn calls(&self) -> usize {
        self.signed.lock().unwrap().len()
    }
}

impl Signer for CountingSigner {
    fn sign(&self, path: &Path) -> Result<SignerOutcome> {
        self.signed.lock().unwrap().push(path.to_path_buf());
        Ok(SignerOutcome::Exited(0))
    }
}
