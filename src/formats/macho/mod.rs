//! Mach-O signing classifier
//!
//! Decodes just enough of a thin or universal Mach-O image to tell whether it
//! holds an arm64 module that needs a code signature. All header fields are
//! attacker controlled; every read is bounds-checked against the image before
//! it happens, and anything that does not parse is reported as "no signing
//! needed".

pub mod types;
pub mod utils;

pub use types::*;
use utils::{fits, read_u32_be, read_u32_le, read_u64_be};

/// Decide whether `image` contains an arm64 Mach-O module that must be signed.
///
/// `declared_size` is the file size reported by `fstat`. The classifier never
/// looks past `min(declared_size, image.len())`.
pub fn classify(image: &[u8], declared_size: u64) -> bool {
    classify_with_limit(image, declared_size, DEFAULT_MAX_FAT_ARCHES)
}

/// [`classify`] with an explicit cap on the fat slice count.
pub fn classify_with_limit(image: &[u8], declared_size: u64, max_fat_arches: u32) -> bool {
    let data = bounded(image, declared_size);
    let Some(kind) = read_u32_le(data, 0).and_then(ContainerKind::from_magic) else {
        return false;
    };
    match kind {
        ContainerKind::Thin => parse_thin_header(data, 0).is_some_and(|s| s.requires_signing()),
        ContainerKind::Fat | ContainerKind::Fat64 => classify_fat(data, kind, max_fat_arches),
    }
}

fn bounded(image: &[u8], declared_size: u64) -> &[u8] {
    let len = usize::try_from(declared_size)
        .unwrap_or(usize::MAX)
        .min(image.len());
    &image[..len]
}

fn classify_fat(data: &[u8], kind: ContainerKind, max_fat_arches: u32) -> bool {
    let Some(arches) = FatArches::parse(data, kind, max_fat_arches) else {
        return false;
    };
    for arch in arches {
        if arch.cpu_type != CPU_TYPE_ARM64 {
            continue;
        }
        // A matching slice that points outside the file means the file is
        // truncated; stop rather than look at the remaining slices.
        let Some(offset) = usize::try_from(arch.offset)
            .ok()
            .filter(|&off| fits(data, off, MACH_HEADER_64_SIZE))
        else {
            return false;
        };
        if parse_thin_header(data, offset).is_some_and(|s| s.requires_signing()) {
            return true;
        }
    }
    false
}

/// Decode the Mach-O header starting at `offset`.
///
/// Returns `None` unless a complete 64-bit or 32-bit little-endian header
/// fits in `data`.
pub fn parse_thin_header(data: &[u8], offset: usize) -> Option<ArchSlice> {
    if !fits(data, offset, MACH_HEADER_64_SIZE) {
        return None;
    }
    let is_64 = match read_u32_le(data, offset)? {
        MH_MAGIC_64 => true,
        MH_MAGIC => false,
        _ => return None,
    };
    // magic, cputype, cpusubtype, filetype
    let cpu_type = read_u32_le(data, offset + 4)?;
    let file_kind = FileKind::from_u32(read_u32_le(data, offset + 12)?);
    Some(ArchSlice {
        cpu_type,
        file_kind,
        byte_offset: offset as u64,
        is_64,
    })
}

/// Iterator over the slice descriptors of a universal binary.
///
/// Construction validates that the whole descriptor table lies inside the
/// image, so iteration itself cannot run off the end.
#[derive(Debug, Clone)]
pub struct FatArches<'data> {
    data: &'data [u8],
    entry_size: usize,
    wide_offsets: bool,
    index: u32,
    count: u32,
}

impl<'data> FatArches<'data> {
    /// Validate the fat header of `data` and return its descriptors.
    pub fn parse(data: &'data [u8], kind: ContainerKind, max_fat_arches: u32) -> Option<Self> {
        let entry_size = kind.arch_entry_size()?;
        let count = read_u32_be(data, 4)?;
        if count > max_fat_arches {
            return None;
        }
        let table_len = (count as usize)
            .checked_mul(entry_size)?
            .checked_add(FAT_HEADER_SIZE)?;
        if table_len > data.len() {
            return None;
        }
        Some(Self {
            data,
            entry_size,
            wide_offsets: kind == ContainerKind::Fat64,
            index: 0,
            count,
        })
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Iterator for FatArches<'_> {
    type Item = FatArch;

    fn next(&mut self) -> Option<FatArch> {
        if self.index >= self.count {
            return None;
        }
        let base = FAT_HEADER_SIZE + self.index as usize * self.entry_size;
        self.index += 1;
        // cputype, cpusubtype, offset
        let cpu_type = read_u32_be(self.data, base)?;
        let offset = if self.wide_offsets {
            read_u64_be(self.data, base + 8)?
        } else {
            u64::from(read_u32_be(self.data, base + 8)?)
        };
        Some(FatArch { cpu_type, offset })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count.saturating_sub(self.index) as usize;
        (0, Some(left))
    }
}
