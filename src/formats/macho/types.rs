//! Core Mach-O types and constants

use std::fmt;

/// 64-bit Mach-O magic as read in host (little-endian) order
pub const MH_MAGIC_64: u32 = 0xfeed_facf;
/// 32-bit Mach-O magic as read in host (little-endian) order
pub const MH_MAGIC: u32 = 0xfeed_face;
/// Big-endian `FAT_MAGIC` (0xcafebabe) read in host order
pub const FAT_CIGAM: u32 = 0xbeba_feca;
/// Big-endian `FAT_MAGIC_64` (0xcafebabf) read in host order
pub const FAT_CIGAM_64: u32 = 0xbfba_feca;

/// `CPU_TYPE_ARM | CPU_ARCH_ABI64`
pub const CPU_TYPE_ARM64: u32 = 0x0100_000c;

pub const MH_OBJECT: u32 = 0x1;
pub const MH_EXECUTE: u32 = 0x2;
pub const MH_CORE: u32 = 0x4;
pub const MH_DYLIB: u32 = 0x6;
pub const MH_DYLINKER: u32 = 0x7;
pub const MH_BUNDLE: u32 = 0x8;

/// `sizeof(struct mach_header_64)`
pub const MACH_HEADER_64_SIZE: usize = 32;
/// `sizeof(struct fat_header)`
pub const FAT_HEADER_SIZE: usize = 8;
/// `sizeof(struct fat_arch)`
pub const FAT_ARCH_SIZE: usize = 20;
/// `sizeof(struct fat_arch_64)`
pub const FAT_ARCH_64_SIZE: usize = 32;

/// Upper bound on `nfat_arch`. Java class files start with `0xcafebabe`
/// followed by their version numbers, which read as a large slice count.
pub const DEFAULT_MAX_FAT_ARCHES: u32 = 30;

/// Layout announced by the leading magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// A single 64-bit little-endian Mach-O image
    Thin,
    /// Universal binary with 32-bit slice offsets
    Fat,
    /// Universal binary with 64-bit slice offsets
    Fat64,
}

impl ContainerKind {
    pub fn from_magic(magic: u32) -> Option<Self> {
        match magic {
            MH_MAGIC_64 => Some(ContainerKind::Thin),
            FAT_CIGAM => Some(ContainerKind::Fat),
            FAT_CIGAM_64 => Some(ContainerKind::Fat64),
            _ => None,
        }
    }

    /// Size of one slice descriptor, `None` for thin images.
    pub fn arch_entry_size(self) -> Option<usize> {
        match self {
            ContainerKind::Thin => None,
            ContainerKind::Fat => Some(FAT_ARCH_SIZE),
            ContainerKind::Fat64 => Some(FAT_ARCH_64_SIZE),
        }
    }
}

/// Mach-O `filetype`, reduced to what matters for signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Execute,
    Bundle,
    Dylib,
    Dylinker,
    Other(u32),
}

impl FileKind {
    pub fn from_u32(val: u32) -> Self {
        match val {
            MH_EXECUTE => FileKind::Execute,
            MH_BUNDLE => FileKind::Bundle,
            MH_DYLIB => FileKind::Dylib,
            MH_DYLINKER => FileKind::Dylinker,
            other => FileKind::Other(other),
        }
    }

    /// Whether the kernel will refuse to map this kind without a signature.
    pub fn is_loadable(self) -> bool {
        !matches!(self, FileKind::Other(_))
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Execute => write!(f, "MH_EXECUTE"),
            FileKind::Bundle => write!(f, "MH_BUNDLE"),
            FileKind::Dylib => write!(f, "MH_DYLIB"),
            FileKind::Dylinker => write!(f, "MH_DYLINKER"),
            FileKind::Other(v) => write!(f, "filetype {:#x}", v),
        }
    }
}

/// One fat descriptor entry: where a slice lives and what CPU it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatArch {
    pub cpu_type: u32,
    pub offset: u64,
}

/// A decoded Mach-O header at some offset inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchSlice {
    pub cpu_type: u32,
    pub file_kind: FileKind,
    pub byte_offset: u64,
    pub is_64: bool,
}

impl ArchSlice {
    /// 64-bit arm64 modules of a loadable kind must carry a signature.
    pub fn requires_signing(&self) -> bool {
        self.is_64 && self.cpu_type == CPU_TYPE_ARM64 && self.file_kind.is_loadable()
    }
}
