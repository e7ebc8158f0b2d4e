//! Bounds-checked integer reads over untrusted bytes.
//!
//! Every reader returns `None` instead of reading past the end of `data`,
//! including when `offset + width` overflows.

fn window<const N: usize>(data: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    let bytes = data.get(offset..end)?;
    <[u8; N]>::try_from(bytes).ok()
}

pub fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    window::<4>(data, offset).map(u32::from_le_bytes)
}

pub fn read_u32_be(data: &[u8], offset: usize) -> Option<u32> {
    window::<4>(data, offset).map(u32::from_be_bytes)
}

pub fn read_u64_be(data: &[u8], offset: usize) -> Option<u64> {
    window::<8>(data, offset).map(u64::from_be_bytes)
}

/// `offset + len <= data.len()` without overflow.
pub fn fits(data: &[u8], offset: usize, len: usize) -> bool {
    offset.checked_add(len).is_some_and(|end| end <= data.len())
}
