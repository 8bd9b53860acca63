//! File allocation table decoding.
//!
//! The FAT is a flat array of 8-byte entries, one per file in the
//! cartridge: two little-endian u32 offsets forming the half-open
//! interval `[start, end)` into the cartridge image.

use nitrofs_core::{Result, bytes};

/// Size of one FAT entry on disk.
pub const FAT_ENTRY_SIZE: usize = 8;

/// One file allocation table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatEntry {
    pub start: u32,
    pub end: u32,
}

impl FatEntry {
    /// Length of the file this entry describes.
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Decode every whole entry in a FAT blob.
///
/// Trailing bytes that do not form a full entry are ignored, matching
/// how the console indexes the table.
pub fn parse_table(buf: &[u8]) -> Result<Vec<FatEntry>> {
    let count = buf.len() / FAT_ENTRY_SIZE;
    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let offset = i * FAT_ENTRY_SIZE;
        entries.push(FatEntry {
            start: bytes::le_u32_at(buf, offset)?,
            end: bytes::le_u32_at(buf, offset + 4)?,
        });
    }
    Ok(entries)
}
