//! Overlay table decoding.
//!
//! Overlays are code blobs the game loads into arm9/arm7 memory at
//! runtime. The overlay table is an array of 32-byte entries, eight
//! little-endian u32 words each. Enumeration only needs `overlay_id`
//! (for naming) and `file_id` (to find the payload in the FAT); the
//! rest is kept for completeness.

use nitrofs_core::{Result, bytes};

/// Size of one overlay table entry on disk.
pub const OVERLAY_ENTRY_SIZE: usize = 32;

/// One overlay table entry.
#[derive(Debug, Clone, Copy)]
pub struct OverlayEntry {
    pub overlay_id: u32,
    pub ram_address: u32,
    pub ram_size: u32,
    pub bss_size: u32,
    pub static_init_start: u32,
    pub static_init_end: u32,
    /// FAT index of the overlay's payload.
    pub file_id: u32,
    pub reserved: u32,
}

/// Decode the overlay entry at `offset` in a loaded overlay-table blob.
pub fn entry_at(buf: &[u8], offset: usize) -> Result<OverlayEntry> {
    Ok(OverlayEntry {
        overlay_id: bytes::le_u32_at(buf, offset)?,
        ram_address: bytes::le_u32_at(buf, offset + 4)?,
        ram_size: bytes::le_u32_at(buf, offset + 8)?,
        bss_size: bytes::le_u32_at(buf, offset + 12)?,
        static_init_start: bytes::le_u32_at(buf, offset + 16)?,
        static_init_end: bytes::le_u32_at(buf, offset + 20)?,
        file_id: bytes::le_u32_at(buf, offset + 24)?,
        reserved: bytes::le_u32_at(buf, offset + 28)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_all_eight_words() {
        let mut buf = Vec::new();
        for word in [7u32, 0x02000000, 0x1000, 0x40, 0, 0, 3, 0] {
            buf.extend_from_slice(&word.to_le_bytes());
        }
        let e = entry_at(&buf, 0).unwrap();
        assert_eq!(e.overlay_id, 7);
        assert_eq!(e.ram_address, 0x02000000);
        assert_eq!(e.file_id, 3);
    }

    #[test]
    fn short_buffer_fails() {
        assert!(entry_at(&[0u8; 31], 0).is_err());
    }
}
