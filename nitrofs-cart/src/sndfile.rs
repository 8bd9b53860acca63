//! SNDFILE archive extraction.
//!
//! A decompressed `.arc` blob is a flat big-endian archive: a 32-byte
//! header (magic `"SNDFILE\0"`, file count, total size, 16 reserved
//! bytes) followed by 64-byte file entries and then payload data.
//!
//! ## File entry (64 bytes)
//! ```text
//! [0x00] name        (32 bytes, fixed width, not guaranteed NUL-terminated)
//! [0x20] offset      (u32 BE, from archive start)
//! [0x24] size_padded (u32 BE, size_target rounded up so size_padded % 32 == 0)
//! [0x28] size_target (u32 BE, logical size)
//! [0x2C] reserved    (20 bytes)
//! ```

use nitrofs_core::util::read_ascii_fixed;
use nitrofs_core::{NitroError, Result, bytes};

const MAGIC: &[u8; 8] = b"SNDFILE\0";

/// Archive header size.
const HEADER_SIZE: usize = 32;

/// File entry size.
const ENTRY_SIZE: usize = 64;

/// One file extracted from an archive.
#[derive(Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Raw fixed-width name field. Kept verbatim; whether to trim
    /// padding is the consumer's call.
    pub name: [u8; 32],
    /// Payload, `size_target` bytes long.
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    /// Name as trimmed printable ASCII.
    pub fn name_str(&self) -> String {
        read_ascii_fixed(&self.name)
    }
}

impl std::fmt::Debug for ArchiveEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("name", &self.name_str())
            .field("len", &self.data.len())
            .finish()
    }
}

/// Extract all files from a decompressed `.arc` blob, in archive order.
pub fn extract_entries(input: &[u8]) -> Result<Vec<ArchiveEntry>> {
    if input.len() < HEADER_SIZE {
        return Err(NitroError::Truncated {
            offset: 0,
            needed: HEADER_SIZE,
        });
    }

    if &bytes::array_at::<8>(input, 0)? != MAGIC {
        return Err(NitroError::BadMagic);
    }

    let file_count = bytes::be_u32_at(input, 8)? as usize;
    let archive_size = bytes::be_u32_at(input, 12)? as u64;

    if archive_size != input.len() as u64 {
        return Err(NitroError::SizeMismatch {
            declared: archive_size,
            actual: input.len() as u64,
        });
    }

    let table_end = file_count
        .checked_mul(ENTRY_SIZE)
        .and_then(|n| n.checked_add(HEADER_SIZE));
    if !table_end.is_some_and(|end| input.len() > end) {
        return Err(NitroError::Truncated {
            offset: HEADER_SIZE,
            needed: file_count.saturating_mul(ENTRY_SIZE),
        });
    }

    log::trace!("sndfile: {file_count} entries, {archive_size} bytes");

    let mut out = Vec::with_capacity(file_count);
    for i in 0..file_count {
        let entry_offset = HEADER_SIZE + i * ENTRY_SIZE;
        let name: [u8; 32] = bytes::array_at(input, entry_offset)?;
        let offset = bytes::be_u32_at(input, entry_offset + 0x20)? as usize;
        let _size_padded = bytes::be_u32_at(input, entry_offset + 0x24)?;
        let size_target = bytes::be_u32_at(input, entry_offset + 0x28)? as usize;

        let in_bounds = offset <= input.len()
            && offset
                .checked_add(size_target)
                .is_some_and(|end| end <= input.len());
        if !in_bounds {
            return Err(NitroError::OutOfBounds);
        }

        out.push(ArchiveEntry {
            name,
            data: input[offset..offset + size_target].to_vec(),
        });
    }

    Ok(out)
}

#[cfg(test)]
#[path = "tests/sndfile_tests.rs"]
mod tests;
