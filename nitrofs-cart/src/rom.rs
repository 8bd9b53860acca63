//! NitroROM virtual filesystem enumerator.
//!
//! Read-only support for NDS cartridges. No attempt is made to decrypt
//! anything; validation is [`CartHeader::seems_valid`] plus per-entry
//! bounds checks against the cartridge size.
//!
//! A mounted cartridge exposes this structure:
//!
//! ```text
//! header
//! bin/
//!   arm9.bin
//!   arm7.bin
//!   fat.bin
//!   fnt.bin
//!   banner.bin        (if it exists)
//!   arm9_ovt.bin      (if it exists)
//!   arm9_overlays/    (if it exists)
//!     overlay_0
//!     overlay_1, and so on
//!   arm7_ovt.bin      (if it exists)
//!   arm7_overlays/    (if it exists)
//! nitrofs/
//!   the NitroFS directory structure
//! ```
//!
//! Enumeration is purely descriptive: no file payload is read until the
//! host asks for it, and `read` serves requests by seeking into the
//! original byte source.

use std::io::SeekFrom;

use serde::{Deserialize, Serialize};

use nitrofs_core::{NitroError, ReadSeek, Result, bytes};

use crate::fat::{self, FatEntry};
use crate::fnt::{self, SubEntry};
use crate::header::{BANNER_SIZE, CartHeader, HEADER_SIZE};
use crate::overlay::{self, OVERLAY_ENTRY_SIZE};

/// Hard cap on NitroFS directory nesting. Real cartridges stay in the
/// single digits; a parent-pointer cycle would otherwise recurse forever.
const MAX_DIR_DEPTH: usize = 64;

/// One entry in the mounted cartridge's flat namespace.
///
/// Paths are forward-slash separated, case-sensitive, and carry no
/// leading slash. Directory entries have zero offset and length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualEntry {
    pub path: String,
    pub is_dir: bool,
    pub offset: u64,
    pub length: u64,
}

/// Options that control how a cartridge is opened.
#[derive(Debug, Clone, Default)]
pub struct MountOptions {
    /// Verify the header CRC-16 before enumerating. Off by default:
    /// plenty of real dumps and every trimmed homebrew image fail it.
    pub check_crc: bool,
}

impl MountOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check_crc(mut self, check_crc: bool) -> Self {
        self.check_crc = check_crc;
        self
    }
}

/// A mounted NDS cartridge.
///
/// Owns the byte source for its lifetime; [`NitroRom::into_inner`]
/// gives it back.
pub struct NitroRom<R: ReadSeek> {
    source: R,
    header: CartHeader,
    entries: Vec<VirtualEntry>,
}

impl<R: ReadSeek> NitroRom<R> {
    /// Mount a cartridge with default options.
    pub fn open(source: R) -> Result<Self> {
        Self::open_with(source, &MountOptions::default())
    }

    /// Mount a cartridge.
    ///
    /// Reads and validates the header, loads the FAT and FNT, and
    /// enumerates every virtual entry. Enumeration is all-or-nothing:
    /// any malformed table fails the whole mount and leaves the source
    /// merely repositioned.
    pub fn open_with(mut source: R, options: &MountOptions) -> Result<Self> {
        let cart_size = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;

        let mut raw = [0u8; HEADER_SIZE];
        source.read_exact(&mut raw).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                NitroError::BadHeader
            } else {
                NitroError::Io(e)
            }
        })?;

        let header = CartHeader::parse(&raw)?;
        if !header.seems_valid(false) {
            return Err(NitroError::BadHeader);
        }
        if options.check_crc {
            let actual = header.compute_header_crc16();
            if actual != header.header_crc16 {
                return Err(NitroError::BadCrc {
                    expected: header.header_crc16,
                    actual,
                });
            }
        }

        let fat_blob = read_blob(
            &mut source,
            header.file_allocation_table_offset,
            header.file_allocation_table_size,
        )?;
        let fnt = read_blob(
            &mut source,
            header.file_name_table_offset,
            header.file_name_table_size,
        )?;

        let mut walker = Enumerator {
            fat: fat::parse_table(&fat_blob)?,
            fnt,
            cart_size,
            entries: Vec::new(),
        };

        walker.push_file("header".to_string(), 0, header.rom_size_header as u64)?;
        walker.push_file(
            "bin/arm9.bin".to_string(),
            header.arm9_rom_offset as u64,
            header.arm9_size as u64,
        )?;
        walker.push_file(
            "bin/arm7.bin".to_string(),
            header.arm7_rom_offset as u64,
            header.arm7_size as u64,
        )?;
        walker.push_file(
            "bin/fat.bin".to_string(),
            header.file_allocation_table_offset as u64,
            header.file_allocation_table_size as u64,
        )?;
        walker.push_file(
            "bin/fnt.bin".to_string(),
            header.file_name_table_offset as u64,
            header.file_name_table_size as u64,
        )?;
        if header.icon_title_offset != 0 {
            walker.push_file(
                "bin/banner.bin".to_string(),
                header.icon_title_offset as u64,
                BANNER_SIZE as u64,
            )?;
        }

        walker.load_overlay_table(
            &mut source,
            header.arm9_overlay_offset,
            header.arm9_overlay_size,
            "arm9",
        )?;
        walker.load_overlay_table(
            &mut source,
            header.arm7_overlay_offset,
            header.arm7_overlay_size,
            "arm7",
        )?;

        if header.file_name_table_offset != 0 && header.file_name_table_size != 0 {
            walker.recurse_dir(0, "nitrofs", 0)?;
        }

        log::debug!(
            "mounted {}: {} virtual entries",
            header.friendly_code(),
            walker.entries.len()
        );

        Ok(Self {
            source,
            header,
            entries: walker.entries,
        })
    }

    /// The parsed cartridge header.
    pub fn header(&self) -> &CartHeader {
        &self.header
    }

    /// Every entry in the mounted namespace, in enumeration order.
    pub fn entries(&self) -> &[VirtualEntry] {
        &self.entries
    }

    /// Find an entry by path. Returns [`None`] if not found.
    pub fn entry(&self, path: &str) -> Option<&VirtualEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Look up `(is_dir, length)` for a path.
    pub fn stat(&self, path: &str) -> Result<(bool, u64)> {
        self.entry(path)
            .map(|e| (e.is_dir, e.length))
            .ok_or_else(|| NitroError::NotFound(path.to_string()))
    }

    /// Read up to `len` bytes of an entry's payload starting at
    /// `offset` within the entry.
    ///
    /// The request is clamped to the entry: at most
    /// `length - offset` bytes come back, and a start past the end
    /// yields an empty buffer.
    pub fn read(&mut self, path: &str, offset: u64, len: usize) -> Result<Vec<u8>> {
        let (entry_offset, entry_length) = {
            let entry = self
                .entry(path)
                .ok_or_else(|| NitroError::NotFound(path.to_string()))?;
            (entry.offset, entry.length)
        };

        let take = (len as u64).min(entry_length.saturating_sub(offset)) as usize;
        if take == 0 {
            return Ok(Vec::new());
        }

        self.source.seek(SeekFrom::Start(entry_offset + offset))?;
        bytes::read_exact_vec(&mut self.source, take)
    }

    /// Consume the handle, returning the byte source.
    pub fn into_inner(self) -> R {
        self.source
    }
}

/// Seek to `offset` and read `size` bytes into a buffer.
fn read_blob<R: ReadSeek>(source: &mut R, offset: u32, size: u32) -> Result<Vec<u8>> {
    source.seek(SeekFrom::Start(offset as u64))?;
    bytes::read_exact_vec(source, size as usize)
}

/// Accumulates virtual entries while walking the cartridge tables.
struct Enumerator {
    fat: Vec<FatEntry>,
    fnt: Vec<u8>,
    cart_size: u64,
    entries: Vec<VirtualEntry>,
}

impl Enumerator {
    /// Add a file entry, rejecting ranges that escape the cartridge.
    fn push_file(&mut self, path: String, offset: u64, length: u64) -> Result<()> {
        let in_bounds = offset
            .checked_add(length)
            .is_some_and(|end| end <= self.cart_size);
        if !in_bounds {
            return Err(NitroError::OutOfBounds);
        }
        self.entries.push(VirtualEntry {
            path,
            is_dir: false,
            offset,
            length,
        });
        Ok(())
    }

    fn push_dir(&mut self, path: String) {
        self.entries.push(VirtualEntry {
            path,
            is_dir: true,
            offset: 0,
            length: 0,
        });
    }

    /// Resolve a FAT index, validating the stored interval.
    fn fat_entry(&self, id: u32) -> Result<FatEntry> {
        let entry = *self
            .fat
            .get(id as usize)
            .ok_or(NitroError::BadIndex {
                id,
                max: self.fat.len() as u32,
            })?;
        if entry.start > entry.end {
            return Err(NitroError::OutOfBounds);
        }
        Ok(entry)
    }

    /// Parse an overlay table (if present) and add its entries:
    /// the table itself as `bin/<prefix>_ovt.bin` and each overlay's
    /// payload as `bin/<prefix>_overlays/overlay_<id>`.
    fn load_overlay_table<R: ReadSeek>(
        &mut self,
        source: &mut R,
        offset: u32,
        size: u32,
        prefix: &str,
    ) -> Result<()> {
        if offset == 0 || size == 0 {
            return Ok(());
        }

        self.push_file(format!("bin/{prefix}_ovt.bin"), offset as u64, size as u64)?;

        if size as usize % OVERLAY_ENTRY_SIZE != 0 {
            return Err(NitroError::BadOverlay("table size is not a multiple of 32"));
        }

        let table = read_blob(source, offset, size)?;
        for i in 0..size as usize / OVERLAY_ENTRY_SIZE {
            let ovte = overlay::entry_at(&table, i * OVERLAY_ENTRY_SIZE)?;
            let fat_entry = self
                .fat_entry(ovte.file_id)
                .map_err(|_| NitroError::BadOverlay("references a missing FAT entry"))?;
            self.push_file(
                format!("bin/{prefix}_overlays/overlay_{}", ovte.overlay_id),
                fat_entry.start as u64,
                fat_entry.len() as u64,
            )?;
        }
        Ok(())
    }

    /// Walk the sub-table of FNT directory `dir_index`, adding its files
    /// and recursing into its sub-directories.
    fn recurse_dir(&mut self, dir_index: usize, parent: &str, depth: usize) -> Result<()> {
        if depth >= MAX_DIR_DEPTH {
            return Err(NitroError::TooDeep(MAX_DIR_DEPTH));
        }

        let main = fnt::main_entry(&self.fnt, dir_index)?;
        let mut cursor = main.sub_table_offset as usize;
        let mut file_id = main.first_file_id as u32;

        while let Some((entry, next)) = fnt::sub_entry(&self.fnt, cursor)? {
            cursor = next;
            match entry {
                SubEntry::File { name } => {
                    let fat_entry = self.fat_entry(file_id)?;
                    self.push_file(
                        format!("{parent}/{name}"),
                        fat_entry.start as u64,
                        fat_entry.len() as u64,
                    )?;
                    file_id += 1;
                }
                SubEntry::Dir { name, dir_index } => {
                    let path = format!("{parent}/{name}");
                    self.push_dir(path.clone());
                    self.recurse_dir(dir_index, &path, depth + 1)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/rom_tests.rs"]
mod tests;
