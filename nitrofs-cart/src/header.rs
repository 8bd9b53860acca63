//! NDS cartridge header parser.
//!
//! The cartridge header occupies bytes 0x000–0x1FF (512 bytes). All
//! multi-byte fields are little-endian on disk and stored host-endian
//! after parsing. The header CRC-16 at 0x15E covers bytes 0x000–0x15D.
//!
//! Field offsets follow the GBATEK GBA/NDS Technical Info document
//! version 3.05: <https://problemkaputt.de/gbatek.htm>

use nitrofs_core::util::read_ascii;
use nitrofs_core::{Region, Result, bytes};

/// Full header size: 512 bytes (0x200).
pub const HEADER_SIZE: usize = 0x200;

/// Offset of the header CRC-16 field; the checksum covers everything
/// before it.
pub const HEADER_CRC_OFFSET: usize = 0x15E;

/// Size of the icon/title banner block pointed to by `icon_title_offset`.
pub const BANNER_SIZE: u32 = 0x840;

// ---------------------------------------------------------------------------
// CRC-16 (polynomial 0x8005, reflected, init 0xFFFF)
// ---------------------------------------------------------------------------

/// Compute the CRC-16 used by the NDS header (polynomial 0x8005,
/// reflected, init 0xFFFF).
pub(crate) fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xA001; // 0xA001 is reflected 0x8005
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

// ---------------------------------------------------------------------------
// Known-ROM table
// ---------------------------------------------------------------------------

/// Category a recognized `(game_code, rom_version)` pair falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomKind {
    /// Retail release cartridge
    Release,
    /// First Hunt demo cartridge
    FirstHunt,
    /// Kiosk demo cartridge
    Kiosk,
}

const ROMS_RELEASE: &[(&[u8; 4], u8)] = &[
    (b"AMHE", 0),
    (b"AMHE", 1),
    (b"AMHP", 0),
    (b"AMHP", 1),
    (b"AMHJ", 0),
    (b"AMHJ", 1),
    (b"AMHK", 0),
];

const ROMS_FIRST_HUNT: &[(&[u8; 4], u8)] = &[(b"AMFE", 0), (b"AMFP", 0)];

const ROMS_KIOSK: &[(&[u8; 4], u8)] = &[(b"A76E", 0)];

// ---------------------------------------------------------------------------
// Header struct
// ---------------------------------------------------------------------------

/// Parsed NDS cartridge header (0x000–0x1FF).
///
/// Every documented field is kept, not just the ones the readers in this
/// crate need. The raw 512-byte image is retained so the stored CRC can
/// be recomputed over the original little-endian bytes.
#[derive(Clone)]
pub struct CartHeader {
    pub game_title: [u8; 12],
    pub game_code: [u8; 4],
    pub maker_code: [u8; 2],
    pub unit_code: u8,
    pub encryption_seed_select: u8,
    pub device_capacity: u8,
    pub nds_region: u8,
    pub rom_version: u8,
    pub autostart: u8,

    pub arm9_rom_offset: u32,
    pub arm9_address_entry: u32,
    pub arm9_address_ram: u32,
    pub arm9_size: u32,

    pub arm7_rom_offset: u32,
    pub arm7_address_entry: u32,
    pub arm7_address_ram: u32,
    pub arm7_size: u32,

    pub file_name_table_offset: u32,
    pub file_name_table_size: u32,
    pub file_allocation_table_offset: u32,
    pub file_allocation_table_size: u32,

    pub arm9_overlay_offset: u32,
    pub arm9_overlay_size: u32,
    pub arm7_overlay_offset: u32,
    pub arm7_overlay_size: u32,

    pub port_40001a4_normal: u32,
    pub port_40001a4_key1: u32,

    pub icon_title_offset: u32,

    pub secure_area_crc16: u16,
    pub secure_area_delay: u16,

    pub arm9_autoload_hook_ram: u32,
    pub arm7_autoload_hook_ram: u32,

    pub secure_area_disable: u64,

    pub rom_size_total_used: u32,
    pub rom_size_header: u32,

    pub nand_end_of_rom_area: u16,
    pub nand_start_of_rw_area: u16,

    pub logo: [u8; 156],
    pub logo_crc16: u16,
    pub header_crc16: u16,

    pub debug_rom_offset: u32,
    pub debug_size: u32,
    pub debug_ram_address: u32,

    raw: [u8; HEADER_SIZE],
}

impl std::fmt::Debug for CartHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartHeader")
            .field("title", &self.title())
            .field("game_code", &self.game_code_str())
            .field("maker_code", &self.maker_code_str())
            .field("rom_version", &self.rom_version)
            .field("unit_code", &self.unit_code)
            .finish_non_exhaustive()
    }
}

impl CartHeader {
    /// Parse a header from its raw 512-byte image.
    ///
    /// This only decodes fields; use [`CartHeader::seems_valid`] to
    /// decide whether the result describes a plausible cartridge.
    pub fn parse(raw: &[u8; HEADER_SIZE]) -> Result<Self> {
        let buf: &[u8] = raw;
        Ok(Self {
            game_title: bytes::array_at(buf, 0x000)?,
            game_code: bytes::array_at(buf, 0x00C)?,
            maker_code: bytes::array_at(buf, 0x010)?,
            unit_code: bytes::u8_at(buf, 0x012)?,
            encryption_seed_select: bytes::u8_at(buf, 0x013)?,
            device_capacity: bytes::u8_at(buf, 0x014)?,
            nds_region: bytes::u8_at(buf, 0x01D)?,
            rom_version: bytes::u8_at(buf, 0x01E)?,
            autostart: bytes::u8_at(buf, 0x01F)?,

            arm9_rom_offset: bytes::le_u32_at(buf, 0x020)?,
            arm9_address_entry: bytes::le_u32_at(buf, 0x024)?,
            arm9_address_ram: bytes::le_u32_at(buf, 0x028)?,
            arm9_size: bytes::le_u32_at(buf, 0x02C)?,

            arm7_rom_offset: bytes::le_u32_at(buf, 0x030)?,
            arm7_address_entry: bytes::le_u32_at(buf, 0x034)?,
            arm7_address_ram: bytes::le_u32_at(buf, 0x038)?,
            arm7_size: bytes::le_u32_at(buf, 0x03C)?,

            file_name_table_offset: bytes::le_u32_at(buf, 0x040)?,
            file_name_table_size: bytes::le_u32_at(buf, 0x044)?,
            file_allocation_table_offset: bytes::le_u32_at(buf, 0x048)?,
            file_allocation_table_size: bytes::le_u32_at(buf, 0x04C)?,

            arm9_overlay_offset: bytes::le_u32_at(buf, 0x050)?,
            arm9_overlay_size: bytes::le_u32_at(buf, 0x054)?,
            arm7_overlay_offset: bytes::le_u32_at(buf, 0x058)?,
            arm7_overlay_size: bytes::le_u32_at(buf, 0x05C)?,

            port_40001a4_normal: bytes::le_u32_at(buf, 0x060)?,
            port_40001a4_key1: bytes::le_u32_at(buf, 0x064)?,

            icon_title_offset: bytes::le_u32_at(buf, 0x068)?,

            secure_area_crc16: bytes::le_u16_at(buf, 0x06C)?,
            secure_area_delay: bytes::le_u16_at(buf, 0x06E)?,

            arm9_autoload_hook_ram: bytes::le_u32_at(buf, 0x070)?,
            arm7_autoload_hook_ram: bytes::le_u32_at(buf, 0x074)?,

            secure_area_disable: bytes::le_u64_at(buf, 0x078)?,

            rom_size_total_used: bytes::le_u32_at(buf, 0x080)?,
            rom_size_header: bytes::le_u32_at(buf, 0x084)?,

            nand_end_of_rom_area: bytes::le_u16_at(buf, 0x094)?,
            nand_start_of_rw_area: bytes::le_u16_at(buf, 0x096)?,

            logo: bytes::array_at(buf, 0x0C0)?,
            logo_crc16: bytes::le_u16_at(buf, 0x15C)?,
            header_crc16: bytes::le_u16_at(buf, 0x15E)?,

            debug_rom_offset: bytes::le_u32_at(buf, 0x160)?,
            debug_size: bytes::le_u32_at(buf, 0x164)?,
            debug_ram_address: bytes::le_u32_at(buf, 0x168)?,

            raw: *raw,
        })
    }

    // -- String accessors --

    /// Game title, null-trimmed printable ASCII.
    pub fn title(&self) -> String {
        read_ascii(&self.game_title)
    }

    /// Four-character game code, e.g. "AMHE".
    pub fn game_code_str(&self) -> String {
        read_ascii(&self.game_code)
    }

    /// Two-character maker code, e.g. "01".
    pub fn maker_code_str(&self) -> String {
        read_ascii(&self.maker_code)
    }

    /// Region encoded in the fourth game-code byte.
    pub fn region(&self) -> Region {
        Region::from_code_char(self.game_code[3] as char).unwrap_or(Region::Unknown)
    }

    /// Human-readable unit code: which hardware the cartridge targets.
    pub fn unit_name(&self) -> &'static str {
        match self.unit_code {
            0x00 => "NDS",
            0x02 => "NDS+DSi",
            0x03 => "DSi",
            _ => "Unknown",
        }
    }

    /// Cartridge chip capacity in bytes (128 KB << n), or `None` for
    /// capacity codes past the largest produced chip.
    pub fn capacity_bytes(&self) -> Option<u64> {
        (self.device_capacity <= 12).then(|| 131_072u64 << self.device_capacity)
    }

    // -- Classification --

    /// Returns true if this is a recognized release ROM.
    pub fn is_release(&self) -> bool {
        self.in_table(ROMS_RELEASE)
    }

    /// Returns true if this is a recognized First Hunt demo ROM.
    pub fn is_first_hunt(&self) -> bool {
        self.in_table(ROMS_FIRST_HUNT)
    }

    /// Returns true if this is a recognized kiosk demo ROM.
    pub fn is_kiosk(&self) -> bool {
        self.in_table(ROMS_KIOSK)
    }

    /// Returns true if this is any recognized ROM.
    pub fn is_recognized(&self) -> bool {
        self.classify().is_some()
    }

    /// Which category of the known-ROM table this cartridge falls into,
    /// if any.
    pub fn classify(&self) -> Option<RomKind> {
        if self.is_release() {
            Some(RomKind::Release)
        } else if self.is_first_hunt() {
            Some(RomKind::FirstHunt)
        } else if self.is_kiosk() {
            Some(RomKind::Kiosk)
        } else {
            None
        }
    }

    fn in_table(&self, table: &[(&[u8; 4], u8)]) -> bool {
        table
            .iter()
            .any(|&(code, ver)| &self.game_code == code && self.rom_version == ver)
    }

    // -- Naming --

    /// A user-friendly name decoded from the title, game code, and
    /// version, e.g. `"METROID USA (rev 0)"`.
    pub fn friendly_name(&self) -> String {
        let kiosk = if self.is_kiosk() { " (Kiosk)" } else { "" };
        let region = match self.region() {
            Region::Unknown => "Unknown Region",
            r => r.code(),
        };
        format!(
            "{}{} {} (rev {})",
            self.title(),
            kiosk,
            region,
            self.rom_version
        )
    }

    /// A more informative game code, e.g. `"AMHE (rev 0)"`.
    pub fn friendly_code(&self) -> String {
        format!("{} (rev {})", self.game_code_str(), self.rom_version)
    }

    /// An ideal filename for the ROM, using only filesystem-friendly
    /// characters, e.g. `"METROID-AMHE-01-rev0.nds"`.
    pub fn suitable_filename(&self) -> String {
        let mut title = String::new();
        for &b in &self.game_title {
            if b == 0 {
                break;
            }
            if b.is_ascii_alphanumeric() {
                title.push(b as char);
            } else {
                title.push('_');
            }
        }
        let kiosk = if self.is_kiosk() { "-Kiosk" } else { "" };
        format!(
            "{}{}-{}-{}-rev{}.nds",
            title,
            kiosk,
            self.game_code_str(),
            self.maker_code_str(),
            self.rom_version
        )
    }

    // -- Validation --

    /// Computes a fresh header CRC-16 over the original image.
    pub fn compute_header_crc16(&self) -> u16 {
        crc16(&self.raw[..HEADER_CRC_OFFSET])
    }

    /// Returns true if the header seems valid enough to enumerate.
    ///
    /// Checks the size and offset of the FNT, FAT, ARM9, ARM7, and both
    /// overlay tables, plus `icon_title_offset`. With `check_crc`, also
    /// recomputes the header CRC-16 and compares it to the stored value.
    pub fn seems_valid(&self, check_crc: bool) -> bool {
        // GBATEK suggests 0x4000 here, but homebrew images use values as
        // low as 0x200; require only that the declared header covers the
        // checksummed region.
        if self.rom_size_header <= HEADER_CRC_OFFSET as u32 {
            return false;
        }

        if self.arm9_address_entry < 0x0200_0000
            || self.arm9_address_ram < 0x0200_0000
            || self.arm9_size == 0
            || self.arm9_rom_offset < self.rom_size_header
        {
            return false;
        }

        if self.arm7_address_entry < 0x0200_0000
            || self.arm7_address_ram < 0x0200_0000
            || self.arm7_size == 0
            || self.arm7_rom_offset < self.rom_size_header
        {
            return false;
        }

        // A table with a non-zero offset must not be empty.
        let tables = [
            (
                self.file_allocation_table_offset,
                self.file_allocation_table_size,
            ),
            (self.file_name_table_offset, self.file_name_table_size),
            (self.arm9_overlay_offset, self.arm9_overlay_size),
            (self.arm7_overlay_offset, self.arm7_overlay_size),
        ];
        if tables.iter().any(|&(offset, size)| offset != 0 && size == 0) {
            return false;
        }

        if self.icon_title_offset != 0 && self.icon_title_offset < 0x8000 {
            return false;
        }

        if check_crc && self.compute_header_crc16() != self.header_crc16 {
            return false;
        }

        true
    }
}

#[cfg(test)]
#[path = "tests/header_tests.rs"]
mod tests;
