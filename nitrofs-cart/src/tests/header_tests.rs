use super::*;

fn set_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Build a synthetic header that passes every structural check.
fn make_header() -> [u8; HEADER_SIZE] {
    let mut buf = [0u8; HEADER_SIZE];

    // Title at 0x000: "METROID" (12 bytes, null-padded)
    buf[0x000..0x007].copy_from_slice(b"METROID");

    // Game code at 0x00C: "AMHE" (E = USA)
    buf[0x00C..0x010].copy_from_slice(b"AMHE");

    // Maker code at 0x010: "01" (Nintendo)
    buf[0x010..0x012].copy_from_slice(b"01");

    // Device capacity at 0x014: 9 = 64 MB
    buf[0x014] = 9;

    // ARM9: offset 0x4000, entry/ram in main RAM, size 0x1000
    set_u32(&mut buf, 0x020, 0x4000);
    set_u32(&mut buf, 0x024, 0x0200_0000);
    set_u32(&mut buf, 0x028, 0x0200_0000);
    set_u32(&mut buf, 0x02C, 0x1000);

    // ARM7: offset 0x8000, size 0x800
    set_u32(&mut buf, 0x030, 0x8000);
    set_u32(&mut buf, 0x034, 0x0237_8000);
    set_u32(&mut buf, 0x038, 0x0237_8000);
    set_u32(&mut buf, 0x03C, 0x800);

    // Total used ROM size and header size
    set_u32(&mut buf, 0x080, 0x0001_0000);
    set_u32(&mut buf, 0x084, 0x200);

    recompute_crc(&mut buf);
    buf
}

/// Recompute the header CRC-16 after editing fields.
fn recompute_crc(buf: &mut [u8; HEADER_SIZE]) {
    let crc = crc16(&buf[..HEADER_CRC_OFFSET]);
    buf[HEADER_CRC_OFFSET..HEADER_CRC_OFFSET + 2].copy_from_slice(&crc.to_le_bytes());
}

#[test]
fn test_crc16_check_value() {
    // Standard CRC-16/ARC check value
    assert_eq!(crc16(b"123456789"), 0xBB3D);
}

#[test]
fn test_parse_fields() {
    let header = CartHeader::parse(&make_header()).unwrap();

    assert_eq!(header.title(), "METROID");
    assert_eq!(header.game_code_str(), "AMHE");
    assert_eq!(header.maker_code_str(), "01");
    assert_eq!(header.rom_version, 0);
    assert_eq!(header.arm9_rom_offset, 0x4000);
    assert_eq!(header.arm9_size, 0x1000);
    assert_eq!(header.arm7_rom_offset, 0x8000);
    assert_eq!(header.arm7_size, 0x800);
    assert_eq!(header.rom_size_header, 0x200);
    assert_eq!(header.rom_size_total_used, 0x10000);
    assert_eq!(header.icon_title_offset, 0);
    assert_eq!(header.device_capacity, 9);
}

#[test]
fn test_release_classification() {
    let header = CartHeader::parse(&make_header()).unwrap();
    assert!(header.is_release());
    assert!(!header.is_first_hunt());
    assert!(!header.is_kiosk());
    assert!(header.is_recognized());
    assert_eq!(header.classify(), Some(RomKind::Release));
    assert_eq!(header.friendly_code(), "AMHE (rev 0)");
}

#[test]
fn test_release_revision_1() {
    let mut buf = make_header();
    buf[0x01E] = 1;
    let header = CartHeader::parse(&buf).unwrap();
    assert!(header.is_release());
    assert_eq!(header.friendly_code(), "AMHE (rev 1)");
}

#[test]
fn test_unknown_revision_not_recognized() {
    let mut buf = make_header();
    buf[0x01E] = 2; // no AMHE rev 2 exists
    let header = CartHeader::parse(&buf).unwrap();
    assert!(!header.is_recognized());
    assert_eq!(header.classify(), None);
}

#[test]
fn test_first_hunt_classification() {
    let mut buf = make_header();
    buf[0x00C..0x010].copy_from_slice(b"AMFE");
    let header = CartHeader::parse(&buf).unwrap();
    assert_eq!(header.classify(), Some(RomKind::FirstHunt));
}

#[test]
fn test_kiosk_classification() {
    let mut buf = make_header();
    buf[0x00C..0x010].copy_from_slice(b"A76E");
    let header = CartHeader::parse(&buf).unwrap();
    assert_eq!(header.classify(), Some(RomKind::Kiosk));
    assert_eq!(header.friendly_name(), "METROID (Kiosk) USA (rev 0)");
    assert_eq!(header.suitable_filename(), "METROID-Kiosk-A76E-01-rev0.nds");
}

#[test]
fn test_friendly_name_regions() {
    let mut buf = make_header();
    let header = CartHeader::parse(&buf).unwrap();
    assert_eq!(header.friendly_name(), "METROID USA (rev 0)");

    buf[0x00F] = b'P';
    let header = CartHeader::parse(&buf).unwrap();
    assert_eq!(header.friendly_name(), "METROID EUR (rev 0)");
    assert_eq!(header.region(), Region::Europe);

    buf[0x00F] = b'J';
    let header = CartHeader::parse(&buf).unwrap();
    assert_eq!(header.friendly_name(), "METROID JPN (rev 0)");

    buf[0x00F] = b'K';
    let header = CartHeader::parse(&buf).unwrap();
    assert_eq!(header.friendly_name(), "METROID KOR (rev 0)");

    buf[0x00F] = b'X';
    let header = CartHeader::parse(&buf).unwrap();
    assert_eq!(header.friendly_name(), "METROID Unknown Region (rev 0)");
    assert_eq!(header.region(), Region::Unknown);
}

#[test]
fn test_suitable_filename() {
    let header = CartHeader::parse(&make_header()).unwrap();
    let name = header.suitable_filename();
    assert_eq!(name, "METROID-AMHE-01-rev0.nds");
    assert!(name.contains("-AMHE-"));
    assert!(name.ends_with("-rev0.nds"));
}

#[test]
fn test_suitable_filename_sanitizes() {
    let mut buf = make_header();
    buf[0x000..0x00C].copy_from_slice(b"MET ROID*X\0\0");
    let header = CartHeader::parse(&buf).unwrap();
    assert_eq!(header.suitable_filename(), "MET_ROID_X-AMHE-01-rev0.nds");
}

#[test]
fn test_seems_valid_accepts_good_header() {
    let header = CartHeader::parse(&make_header()).unwrap();
    assert!(header.seems_valid(false));
    assert!(header.seems_valid(true));
}

#[test]
fn test_seems_valid_rejects_zero_arm9_size() {
    let mut buf = make_header();
    set_u32(&mut buf, 0x02C, 0);
    recompute_crc(&mut buf);
    let header = CartHeader::parse(&buf).unwrap();
    assert!(!header.seems_valid(false));
}

#[test]
fn test_seems_valid_rejects_low_arm9_entry() {
    let mut buf = make_header();
    set_u32(&mut buf, 0x024, 0x0100_0000);
    recompute_crc(&mut buf);
    let header = CartHeader::parse(&buf).unwrap();
    assert!(!header.seems_valid(false));
}

#[test]
fn test_seems_valid_rejects_arm7_offset_inside_header() {
    let mut buf = make_header();
    set_u32(&mut buf, 0x030, 0x100);
    recompute_crc(&mut buf);
    let header = CartHeader::parse(&buf).unwrap();
    assert!(!header.seems_valid(false));
}

#[test]
fn test_seems_valid_rejects_small_header_size() {
    let mut buf = make_header();
    set_u32(&mut buf, 0x084, HEADER_CRC_OFFSET as u32);
    recompute_crc(&mut buf);
    let header = CartHeader::parse(&buf).unwrap();
    assert!(!header.seems_valid(false));
}

#[test]
fn test_seems_valid_rejects_offset_without_size() {
    let mut buf = make_header();
    set_u32(&mut buf, 0x048, 0x9000); // FAT offset with zero size
    recompute_crc(&mut buf);
    let header = CartHeader::parse(&buf).unwrap();
    assert!(!header.seems_valid(false));
}

#[test]
fn test_seems_valid_rejects_low_icon_offset() {
    let mut buf = make_header();
    set_u32(&mut buf, 0x068, 0x4000);
    recompute_crc(&mut buf);
    let header = CartHeader::parse(&buf).unwrap();
    assert!(!header.seems_valid(false));
}

#[test]
fn test_crc_flip_only_fails_checked_validation() {
    let mut buf = make_header();
    buf[0x15E] ^= 0xFF;
    let header = CartHeader::parse(&buf).unwrap();
    // Monotone in check_crc: structurally fine, checksum wrong
    assert!(header.seems_valid(false));
    assert!(!header.seems_valid(true));
}

#[test]
fn test_compute_crc_matches_stored() {
    let header = CartHeader::parse(&make_header()).unwrap();
    assert_eq!(header.compute_header_crc16(), header.header_crc16);
}

#[test]
fn test_capacity_bytes() {
    let mut buf = make_header();
    let header = CartHeader::parse(&buf).unwrap();
    assert_eq!(header.capacity_bytes(), Some(64 * 1024 * 1024));

    buf[0x014] = 0;
    let header = CartHeader::parse(&buf).unwrap();
    assert_eq!(header.capacity_bytes(), Some(128 * 1024));

    buf[0x014] = 13;
    let header = CartHeader::parse(&buf).unwrap();
    assert_eq!(header.capacity_bytes(), None);
}

#[test]
fn test_unit_name() {
    let mut buf = make_header();
    let header = CartHeader::parse(&buf).unwrap();
    assert_eq!(header.unit_name(), "NDS");

    buf[0x012] = 0x02;
    let header = CartHeader::parse(&buf).unwrap();
    assert_eq!(header.unit_name(), "NDS+DSi");

    buf[0x012] = 0x03;
    let header = CartHeader::parse(&buf).unwrap();
    assert_eq!(header.unit_name(), "DSi");
}
