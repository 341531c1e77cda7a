use super::*;

// -- Test helpers --

/// Build a directory record with the given identifier and optional
/// system-use payload.
fn make_record(identifier: &[u8], flags: u8, system_use: &[u8]) -> Vec<u8> {
    let id_len = identifier.len();
    let pad = usize::from(id_len % 2 == 0);
    let length = 33 + id_len + pad + system_use.len();

    let mut record = vec![0u8; length];
    record[0] = length as u8;
    record[2..6].copy_from_slice(&30u32.to_le_bytes());
    record[6..10].copy_from_slice(&30u32.to_be_bytes());
    record[10..14].copy_from_slice(&1234u32.to_le_bytes());
    record[14..18].copy_from_slice(&1234u32.to_be_bytes());
    record[18..25].copy_from_slice(&[103, 6, 4, 12, 30, 50, 0]);
    record[25] = flags;
    record[28..30].copy_from_slice(&1u16.to_le_bytes());
    record[32] = id_len as u8;
    record[33..33 + id_len].copy_from_slice(identifier);
    record[33 + id_len + pad..].copy_from_slice(system_use);
    record
}

// -- Decoding --

#[test]
fn read_decodes_fixed_fields() {
    let buf = make_record(b"README.TXT;1", 0, &[]);
    let (record, consumed) = DirectoryRecord::read(&buf, 0, IsoEncoding::Ascii)
        .unwrap()
        .unwrap();

    assert_eq!(consumed, buf.len());
    assert_eq!(record.extent_lba, 30);
    assert_eq!(record.data_length, 1234);
    assert_eq!(record.volume_sequence_number, 1);
    assert_eq!(record.file_identifier, "README.TXT;1");
    assert_eq!(record.recording_time.year(), 2003);
    assert!(!record.is_directory());
    assert!(record.system_use.is_empty());
}

#[test]
fn read_consumes_exactly_the_length_byte() {
    let mut buf = make_record(b"A", 0, &[]);
    let trailer = make_record(b"B", 0, &[]);
    buf.extend_from_slice(&trailer);

    let (first, consumed) = DirectoryRecord::read(&buf, 0, IsoEncoding::Ascii)
        .unwrap()
        .unwrap();
    assert_eq!(first.file_identifier, "A");

    let (second, _) = DirectoryRecord::read(&buf, consumed, IsoEncoding::Ascii)
        .unwrap()
        .unwrap();
    assert_eq!(second.file_identifier, "B");
}

#[test]
fn zero_length_byte_signals_end_of_block() {
    let buf = [0u8; 64];
    assert!(DirectoryRecord::read(&buf, 0, IsoEncoding::Ascii)
        .unwrap()
        .is_none());
}

#[test]
fn even_identifier_length_adds_a_padding_byte() {
    // Even-length identifier: one pad byte before the system-use area.
    let buf = make_record(b"AB", 0, b"XY");
    let (record, _) = DirectoryRecord::read(&buf, 0, IsoEncoding::Ascii)
        .unwrap()
        .unwrap();
    assert_eq!(record.system_use, b"XY");

    // Odd-length identifier: no padding.
    let buf = make_record(b"ABC", 0, b"XY");
    let (record, _) = DirectoryRecord::read(&buf, 0, IsoEncoding::Ascii)
        .unwrap()
        .unwrap();
    assert_eq!(record.system_use, b"XY");
}

#[test]
fn record_overrunning_its_buffer_is_corrupted() {
    let mut buf = make_record(b"A", 0, &[]);
    let length = buf.len();
    buf[0] = (length + 8) as u8;
    let err = DirectoryRecord::read(&buf, 0, IsoEncoding::Ascii).unwrap_err();
    assert!(matches!(err, discview_core::FsError::CorruptedImage(_)));
}

#[test]
fn self_and_parent_identifiers_are_flagged() {
    let self_buf = make_record(&[0x00], 0x02, &[]);
    let (record, _) = DirectoryRecord::read(&self_buf, 0, IsoEncoding::Ascii)
        .unwrap()
        .unwrap();
    assert!(record.is_self());
    assert!(!record.is_parent());

    let parent_buf = make_record(&[0x01], 0x02, &[]);
    let (record, _) = DirectoryRecord::read(&parent_buf, 0, IsoEncoding::Ascii)
        .unwrap()
        .unwrap();
    assert!(record.is_parent());
}

#[test]
fn flags_decode_through_bitflags() {
    let buf = make_record(b"DIR", 0x02 | 0x80, &[]);
    let (record, _) = DirectoryRecord::read(&buf, 0, IsoEncoding::Ascii)
        .unwrap()
        .unwrap();
    assert!(record.flags.contains(FileFlags::DIRECTORY));
    assert!(record.flags.contains(FileFlags::MULTI_EXTENT));
    assert!(!record.flags.contains(FileFlags::HIDDEN));
}

#[test]
fn block_count_rounds_up() {
    let buf = make_record(b"F", 0, &[]);
    let (mut record, _) = DirectoryRecord::read(&buf, 0, IsoEncoding::Ascii)
        .unwrap()
        .unwrap();
    record.data_length = 2049;
    assert_eq!(record.block_count(2048), 2);
    record.data_length = 2048;
    assert_eq!(record.block_count(2048), 1);
    record.data_length = 0;
    assert_eq!(record.block_count(2048), 0);
}

// -- Name formatting --

#[test]
fn format_file_name_strips_version_suffix() {
    assert_eq!(format_file_name("README.TXT;1"), "README.TXT");
    assert_eq!(format_file_name("NOVERSION"), "NOVERSION");
}

#[test]
fn format_file_name_keeps_leading_semicolon() {
    assert_eq!(format_file_name(";1"), ";1");
}

#[test]
fn format_file_name_is_idempotent() {
    let once = format_file_name("DATA.BIN;1");
    assert_eq!(format_file_name(once), once);
}
