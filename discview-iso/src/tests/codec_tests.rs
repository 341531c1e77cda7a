use super::*;

use time::Month;

// -- Integer decoding --

#[test]
fn both_endian_reads_return_the_little_endian_half() {
    // LE half says 0x11223344, BE half deliberately disagrees.
    let buf = [0x44, 0x33, 0x22, 0x11, 0xDE, 0xAD, 0xBE, 0xEF];
    assert_eq!(read_u32_both(&buf, 0), 0x1122_3344);

    let buf16 = [0x34, 0x12, 0xFF, 0xFF];
    assert_eq!(read_u16_both(&buf16, 0), 0x1234);
}

#[test]
fn bitswapped_read_recovers_big_endian_values() {
    let buf = 0x0001_0203u32.to_be_bytes();
    assert_eq!(read_u32_bitswapped(&buf, 0), 0x0001_0203);
}

// -- String decoding --

#[test]
fn single_byte_identifiers_pass_through() {
    assert_eq!(decode_string(&[0x00], IsoEncoding::Ascii), "\u{0}");
    assert_eq!(decode_string(&[0x01], IsoEncoding::Ascii), "\u{1}");
    assert_eq!(decode_string(&[0x00], IsoEncoding::Ucs2Be), "\u{0}");
}

#[test]
fn ascii_strings_trim_trailing_spaces_only() {
    assert_eq!(decode_string(b"README.TXT  ", IsoEncoding::Ascii), "README.TXT");
    assert_eq!(decode_string(b"  LEADING", IsoEncoding::Ascii), "  LEADING");
}

#[test]
fn ucs2_strings_decode_big_endian() {
    let bytes = [0x00, b'A', 0x00, b'b', 0x00, b'1', 0x00, b' '];
    assert_eq!(decode_string(&bytes, IsoEncoding::Ucs2Be), "Ab1");
}

// -- Volume timestamps --

fn volume_stamp(digits: &str, offset: i8) -> [u8; 17] {
    let mut buf = [0u8; 17];
    buf[..16].copy_from_slice(digits.as_bytes());
    buf[16] = offset as u8;
    buf
}

#[test]
fn all_zero_volume_time_is_the_epoch_sentinel() {
    assert_eq!(decode_volume_time(&volume_stamp("0000000000000000", 0)), EPOCH);
}

#[test]
fn nul_padded_volume_time_is_the_epoch_sentinel() {
    // Entirely NUL digits plus a NUL offset, as burned by buggy mastering tools.
    assert_eq!(decode_volume_time(&[0u8; 17]), EPOCH);
}

#[test]
fn volume_time_decodes_fields_and_offset() {
    let stamp = decode_volume_time(&volume_stamp("2003060412305025", 8));
    assert_eq!(stamp.year(), 2003);
    assert_eq!(stamp.month(), Month::June);
    assert_eq!(stamp.day(), 4);
    assert_eq!(stamp.hour(), 12);
    assert_eq!(stamp.minute(), 30);
    assert_eq!(stamp.second(), 50);
    assert_eq!(stamp.millisecond(), 250);
    // +8 quarter hours = +02:00
    assert_eq!(stamp.offset().whole_hours(), 2);
}

#[test]
fn volume_time_replaces_nul_digits_with_zero() {
    let mut buf = volume_stamp("2003060412305025", 0);
    buf[14] = 0;
    buf[15] = 0;
    let stamp = decode_volume_time(&buf);
    assert_eq!(stamp.year(), 2003);
    assert_eq!(stamp.millisecond(), 0);
}

#[test]
fn volume_time_clamps_out_of_range_fields() {
    // Month 99 clamps to 12, hour 77 clamps to 23.
    let stamp = decode_volume_time(&volume_stamp("2003990177777777", 0));
    assert_eq!(stamp.month(), Month::December);
    assert_eq!(stamp.hour(), 23);
    assert_eq!(stamp.minute(), 59);
}

#[test]
fn impossible_calendar_date_yields_the_sentinel() {
    // February 31st survives clamping but not calendar validation.
    assert_eq!(decode_volume_time(&volume_stamp("2003023100000000", 0)), EPOCH);
}

#[test]
fn non_digit_volume_time_yields_the_sentinel() {
    assert_eq!(decode_volume_time(&volume_stamp("20XX060412305025", 0)), EPOCH);
}

// -- Directory record timestamps --

#[test]
fn record_time_decodes_years_since_1900() {
    let stamp = decode_record_time(&[103, 6, 4, 12, 30, 50, 0]);
    assert_eq!(stamp.year(), 2003);
    assert_eq!(stamp.month(), Month::June);
    assert_eq!(stamp.day(), 4);
    assert_eq!(stamp.hour(), 12);
}

#[test]
fn record_time_applies_negative_offsets() {
    // -20 quarter hours = -05:00
    let stamp = decode_record_time(&[103, 6, 4, 12, 0, 0, (-20i8) as u8]);
    assert_eq!(stamp.offset().whole_hours(), -5);
}

#[test]
fn zeroed_record_time_is_the_sentinel() {
    assert_eq!(decode_record_time(&[0; 7]), EPOCH);
}

#[test]
fn invalid_record_day_is_the_sentinel() {
    assert_eq!(decode_record_time(&[103, 2, 31, 0, 0, 0, 0]), EPOCH);
}
