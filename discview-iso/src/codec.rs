//! Byte-level decoders for ECMA-119 on-disc structures.
//!
//! All decoders are pure functions over `(buffer, offset)`; nothing here
//! touches the stream. Dual-encoded ("both-endian") fields store the value
//! little-endian first, then big-endian. The little-endian half is
//! authoritative and the big-endian copy is never validated, because
//! real-world discs ship with mismatched halves.

use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// The timestamp reported when an on-disc date is absent or unparseable.
pub const EPOCH: OffsetDateTime = OffsetDateTime::UNIX_EPOCH;

/// Character encoding of identifier fields, chosen by the active descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoEncoding {
    /// Plain ISO 9660 d/a-characters.
    Ascii,
    /// UCS-2 big-endian, used by Joliet hierarchies.
    Ucs2Be,
}

pub(crate) fn read_u16_le(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

pub(crate) fn read_u32_le(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

/// Read the little-endian half of a dual-encoded u16.
pub(crate) fn read_u16_both(buf: &[u8], offset: usize) -> u16 {
    read_u16_le(buf, offset)
}

/// Read the little-endian half of a dual-encoded u32.
pub(crate) fn read_u32_both(buf: &[u8], offset: usize) -> u32 {
    read_u32_le(buf, offset)
}

/// Read a u32 stored big-endian (the type-M path table location) by
/// byte-reversing a little-endian read.
pub(crate) fn read_u32_bitswapped(buf: &[u8], offset: usize) -> u32 {
    read_u32_le(buf, offset).swap_bytes()
}

/// Decode an identifier field.
///
/// A single byte passes through unchanged so the `\x00`/`\x01` self and
/// parent markers survive decoding; longer fields are decoded per the active
/// encoding with trailing ASCII spaces trimmed.
pub(crate) fn decode_string(buf: &[u8], encoding: IsoEncoding) -> String {
    if buf.len() == 1 {
        return (buf[0] as char).to_string();
    }
    let decoded = match encoding {
        IsoEncoding::Ascii => String::from_utf8_lossy(buf).into_owned(),
        IsoEncoding::Ucs2Be => {
            let units: Vec<u16> = buf
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
    };
    decoded.trim_end_matches(' ').to_string()
}

/// Decode a 17-byte volume descriptor timestamp: sixteen ASCII digits
/// (`YYYYMMDDHHMMSScc`) plus a signed 15-minute UTC offset.
///
/// All-`'0'` digits mean "not recorded" and yield [`EPOCH`]. NUL bytes in
/// digit positions are treated as `'0'` (a common burner bug). Numeric fields
/// are clamped into their legal ranges; anything that still fails to form a
/// valid date yields [`EPOCH`] rather than an error.
pub(crate) fn decode_volume_time(buf: &[u8; 17]) -> OffsetDateTime {
    let mut digits = [0u8; 16];
    for (slot, &b) in digits.iter_mut().zip(buf.iter()) {
        *slot = if b == 0 { b'0' } else { b };
    }
    if digits.iter().all(|&b| b == b'0') {
        return EPOCH;
    }

    let field = |range: std::ops::Range<usize>| ascii_number(&digits[range]);
    let parsed = (|| {
        let year = field(0..4)?;
        let month = field(4..6)?.clamp(1, 12);
        let day = field(6..8)?.clamp(1, 31);
        let hour = field(8..10)?.min(23);
        let minute = field(10..12)?.min(59);
        let second = field(12..14)?.min(59);
        let hundredths = field(14..16)?.min(99);
        build_time(
            year as i32,
            month,
            day,
            hour,
            minute,
            second,
            hundredths,
            buf[16] as i8,
        )
    })();
    parsed.unwrap_or(EPOCH)
}

/// Decode a 7-byte directory record timestamp: years since 1900, month, day,
/// hour, minute, second, signed 15-minute UTC offset. Same failure policy as
/// [`decode_volume_time`].
pub(crate) fn decode_record_time(buf: &[u8; 7]) -> OffsetDateTime {
    build_time(
        buf[0] as i32 + 1900,
        buf[1] as u32,
        buf[2] as u32,
        buf[3] as u32,
        buf[4] as u32,
        buf[5] as u32,
        0,
        buf[6] as i8,
    )
    .unwrap_or(EPOCH)
}

fn ascii_number(digits: &[u8]) -> Option<u32> {
    let mut value = 0u32;
    for &b in digits {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + u32::from(b - b'0');
    }
    Some(value)
}

#[allow(clippy::too_many_arguments)]
fn build_time(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    hundredths: u32,
    offset_quarter_hours: i8,
) -> Option<OffsetDateTime> {
    let month = Month::try_from(u8::try_from(month).ok()?).ok()?;
    let date = Date::from_calendar_date(year, month, u8::try_from(day).ok()?).ok()?;
    let time = Time::from_hms_milli(
        u8::try_from(hour).ok()?,
        u8::try_from(minute).ok()?,
        u8::try_from(second).ok()?,
        u16::try_from(hundredths * 10).ok()?,
    )
    .ok()?;
    let offset =
        UtcOffset::from_whole_seconds(i32::from(offset_quarter_hours) * 15 * 60).ok()?;
    Some(PrimitiveDateTime::new(date, time).assume_offset(offset))
}

#[cfg(test)]
#[path = "tests/codec_tests.rs"]
mod tests;
