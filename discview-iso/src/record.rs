//! ECMA-119 directory record decoding.

use bitflags::bitflags;
use discview_core::FsError;
use time::OffsetDateTime;

use crate::codec::{
    self, IsoEncoding, read_u16_both, read_u32_both,
};

/// Identifier byte naming a directory's own entry.
pub(crate) const SELF_IDENTIFIER: &str = "\u{0}";
/// Identifier byte naming a directory's parent entry.
pub(crate) const PARENT_IDENTIFIER: &str = "\u{1}";

bitflags! {
    /// The file flags byte of a directory record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileFlags: u8 {
        const HIDDEN = 0x01;
        const DIRECTORY = 0x02;
        const ASSOCIATED = 0x04;
        const RECORD = 0x08;
        const PROTECTION = 0x10;
        /// Not the final extent of this file; further records with the same
        /// identifier follow.
        const MULTI_EXTENT = 0x80;
    }
}

/// One decoded directory record.
#[derive(Debug, Clone)]
pub struct DirectoryRecord {
    pub extended_attribute_length: u8,
    /// Logical block of the first byte of the extent.
    pub extent_lba: u32,
    /// Extent length in bytes.
    pub data_length: u32,
    pub recording_time: OffsetDateTime,
    pub flags: FileFlags,
    pub file_unit_size: u8,
    pub interleave_gap_size: u8,
    pub volume_sequence_number: u16,
    /// Decoded file identifier; `\x00` and `\x01` name self and parent.
    pub file_identifier: String,
    /// Raw system-use bytes trailing the identifier (SUSP area).
    pub system_use: Vec<u8>,
}

impl DirectoryRecord {
    /// Decode the record starting at `offset`.
    ///
    /// Returns the record plus the number of bytes consumed, which always
    /// equals the record's length byte. A zero length byte returns `None`:
    /// no more records in this logical block, skip to the next one.
    pub fn read(
        buf: &[u8],
        offset: usize,
        encoding: IsoEncoding,
    ) -> Result<Option<(DirectoryRecord, usize)>, FsError> {
        if offset >= buf.len() {
            return Ok(None);
        }
        let length = buf[offset] as usize;
        if length == 0 {
            return Ok(None);
        }
        if length < 34 || offset + length > buf.len() {
            return Err(FsError::corrupted(format!(
                "directory record at offset {offset} overruns its buffer (length {length})"
            )));
        }
        let record = &buf[offset..offset + length];

        let identifier_length = record[32] as usize;
        let padding = usize::from(identifier_length % 2 == 0);
        let system_use_start = 33 + identifier_length + padding;
        if 33 + identifier_length > length {
            return Err(FsError::corrupted(format!(
                "directory record identifier overruns its record (length {length})"
            )));
        }

        let file_identifier =
            codec::decode_string(&record[33..33 + identifier_length], encoding);
        let system_use = if system_use_start < length {
            record[system_use_start..].to_vec()
        } else {
            Vec::new()
        };

        let recording_time = {
            let mut stamp = [0u8; 7];
            stamp.copy_from_slice(&record[18..25]);
            codec::decode_record_time(&stamp)
        };

        Ok(Some((
            DirectoryRecord {
                extended_attribute_length: record[1],
                extent_lba: read_u32_both(record, 2),
                data_length: read_u32_both(record, 10),
                recording_time,
                flags: FileFlags::from_bits_retain(record[25]),
                file_unit_size: record[26],
                interleave_gap_size: record[27],
                volume_sequence_number: read_u16_both(record, 28),
                file_identifier,
                system_use,
            },
            length,
        )))
    }

    pub fn is_directory(&self) -> bool {
        self.flags.contains(FileFlags::DIRECTORY)
    }

    /// True for the `\x00` self entry.
    pub(crate) fn is_self(&self) -> bool {
        self.file_identifier == SELF_IDENTIFIER
    }

    /// True for the `\x01` parent entry.
    pub(crate) fn is_parent(&self) -> bool {
        self.file_identifier == PARENT_IDENTIFIER
    }

    pub fn is_interleaved(&self) -> bool {
        self.file_unit_size != 0 || self.interleave_gap_size != 0
    }

    /// Number of logical blocks the extent occupies.
    pub fn block_count(&self, block_size: u64) -> u64 {
        u64::from(self.data_length).div_ceil(block_size)
    }
}

/// Strip the ISO `;N` version suffix: truncate at the first `;` found after
/// position 0, otherwise return the name unchanged. Idempotent.
pub(crate) fn format_file_name(name: &str) -> &str {
    match name.char_indices().skip(1).find(|&(_, c)| c == ';') {
        Some((i, _)) => &name[..i],
        None => name,
    }
}

#[cfg(test)]
#[path = "tests/record_tests.rs"]
mod tests;
