//! Volume descriptor parsing.
//!
//! The descriptor set occupies logical sectors 16 onwards; each descriptor is
//! one 2048-byte sector opening with a type byte, the `CD001` standard
//! identifier, and a version byte.

use discview_core::FsError;
use time::OffsetDateTime;

use crate::codec::{
    self, IsoEncoding, read_u16_both, read_u32_both, read_u32_bitswapped, read_u32_le,
};
use crate::record::DirectoryRecord;

/// The ECMA-119 standard identifier.
pub(crate) const STANDARD_IDENTIFIER: &[u8; 5] = b"CD001";

/// Byte length of a descriptor sector.
pub(crate) const DESCRIPTOR_LENGTH: usize = 2048;

/// First logical sector of the descriptor set.
pub(crate) const DESCRIPTOR_SET_START: u64 = 16;

/// Descriptor type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeDescriptorKind {
    /// Boot record (El Torito); recognised but not parsed further.
    Boot,
    Primary,
    Supplementary,
    Partition,
    SetTerminator,
    Other(u8),
}

impl From<u8> for VolumeDescriptorKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Boot,
            1 => Self::Primary,
            2 => Self::Supplementary,
            3 => Self::Partition,
            255 => Self::SetTerminator,
            other => Self::Other(other),
        }
    }
}

/// The 7-byte header every descriptor opens with.
#[derive(Debug, Clone, Copy)]
pub struct VolumeDescriptorHeader {
    pub kind: VolumeDescriptorKind,
    pub version: u8,
}

impl VolumeDescriptorHeader {
    /// Validate the standard identifier and decode the type tag.
    pub fn parse(sector: &[u8]) -> Result<Self, FsError> {
        if sector.len() < 7 {
            return Err(FsError::corrupted("volume descriptor shorter than its header"));
        }
        if &sector[1..6] != STANDARD_IDENTIFIER {
            return Err(FsError::unrecognized(
                "volume descriptor standard identifier is not CD001",
            ));
        }
        Ok(Self {
            kind: VolumeDescriptorKind::from(sector[0]),
            version: sector[6],
        })
    }
}

/// The fields shared by primary and supplementary descriptors.
#[derive(Debug, Clone)]
pub struct VolumeDescriptor {
    pub kind: VolumeDescriptorKind,
    pub system_identifier: String,
    pub volume_identifier: String,
    /// Size of the volume in logical blocks.
    pub volume_space_size: u32,
    pub volume_set_size: u16,
    pub volume_sequence_number: u16,
    /// 2048 on conformant discs, but always taken from here.
    pub logical_block_size: u16,
    pub path_table_size: u32,
    /// Type-L (little-endian) path table location.
    pub type_l_path_table: u32,
    /// Type-M (big-endian) path table location, already byte-swapped.
    pub type_m_path_table: u32,
    /// The embedded 34-byte root directory record.
    pub root_record: DirectoryRecord,
    pub volume_set_identifier: String,
    pub publisher_identifier: String,
    pub data_preparer_identifier: String,
    pub application_identifier: String,
    pub creation_time: OffsetDateTime,
    pub modification_time: OffsetDateTime,
    pub expiration_time: OffsetDateTime,
    pub effective_time: OffsetDateTime,
    /// Encoding the descriptor's identifier hierarchy uses.
    pub encoding: IsoEncoding,
}

impl VolumeDescriptor {
    /// Parse the common descriptor shape with the given identifier encoding.
    pub fn parse(sector: &[u8], encoding: IsoEncoding) -> Result<Self, FsError> {
        let header = VolumeDescriptorHeader::parse(sector)?;
        if sector.len() < DESCRIPTOR_LENGTH {
            return Err(FsError::corrupted("truncated volume descriptor"));
        }

        let root_record = match DirectoryRecord::read(&sector[156..190], 0, encoding)? {
            Some((record, _)) => record,
            None => {
                return Err(FsError::corrupted("volume descriptor has an empty root record"));
            }
        };
        if !root_record.is_directory() {
            return Err(FsError::corrupted("root directory record is not a directory"));
        }

        let time = |offset: usize| {
            let mut stamp = [0u8; 17];
            stamp.copy_from_slice(&sector[offset..offset + 17]);
            codec::decode_volume_time(&stamp)
        };

        Ok(Self {
            kind: header.kind,
            system_identifier: codec::decode_string(&sector[8..40], encoding),
            volume_identifier: codec::decode_string(&sector[40..72], encoding),
            volume_space_size: read_u32_both(sector, 80),
            volume_set_size: read_u16_both(sector, 120),
            volume_sequence_number: read_u16_both(sector, 124),
            logical_block_size: read_u16_both(sector, 128),
            path_table_size: read_u32_both(sector, 132),
            type_l_path_table: read_u32_le(sector, 140),
            type_m_path_table: read_u32_bitswapped(sector, 148),
            root_record,
            volume_set_identifier: codec::decode_string(&sector[190..318], encoding),
            publisher_identifier: codec::decode_string(&sector[318..446], encoding),
            data_preparer_identifier: codec::decode_string(&sector[446..574], encoding),
            application_identifier: codec::decode_string(&sector[574..702], encoding),
            creation_time: time(813),
            modification_time: time(830),
            expiration_time: time(847),
            effective_time: time(864),
            encoding,
        })
    }

    /// True when the escape-sequences field announces a Joliet (UCS-2)
    /// hierarchy: `25 2F` followed by `40`, `43` or `45` (levels 1–3).
    pub fn has_joliet_escape(sector: &[u8]) -> bool {
        sector.len() >= 91
            && sector[88] == 0x25
            && sector[89] == 0x2F
            && matches!(sector[90], 0x40 | 0x43 | 0x45)
    }

    /// The encoding a supplementary descriptor's escape sequences select.
    pub fn supplementary_encoding(sector: &[u8]) -> IsoEncoding {
        if Self::has_joliet_escape(sector) {
            IsoEncoding::Ucs2Be
        } else {
            IsoEncoding::Ascii
        }
    }
}

#[cfg(test)]
#[path = "tests/volume_tests.rs"]
mod tests;
