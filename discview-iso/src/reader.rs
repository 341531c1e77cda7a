//! Descriptor-set scanning and variant selection.

use std::io::SeekFrom;

use discview_core::{FsError, ReadSeek};

use crate::codec::IsoEncoding;
use crate::context::{IsoVariant, StreamHandle};
use crate::record::DirectoryRecord;
use crate::susp::{self, SuspSettings};
use crate::volume::{
    DESCRIPTOR_LENGTH, DESCRIPTOR_SET_START, STANDARD_IDENTIFIER, VolumeDescriptor,
    VolumeDescriptorHeader, VolumeDescriptorKind,
};

/// The first primary and first supplementary descriptor sectors found.
pub(crate) struct DescriptorScan {
    pub primary: Option<Vec<u8>>,
    pub supplementary: Option<Vec<u8>>,
}

/// Check whether a stream carries an ISO 9660 descriptor set, without
/// building a reader.
///
/// Requires the stream to reach past sector 16; anything shorter is simply
/// not an ISO image. Only the standard identifier is examined.
pub fn detect<R: ReadSeek>(stream: &mut R) -> Result<bool, FsError> {
    let minimum = DESCRIPTOR_SET_START * DESCRIPTOR_LENGTH as u64 + DESCRIPTOR_LENGTH as u64;
    let length = stream.seek(SeekFrom::End(0))?;
    if length < minimum {
        return Ok(false);
    }
    stream.seek(SeekFrom::Start(DESCRIPTOR_SET_START * DESCRIPTOR_LENGTH as u64))?;
    let mut sector = [0u8; DESCRIPTOR_LENGTH];
    stream.read_exact(&mut sector)?;
    Ok(&sector[1..6] == STANDARD_IDENTIFIER)
}

/// Scan the descriptor set from sector 16.
///
/// Every sector must carry the `CD001` identifier; the scan stops at a set
/// terminator, or at a short read (treated as if a terminator were present).
pub(crate) fn scan_descriptors<R: ReadSeek>(
    stream: &StreamHandle<R>,
) -> Result<DescriptorScan, FsError> {
    let mut scan = DescriptorScan {
        primary: None,
        supplementary: None,
    };
    let mut position = DESCRIPTOR_SET_START * DESCRIPTOR_LENGTH as u64;

    loop {
        let mut sector = vec![0u8; DESCRIPTOR_LENGTH];
        let count = stream.read_at(position, &mut sector)?;
        if count < DESCRIPTOR_LENGTH {
            log::debug!("descriptor set ended by short read at offset {position}");
            break;
        }

        let header = VolumeDescriptorHeader::parse(&sector)?;
        match header.kind {
            VolumeDescriptorKind::Primary => {
                if scan.primary.is_none() {
                    scan.primary = Some(sector);
                }
            }
            VolumeDescriptorKind::Supplementary => {
                if scan.supplementary.is_none() {
                    scan.supplementary = Some(sector);
                }
            }
            VolumeDescriptorKind::SetTerminator => break,
            other => {
                log::debug!("ignoring volume descriptor {other:?} at offset {position}");
            }
        }
        position += DESCRIPTOR_LENGTH as u64;
    }
    Ok(scan)
}

/// Pick the variant to expose, in priority order Joliet, Rock Ridge, plain
/// ISO 9660.
///
/// The Joliet branch verifies the supplementary descriptor's escape sequence
/// before accepting; a supplementary descriptor without one never satisfies
/// it. Rock Ridge requires SUSP on the primary root plus a registered (or
/// legacy-inferred) Rock Ridge identifier.
pub(crate) fn select_variant<R: ReadSeek>(
    stream: &StreamHandle<R>,
    scan: &DescriptorScan,
) -> Result<(VolumeDescriptor, IsoVariant, SuspSettings), FsError> {
    if let Some(supplementary) = &scan.supplementary
        && VolumeDescriptor::has_joliet_escape(supplementary)
    {
        let descriptor = VolumeDescriptor::parse(supplementary, IsoEncoding::Ucs2Be)?;
        log::debug!(
            "selected Joliet hierarchy for volume {:?}",
            descriptor.volume_identifier
        );
        return Ok((descriptor, IsoVariant::Joliet, SuspSettings::default()));
    }

    if let Some(primary) = &scan.primary {
        let descriptor = VolumeDescriptor::parse(primary, IsoEncoding::Ascii)?;
        let settings = detect_susp(stream, &descriptor)?;
        let variant = if settings.rock_ridge() {
            IsoVariant::RockRidge
        } else {
            IsoVariant::Iso9660
        };
        log::debug!(
            "selected {variant:?} hierarchy for volume {:?}",
            descriptor.volume_identifier
        );
        return Ok((descriptor, variant, settings));
    }

    Err(FsError::unsupported_variant(
        "no primary or Joliet supplementary volume descriptor present",
    ))
}

/// Run SUSP detection on the self record of the primary root directory.
fn detect_susp<R: ReadSeek>(
    stream: &StreamHandle<R>,
    descriptor: &VolumeDescriptor,
) -> Result<SuspSettings, FsError> {
    let root = &descriptor.root_record;
    let block_size = u64::from(descriptor.logical_block_size);
    let probe_length = root.data_length.min(u32::from(descriptor.logical_block_size));
    if probe_length == 0 {
        return Ok(SuspSettings::default());
    }

    let mut block = vec![0u8; probe_length as usize];
    stream.read_exact_at(u64::from(root.extent_lba) * block_size, &mut block)?;

    let self_record = match DirectoryRecord::read(&block, 0, descriptor.encoding)? {
        Some((record, _)) if record.is_self() => record,
        _ => return Ok(SuspSettings::default()),
    };
    let Some(skip_bytes) = susp::detect_sharing_protocol(&self_record.system_use) else {
        return Ok(SuspSettings::default());
    };

    let entries = susp::walk_system_use(stream, block_size, &self_record.system_use, 0)?;
    let (extensions, rock_ridge_identifier) = susp::identify_extensions(&entries);
    Ok(SuspSettings {
        detected: true,
        skip_bytes,
        extensions,
        rock_ridge_identifier,
    })
}
