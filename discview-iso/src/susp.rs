//! System Use Sharing Protocol and Rock Ridge parsing.
//!
//! SUSP entries are tag/length/version records occupying the trailing bytes
//! of each directory record, with out-of-line continuation areas reached
//! through `CE` entries. Rock Ridge (RRIP) rides on top of SUSP and supplies
//! POSIX names, modes, symlink targets and timestamps.

use discview_core::{FsError, ReadSeek};
use time::OffsetDateTime;

use crate::codec::{self, read_u32_both};
use crate::context::StreamHandle;

/// Check bytes carried by the `SP` entry.
pub(crate) const SHARING_PROTOCOL_MAGIC: [u8; 2] = [0xBE, 0xEF];

/// Extension identifiers that announce Rock Ridge.
const ROCK_RIDGE_IDENTIFIERS: [&str; 3] = ["RRIP_1991A", "IEEE_P1282", "IEEE_1282"];

/// Bound on followed continuation areas per record.
const MAX_CONTINUATIONS: usize = 64;

// NM and SL flag bits.
const FLAG_CONTINUE: u8 = 0x01;
const FLAG_CURRENT: u8 = 0x02;
const FLAG_PARENT: u8 = 0x04;
const SL_FLAG_ROOT: u8 = 0x08;

// TF flag bits.
const TF_CREATION: u8 = 0x01;
const TF_MODIFY: u8 = 0x02;
const TF_ACCESS: u8 = 0x04;
const TF_LONG_FORM: u8 = 0x80;

/// POSIX file-type mask and the symlink type within it.
const MODE_TYPE_MASK: u32 = 0xF000;
const MODE_TYPE_SYMLINK: u32 = 0xA000;

/// SUSP state discovered on the root directory's self record, fixed for the
/// lifetime of the reader.
#[derive(Debug, Clone, Default)]
pub(crate) struct SuspSettings {
    /// Whether the sharing protocol was detected at all.
    pub detected: bool,
    /// Bytes to skip at the start of every system-use area.
    pub skip_bytes: u8,
    /// All registered extension identifiers, in registration order.
    pub extensions: Vec<String>,
    /// The Rock Ridge identifier, when one was registered or inferred.
    pub rock_ridge_identifier: Option<String>,
}

impl SuspSettings {
    pub fn rock_ridge(&self) -> bool {
        self.rock_ridge_identifier.is_some()
    }
}

/// POSIX attributes from a `PX` entry.
#[derive(Debug, Clone)]
pub struct PosixAttributes {
    pub mode: u32,
    pub links: u32,
    pub uid: u32,
    pub gid: u32,
    /// Serial number, present only in the 44-byte form.
    pub inode: Option<u32>,
}

impl PosixAttributes {
    pub fn is_symlink(&self) -> bool {
        self.mode & MODE_TYPE_MASK == MODE_TYPE_SYMLINK
    }
}

/// One component record of an `SL` entry.
#[derive(Debug, Clone)]
pub struct SlComponent {
    pub flags: u8,
    pub text: String,
}

/// Timestamps from a `TF` entry.
#[derive(Debug, Clone, Default)]
pub struct Timestamps {
    pub creation: Option<OffsetDateTime>,
    pub modify: Option<OffsetDateTime>,
    pub access: Option<OffsetDateTime>,
}

/// A decoded system-use entry.
#[derive(Debug, Clone)]
pub enum SuspEntry {
    /// `SP`: protocol marker with per-area skip byte count.
    SharingProtocol { skip_bytes: u8 },
    /// `CE`: continuation area location.
    Continuation { lba: u32, offset: u32, length: u32 },
    /// `ER`: extension registration.
    ExtensionRegistration { identifier: String, version: u8 },
    /// `RR`: legacy Rock Ridge marker.
    RockRidgeMarker,
    /// `PX`: POSIX attributes.
    PosixAttributes(PosixAttributes),
    /// `PN`: device numbers.
    DeviceNumber { major: u32, minor: u32 },
    /// `NM`: alternate name fragment.
    AlternateName { flags: u8, fragment: String },
    /// `SL`: symbolic link components.
    SymbolicLink { flags: u8, components: Vec<SlComponent> },
    /// `TF`: alternate timestamps.
    Timestamps(Timestamps),
    /// `CL`: extent of a relocated child directory.
    ChildLink { lba: u32 },
    /// `PL`: extent of the original parent of a relocated directory.
    ParentLink { lba: u32 },
    /// `RE`: marks the placeholder location of a relocated directory.
    Relocated,
    /// `ST`: end of system-use entries for this record.
    Terminator,
    /// Anything else, preserved opaquely.
    Unknown { tag: [u8; 2], data: Vec<u8> },
}

/// Probe a system-use area for the `SP` entry that must open it on the root
/// directory's self record. Returns the skip byte count when found.
pub(crate) fn detect_sharing_protocol(system_use: &[u8]) -> Option<u8> {
    if system_use.len() >= 7
        && &system_use[0..2] == b"SP"
        && system_use[2] == 7
        && system_use[4..6] == SHARING_PROTOCOL_MAGIC
    {
        Some(system_use[6])
    } else {
        None
    }
}

/// Walk all system-use entries of one record, following continuation areas.
///
/// Iteration stops at an `ST` entry, at a malformed length, or at the end of
/// the final continuation. A continuation chain that revisits an area or
/// exceeds [`MAX_CONTINUATIONS`] fails with [`FsError::CorruptedImage`].
pub(crate) fn walk_system_use<R: ReadSeek>(
    stream: &StreamHandle<R>,
    block_size: u64,
    area: &[u8],
    skip_bytes: u8,
) -> Result<Vec<SuspEntry>, FsError> {
    let mut entries = Vec::new();
    let mut buffer: Vec<u8> = area
        .get(usize::from(skip_bytes)..)
        .unwrap_or_default()
        .to_vec();
    let mut visited: Vec<(u32, u32)> = Vec::new();

    loop {
        let mut next_continuation: Option<(u32, u32, u32)> = None;
        let mut pos = 0usize;
        let mut terminated = false;

        while pos + 4 <= buffer.len() {
            let length = buffer[pos + 2] as usize;
            if length < 4 || pos + length > buffer.len() {
                break;
            }
            let tag = [buffer[pos], buffer[pos + 1]];
            let version = buffer[pos + 3];
            let entry = parse_entry(tag, version, &buffer[pos + 4..pos + length]);
            pos += length;

            match &entry {
                SuspEntry::Terminator => {
                    entries.push(entry);
                    terminated = true;
                    break;
                }
                SuspEntry::Continuation { lba, offset, length } => {
                    if next_continuation.is_none() {
                        next_continuation = Some((*lba, *offset, *length));
                    } else {
                        log::warn!("multiple CE entries in one system-use area, following the first");
                    }
                    entries.push(entry);
                }
                _ => entries.push(entry),
            }
        }

        if terminated {
            break;
        }
        match next_continuation {
            None => break,
            Some((lba, offset, length)) => {
                if visited.contains(&(lba, offset)) {
                    return Err(FsError::corrupted(
                        "continuation area loop in system-use data",
                    ));
                }
                if visited.len() >= MAX_CONTINUATIONS {
                    return Err(FsError::corrupted(
                        "continuation area chain exceeds bound",
                    ));
                }
                visited.push((lba, offset));
                let mut continuation = vec![0u8; length as usize];
                stream.read_exact_at(
                    lba as u64 * block_size + u64::from(offset),
                    &mut continuation,
                )?;
                buffer = continuation;
            }
        }
    }
    Ok(entries)
}

/// Pick out the extension identifiers and the Rock Ridge signal.
///
/// Returns all `ER` identifiers in order plus the Rock Ridge identifier when
/// one of the known names was registered. A bare `RR` marker with no `ER`
/// entries at all is treated as an implicit `RRIP_1991A` registration.
pub(crate) fn identify_extensions(entries: &[SuspEntry]) -> (Vec<String>, Option<String>) {
    let mut extensions = Vec::new();
    let mut rock_ridge = None;
    let mut legacy_marker = false;

    for entry in entries {
        match entry {
            SuspEntry::ExtensionRegistration { identifier, .. } => {
                if rock_ridge.is_none() && ROCK_RIDGE_IDENTIFIERS.contains(&identifier.as_str()) {
                    rock_ridge = Some(identifier.clone());
                }
                extensions.push(identifier.clone());
            }
            SuspEntry::RockRidgeMarker => legacy_marker = true,
            _ => {}
        }
    }

    if rock_ridge.is_none() && extensions.is_empty() && legacy_marker {
        rock_ridge = Some(ROCK_RIDGE_IDENTIFIERS[0].to_string());
    }
    (extensions, rock_ridge)
}

/// The Rock Ridge overrides applied to one directory record.
#[derive(Debug, Default)]
pub(crate) struct RockRidgeOverrides {
    /// Concatenated `NM` alternate name, replacing the ISO identifier.
    pub name: Option<String>,
    pub attributes: Option<PosixAttributes>,
    /// Joined `SL` target.
    pub symlink_target: Option<String>,
    /// Effective timestamp from `TF` (modify, else creation).
    pub timestamp: Option<OffsetDateTime>,
    /// Real extent of a relocated child directory (`CL`).
    pub child_link: Option<u32>,
    /// The record is a relocation placeholder (`RE`).
    pub relocated: bool,
}

pub(crate) fn collect_overrides(entries: &[SuspEntry]) -> RockRidgeOverrides {
    let mut out = RockRidgeOverrides::default();
    let mut name = String::new();
    let mut name_present = false;
    let mut name_done = false;
    let mut link_components: Vec<SlComponent> = Vec::new();
    let mut creation = None;
    let mut modify = None;

    for entry in entries {
        match entry {
            SuspEntry::AlternateName { flags, fragment } if !name_done => {
                // Fragments naming self or parent never override anything.
                if flags & (FLAG_CURRENT | FLAG_PARENT) == 0 {
                    name.push_str(fragment);
                    name_present = true;
                    if flags & FLAG_CONTINUE == 0 {
                        name_done = true;
                    }
                }
            }
            SuspEntry::PosixAttributes(px) => out.attributes = Some(px.clone()),
            SuspEntry::SymbolicLink { components, .. } => {
                link_components.extend(components.iter().cloned());
            }
            SuspEntry::Timestamps(tf) => {
                creation = tf.creation.or(creation);
                modify = tf.modify.or(modify);
            }
            SuspEntry::ChildLink { lba } => out.child_link = Some(*lba),
            SuspEntry::Relocated => out.relocated = true,
            _ => {}
        }
    }

    if name_present {
        out.name = Some(name);
    }
    if !link_components.is_empty() {
        out.symlink_target = Some(join_link_components(&link_components));
    }
    out.timestamp = modify.or(creation);
    out
}

/// Join SL components into the recorded target path once every continuation
/// bit has cleared.
fn join_link_components(components: &[SlComponent]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut pending = String::new();
    let mut rooted = false;

    for component in components {
        if component.flags & SL_FLAG_ROOT != 0 {
            rooted = true;
            parts.clear();
            pending.clear();
            continue;
        }
        if component.flags & FLAG_CURRENT != 0 {
            parts.push(".".to_string());
            continue;
        }
        if component.flags & FLAG_PARENT != 0 {
            parts.push("..".to_string());
            continue;
        }
        pending.push_str(&component.text);
        if component.flags & FLAG_CONTINUE == 0 {
            parts.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        parts.push(pending);
    }

    let joined = parts.join("/");
    if rooted { format!("/{joined}") } else { joined }
}

fn parse_entry(tag: [u8; 2], version: u8, payload: &[u8]) -> SuspEntry {
    let opaque = || SuspEntry::Unknown {
        tag,
        data: payload.to_vec(),
    };

    match &tag {
        b"SP" => {
            if payload.len() >= 3 && payload[0..2] == SHARING_PROTOCOL_MAGIC {
                SuspEntry::SharingProtocol {
                    skip_bytes: payload[2],
                }
            } else {
                opaque()
            }
        }
        b"CE" => {
            if payload.len() >= 24 {
                SuspEntry::Continuation {
                    lba: read_u32_both(payload, 0),
                    offset: read_u32_both(payload, 8),
                    length: read_u32_both(payload, 16),
                }
            } else {
                opaque()
            }
        }
        b"ER" => {
            let identifier_length = payload.first().copied().unwrap_or(0) as usize;
            if payload.len() >= 4 + identifier_length {
                SuspEntry::ExtensionRegistration {
                    identifier: String::from_utf8_lossy(&payload[4..4 + identifier_length])
                        .into_owned(),
                    version: payload[3],
                }
            } else {
                opaque()
            }
        }
        b"RR" => SuspEntry::RockRidgeMarker,
        b"PX" => {
            if payload.len() >= 32 {
                SuspEntry::PosixAttributes(PosixAttributes {
                    mode: read_u32_both(payload, 0),
                    links: read_u32_both(payload, 8),
                    uid: read_u32_both(payload, 16),
                    gid: read_u32_both(payload, 24),
                    inode: (payload.len() >= 40).then(|| read_u32_both(payload, 32)),
                })
            } else {
                opaque()
            }
        }
        b"PN" => {
            if payload.len() >= 16 {
                SuspEntry::DeviceNumber {
                    major: read_u32_both(payload, 0),
                    minor: read_u32_both(payload, 8),
                }
            } else {
                opaque()
            }
        }
        b"NM" => {
            if payload.is_empty() {
                opaque()
            } else {
                SuspEntry::AlternateName {
                    flags: payload[0],
                    fragment: String::from_utf8_lossy(&payload[1..]).into_owned(),
                }
            }
        }
        b"SL" => {
            if payload.is_empty() {
                return opaque();
            }
            let mut components = Vec::new();
            let mut pos = 1;
            while pos + 2 <= payload.len() {
                let flags = payload[pos];
                let text_length = payload[pos + 1] as usize;
                if pos + 2 + text_length > payload.len() {
                    break;
                }
                components.push(SlComponent {
                    flags,
                    text: String::from_utf8_lossy(&payload[pos + 2..pos + 2 + text_length])
                        .into_owned(),
                });
                pos += 2 + text_length;
            }
            SuspEntry::SymbolicLink {
                flags: payload[0],
                components,
            }
        }
        b"TF" => parse_timestamps(payload).map_or_else(opaque, SuspEntry::Timestamps),
        b"CL" => {
            if payload.len() >= 8 {
                SuspEntry::ChildLink {
                    lba: read_u32_both(payload, 0),
                }
            } else {
                opaque()
            }
        }
        b"PL" => {
            if payload.len() >= 8 {
                SuspEntry::ParentLink {
                    lba: read_u32_both(payload, 0),
                }
            } else {
                opaque()
            }
        }
        b"RE" => SuspEntry::Relocated,
        b"ST" => SuspEntry::Terminator,
        _ => {
            log::trace!(
                "unknown system-use entry {:?} v{version}, preserving opaquely",
                tag.map(|b| b as char)
            );
            opaque()
        }
    }
}

fn parse_timestamps(payload: &[u8]) -> Option<Timestamps> {
    let (&flags, mut rest) = payload.split_first()?;
    let long_form = flags & TF_LONG_FORM != 0;
    let width = if long_form { 17 } else { 7 };

    let mut take = |wanted: bool| -> Option<OffsetDateTime> {
        if !wanted || rest.len() < width {
            return None;
        }
        let (stamp, tail) = rest.split_at(width);
        rest = tail;
        Some(if long_form {
            let mut buf = [0u8; 17];
            buf.copy_from_slice(stamp);
            codec::decode_volume_time(&buf)
        } else {
            let mut buf = [0u8; 7];
            buf.copy_from_slice(stamp);
            codec::decode_record_time(&buf)
        })
    };

    // Stamps past the access time (attributes onward) are not retained.
    let creation = take(flags & TF_CREATION != 0);
    let modify = take(flags & TF_MODIFY != 0);
    let access = take(flags & TF_ACCESS != 0);

    Some(Timestamps {
        creation,
        modify,
        access,
    })
}

#[cfg(test)]
#[path = "tests/susp_tests.rs"]
mod tests;
