//! Directory materialisation and the entry handles it produces.

use discview_core::vfs::{VfsDirectory, VfsEntry};
use discview_core::{FsError, ReadSeek, path};
use time::OffsetDateTime;

use crate::context::IsoContext;
use crate::record::{self, DirectoryRecord, FileFlags};
use crate::susp::{self, PosixAttributes};

/// One named entry of a materialised directory.
///
/// Multi-extent files carry every directory record that contributes to them,
/// in disc order; everything else carries exactly one.
#[derive(Debug, Clone)]
pub struct IsoDirEntry {
    name: String,
    search_name: String,
    records: Vec<DirectoryRecord>,
    is_directory: bool,
    is_symlink: bool,
    symlink_target: Option<String>,
    timestamp: OffsetDateTime,
    attributes: Option<PosixAttributes>,
    cache_id: u64,
}

impl IsoDirEntry {
    /// The directory records backing this entry, in disc order.
    pub fn records(&self) -> &[DirectoryRecord] {
        &self.records
    }

    /// Total data length across all extents.
    pub fn data_length(&self) -> u64 {
        self.records.iter().map(|r| u64::from(r.data_length)).sum()
    }

    /// Logical block of the first extent.
    pub fn first_extent_lba(&self) -> u32 {
        self.records[0].extent_lba
    }

    /// The effective timestamp (Rock Ridge `TF` when present, else the
    /// record's recording time).
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// POSIX attributes from a Rock Ridge `PX` entry.
    pub fn posix_attributes(&self) -> Option<&PosixAttributes> {
        self.attributes.as_ref()
    }
}

impl VfsEntry for IsoDirEntry {
    fn file_name(&self) -> &str {
        &self.name
    }

    fn search_name(&self) -> &str {
        &self.search_name
    }

    fn is_directory(&self) -> bool {
        self.is_directory
    }

    fn is_symlink(&self) -> bool {
        self.is_symlink
    }

    fn symlink_target(&self) -> Option<&str> {
        self.symlink_target.as_deref()
    }

    fn unique_cache_id(&self) -> u64 {
        self.cache_id
    }
}

/// A directory materialised from its extent.
#[derive(Debug)]
pub struct IsoDirectory {
    entries: Vec<IsoDirEntry>,
}

impl VfsDirectory for IsoDirectory {
    type Entry = IsoDirEntry;

    fn entries(&self) -> &[IsoDirEntry] {
        &self.entries
    }
}

impl IsoDirectory {
    /// Read a directory's extent and decode its records.
    ///
    /// Records are yielded in disc order; the self and parent entries are
    /// dropped, Rock Ridge overrides are applied when the context selected
    /// them, and records flagged as non-final extents are grouped with their
    /// same-named successors.
    pub(crate) fn read<R: ReadSeek>(
        ctx: &IsoContext<R>,
        record: &DirectoryRecord,
    ) -> Result<Self, FsError> {
        let raw = ctx.read_extent(record.extent_lba, record.data_length)?;
        let block = ctx.block_size() as usize;

        let mut entries: Vec<IsoDirEntry> = Vec::new();
        let mut ordinal: u64 = 0;
        let mut pos = 0usize;
        while pos < raw.len() {
            if raw[pos] == 0 {
                // Zero length byte: sector padding, skip to the next block.
                pos = (pos / block + 1) * block;
                continue;
            }
            let Some((decoded, consumed)) = DirectoryRecord::read(&raw, pos, ctx.encoding)?
            else {
                break;
            };
            if pos % block + consumed > block {
                return Err(FsError::corrupted(
                    "directory record crosses a logical block boundary",
                ));
            }
            pos += consumed;

            if decoded.is_self() || decoded.is_parent() {
                continue;
            }
            if let Some(entry) = Self::build_entry(ctx, decoded, &mut entries, &mut ordinal)? {
                entries.push(entry);
            }
        }
        Ok(Self { entries })
    }

    fn build_entry<R: ReadSeek>(
        ctx: &IsoContext<R>,
        mut decoded: DirectoryRecord,
        entries: &mut Vec<IsoDirEntry>,
        ordinal: &mut u64,
    ) -> Result<Option<IsoDirEntry>, FsError> {
        let mut name_override = None;
        let mut is_symlink = false;
        let mut symlink_target = None;
        let mut timestamp = decoded.recording_time;
        let mut attributes = None;

        if ctx.susp.rock_ridge() && !decoded.system_use.is_empty() {
            let susp_entries = susp::walk_system_use(
                &ctx.stream,
                ctx.block_size(),
                &decoded.system_use,
                ctx.susp.skip_bytes,
            )?;
            let overrides = susp::collect_overrides(&susp_entries);
            if overrides.relocated {
                // Placeholder location of a relocated directory; the real
                // entry is reached through its parent's CL.
                return Ok(None);
            }
            if let Some(child) = overrides.child_link {
                decoded.extent_lba = child;
            }
            if let Some(px) = &overrides.attributes {
                is_symlink = px.is_symlink();
            }
            attributes = overrides.attributes;
            symlink_target = overrides.symlink_target;
            if let Some(stamp) = overrides.timestamp {
                timestamp = stamp;
            }
            name_override = overrides.name;
        }

        let name = match name_override {
            Some(alternate) => alternate,
            None => record::format_file_name(&decoded.file_identifier).to_string(),
        };
        let is_directory = decoded.is_directory() && !is_symlink;

        // Non-final extents group with the same-named record that follows.
        if let Some(last) = entries.last_mut()
            && last.name.eq_ignore_ascii_case(&name)
            && last
                .records
                .last()
                .is_some_and(|r| r.flags.contains(FileFlags::MULTI_EXTENT))
        {
            last.records.push(decoded);
            return Ok(None);
        }

        let cache_id = (u64::from(decoded.extent_lba) << 16) | (*ordinal & 0xFFFF);
        *ordinal += 1;
        Ok(Some(IsoDirEntry {
            search_name: path::search_name(&name),
            name,
            records: vec![decoded],
            is_directory,
            is_symlink,
            symlink_target,
            timestamp,
            attributes,
            cache_id,
        }))
    }
}

#[cfg(test)]
#[path = "tests/directory_tests.rs"]
mod tests;
