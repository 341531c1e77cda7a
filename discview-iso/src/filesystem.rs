//! The read-only ISO 9660 filesystem.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use discview_core::vfs::{self, EntryFilter, VfsContext, VfsEntry};
use discview_core::{FileAccess, FileMode, FsError, ReadOnlyFileSystem, ReadSeek, path};
use time::OffsetDateTime;

use crate::context::{IsoContext, IsoVariant, StreamHandle};
use crate::directory::{IsoDirEntry, IsoDirectory};
use crate::file::ExtentReader;
use crate::reader;
use crate::volume::VolumeDescriptor;

/// One run of logical blocks backing a file or directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterRange {
    /// First logical block of the run.
    pub lba: u32,
    /// Number of logical blocks.
    pub sectors: u64,
}

/// Metadata for a single path.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub name: String,
    /// Total data length in bytes (all extents).
    pub length: u64,
    pub is_directory: bool,
    pub is_symlink: bool,
    /// The effective timestamp (Rock Ridge `TF` when present).
    pub timestamp: OffsetDateTime,
}

/// A read-only view over an ISO 9660 / Joliet / Rock Ridge image.
///
/// The reader owns the caller-supplied stream for its lifetime and shares a
/// single stream position across every operation; it is deliberately
/// single-threaded (`Rc` innards make it `!Send`/`!Sync`). Directories are
/// materialised lazily and memoised by their entry cache id.
#[derive(Debug)]
pub struct IsoFileSystem<R: ReadSeek> {
    ctx: Rc<IsoContext<R>>,
    root: Rc<IsoDirectory>,
    cache: RefCell<HashMap<u64, Rc<IsoDirectory>>>,
}

impl<R: ReadSeek> IsoFileSystem<R> {
    /// Open an image: scan the descriptor set from sector 16, select the
    /// richest supported variant, and materialise the root directory.
    pub fn open(stream: R) -> Result<Self, FsError> {
        let stream = StreamHandle::new(stream)?;
        let scan = reader::scan_descriptors(&stream)?;
        let (volume, variant, susp) = reader::select_variant(&stream, &scan)?;
        let encoding = volume.encoding;
        let ctx = Rc::new(IsoContext {
            stream,
            volume,
            encoding,
            variant,
            susp,
        });
        let root = Rc::new(IsoDirectory::read(&ctx, &ctx.volume.root_record)?);
        Ok(Self {
            ctx,
            root,
            cache: RefCell::new(HashMap::new()),
        })
    }

    /// Check a stream for an ISO 9660 descriptor without building a reader.
    pub fn detect(stream: &mut R) -> Result<bool, FsError> {
        reader::detect(stream)
    }

    /// The hierarchy interpretation chosen at open time.
    pub fn variant(&self) -> IsoVariant {
        self.ctx.variant
    }

    /// The active volume descriptor with all of its decoded fields.
    pub fn volume_descriptor(&self) -> &VolumeDescriptor {
        &self.ctx.volume
    }

    pub fn volume_identifier(&self) -> &str {
        &self.ctx.volume.volume_identifier
    }

    /// Size of the volume in logical blocks.
    pub fn volume_space_size(&self) -> u32 {
        self.ctx.volume.volume_space_size
    }

    pub fn logical_block_size(&self) -> u16 {
        self.ctx.volume.logical_block_size
    }

    /// Volume creation time from the active descriptor.
    pub fn creation_time(&self) -> OffsetDateTime {
        self.ctx.volume.creation_time
    }

    /// Whether the sharing protocol was detected on the primary root.
    pub fn susp_detected(&self) -> bool {
        self.ctx.susp.detected
    }

    /// Extension identifiers registered through SUSP `ER` entries.
    pub fn susp_extensions(&self) -> &[String] {
        &self.ctx.susp.extensions
    }

    /// The Rock Ridge identifier in effect, when one was found.
    pub fn rock_ridge_identifier(&self) -> Option<&str> {
        self.ctx.susp.rock_ridge_identifier.as_deref()
    }

    /// Metadata for a path (the root included).
    pub fn entry_info(&self, p: &str) -> Result<EntryInfo, FsError> {
        let normalized = path::normalize(p);
        if path::is_root(&normalized) {
            let root = &self.ctx.volume.root_record;
            return Ok(EntryInfo {
                name: String::new(),
                length: u64::from(root.data_length),
                is_directory: true,
                is_symlink: false,
                timestamp: root.recording_time,
            });
        }
        let entry = self.resolve_required(&normalized)?;
        Ok(EntryInfo {
            name: entry.file_name().to_string(),
            length: entry.data_length(),
            is_directory: entry.is_directory(),
            is_symlink: entry.is_symlink(),
            timestamp: entry.timestamp(),
        })
    }

    /// Map a path to the runs of logical blocks backing it.
    ///
    /// Directories yield a single run; files yield one run per directory
    /// record, in disc order. Interleaved extents are not supported.
    pub fn path_to_clusters(&self, p: &str) -> Result<Vec<ClusterRange>, FsError> {
        let block_size = self.ctx.block_size();
        let normalized = path::normalize(p);
        if path::is_root(&normalized) {
            let root = &self.ctx.volume.root_record;
            return Ok(vec![ClusterRange {
                lba: root.extent_lba,
                sectors: root.block_count(block_size),
            }]);
        }

        let entry = self.resolve_required(&normalized)?;
        if entry.is_directory() {
            let record = &entry.records()[0];
            if record.is_interleaved() {
                return Err(FsError::unsupported(format!(
                    "interleaved directory extent: {normalized}"
                )));
            }
            return Ok(vec![ClusterRange {
                lba: record.extent_lba,
                sectors: record.block_count(block_size),
            }]);
        }
        Ok(entry
            .records()
            .iter()
            .map(|record| ClusterRange {
                lba: record.extent_lba,
                sectors: record.block_count(block_size),
            })
            .collect())
    }

    fn resolve(&self, p: &str) -> Result<Option<IsoDirEntry>, FsError> {
        vfs::resolve_entry(self, p)
    }

    fn resolve_required(&self, p: &str) -> Result<IsoDirEntry, FsError> {
        self.resolve(p)?
            .ok_or_else(|| FsError::file_not_found(p.to_string()))
    }
}

impl<R: ReadSeek> VfsContext for IsoFileSystem<R> {
    type Entry = IsoDirEntry;
    type Directory = IsoDirectory;

    fn root_directory(&self) -> Result<Rc<IsoDirectory>, FsError> {
        Ok(Rc::clone(&self.root))
    }

    fn open_directory(&self, entry: &IsoDirEntry) -> Result<Rc<IsoDirectory>, FsError> {
        if let Some(cached) = self.cache.borrow().get(&entry.unique_cache_id()) {
            return Ok(Rc::clone(cached));
        }
        let directory = Rc::new(IsoDirectory::read(&self.ctx, &entry.records()[0])?);
        self.cache
            .borrow_mut()
            .insert(entry.unique_cache_id(), Rc::clone(&directory));
        Ok(directory)
    }
}

impl<R: ReadSeek> ReadOnlyFileSystem for IsoFileSystem<R> {
    type File = ExtentReader<R>;

    fn directory_exists(&self, p: &str) -> Result<bool, FsError> {
        if path::is_root(p) {
            return Ok(true);
        }
        match self.resolve(p) {
            Ok(entry) => Ok(entry.is_some_and(|e| e.is_directory())),
            Err(FsError::NotADirectory(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }

    fn file_exists(&self, p: &str) -> Result<bool, FsError> {
        match self.resolve(p) {
            Ok(entry) => Ok(entry.is_some_and(|e| !e.is_directory())),
            Err(FsError::NotADirectory(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }

    fn directories(
        &self,
        p: &str,
        pattern: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<String>, FsError> {
        vfs::enumerate(self, p, pattern, recursive, EntryFilter::Directories)
    }

    fn files(
        &self,
        p: &str,
        pattern: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<String>, FsError> {
        vfs::enumerate(self, p, pattern, recursive, EntryFilter::Files)
    }

    fn entries(
        &self,
        p: &str,
        pattern: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<String>, FsError> {
        vfs::enumerate(self, p, pattern, recursive, EntryFilter::All)
    }

    fn open_file_with(
        &self,
        p: &str,
        mode: FileMode,
        access: FileAccess,
    ) -> Result<ExtentReader<R>, FsError> {
        if mode != FileMode::Open {
            return Err(FsError::read_only(format!(
                "cannot open {p} with mode {mode:?}"
            )));
        }
        if access != FileAccess::Read {
            return Err(FsError::read_only(format!(
                "cannot open {p} with access {access:?}"
            )));
        }
        let normalized = path::normalize(p);
        let entry = self.resolve_required(&normalized)?;
        if entry.is_directory() {
            return Err(FsError::is_a_directory(normalized));
        }
        Ok(ExtentReader::new(&self.ctx, &entry))
    }

    fn file_length(&self, p: &str) -> Result<u64, FsError> {
        let normalized = path::normalize(p);
        let entry = self.resolve_required(&normalized)?;
        if entry.is_directory() {
            return Err(FsError::is_a_directory(normalized));
        }
        Ok(entry.data_length())
    }
}

#[cfg(test)]
#[path = "tests/filesystem_tests.rs"]
mod tests;
