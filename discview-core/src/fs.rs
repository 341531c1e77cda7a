//! The read-only filesystem contract implemented by the format readers.

use std::io::{Read, Seek};

use crate::error::FsError;
use crate::path;

/// How an existing or new file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Open an existing file.
    Open,
    /// Open an existing file or create it.
    OpenOrCreate,
    /// Create a file, replacing any existing one.
    Create,
    /// Create a file, failing if one exists.
    CreateNew,
    /// Open an existing file and truncate it.
    Truncate,
    /// Open an existing file positioned at its end.
    Append,
}

/// Requested access to an opened file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAccess {
    Read,
    Write,
    ReadWrite,
}

/// Query surface of a read-only filesystem.
///
/// Paths are `\`-separated and rooted at the empty string or `\`; name
/// matching is case-insensitive. Every mutating mode or access fails with
/// [`FsError::ReadOnly`].
pub trait ReadOnlyFileSystem {
    /// The stream type returned by [`open_file`](Self::open_file).
    type File: Read + Seek;

    /// Readers own a shared stream position and are not reentrant.
    fn is_thread_safe(&self) -> bool {
        false
    }

    /// The root path.
    fn root_path(&self) -> &str {
        path::ROOT
    }

    fn directory_exists(&self, p: &str) -> Result<bool, FsError>;

    fn file_exists(&self, p: &str) -> Result<bool, FsError>;

    fn exists(&self, p: &str) -> Result<bool, FsError> {
        Ok(self.directory_exists(p)? || self.file_exists(p)?)
    }

    /// Directories under `p`, optionally wildcard-filtered and recursive.
    fn directories(
        &self,
        p: &str,
        pattern: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<String>, FsError>;

    /// Files under `p`, optionally wildcard-filtered and recursive.
    fn files(
        &self,
        p: &str,
        pattern: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<String>, FsError>;

    /// All entries under `p`, optionally wildcard-filtered and recursive.
    fn entries(
        &self,
        p: &str,
        pattern: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<String>, FsError>;

    /// Open a file for reading.
    fn open_file(&self, p: &str) -> Result<Self::File, FsError> {
        self.open_file_with(p, FileMode::Open, FileAccess::Read)
    }

    /// Open a file with explicit mode and access; anything other than
    /// `(Open, Read)` fails with [`FsError::ReadOnly`].
    fn open_file_with(
        &self,
        p: &str,
        mode: FileMode,
        access: FileAccess,
    ) -> Result<Self::File, FsError>;

    /// Length in bytes of the file at `p`.
    fn file_length(&self, p: &str) -> Result<u64, FsError>;
}
