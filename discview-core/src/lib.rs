//! Core plumbing shared by the discview filesystem readers.
//!
//! This crate carries everything that is not specific to one on-disc format:
//! the [`ReadSeek`] stream trait, the common error type, deterministic path
//! handling for the Windows-style paths the readers expose, the generic
//! virtual-filesystem traversal core, and the read-only filesystem contract.

use std::io::{Read, Seek};

pub mod error;
pub mod fs;
pub mod path;
pub mod vfs;

pub use error::FsError;
pub use fs::{FileAccess, FileMode, ReadOnlyFileSystem};
pub use path::WildcardPattern;
pub use vfs::{EntryFilter, VfsContext, VfsDirectory, VfsEntry};

/// A reader that implements both Read and Seek.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}
