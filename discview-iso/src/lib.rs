//! Read-only ISO 9660 filesystem reader.
//!
//! Reads ECMA-119 disc images, including the Joliet supplementary hierarchy
//! and SUSP/Rock Ridge extensions, from any seekable byte stream, and
//! exposes a filesystem view plus the physical sector layout of each file.
//!
//! # Usage
//!
//! ```no_run
//! use std::fs::File;
//! use discview_core::ReadOnlyFileSystem;
//! use discview_iso::IsoFileSystem;
//!
//! # fn main() -> Result<(), discview_core::FsError> {
//! let image = File::open("disc.iso")?;
//! let fs = IsoFileSystem::open(image)?;
//!
//! for name in fs.files("\\", None, false)? {
//!     println!("{name}");
//! }
//! let clusters = fs.path_to_clusters("\\README.TXT")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Variants
//!
//! At open time the reader scans the descriptor set and picks the richest
//! interpretation it can: Joliet when a supplementary descriptor announces a
//! UCS-2 hierarchy, Rock Ridge when the primary root carries SUSP with a
//! Rock Ridge registration, plain ISO 9660 otherwise.

pub mod codec;
pub mod context;
pub mod directory;
pub mod file;
pub mod filesystem;
pub mod reader;
pub mod record;
pub mod susp;
pub mod volume;

pub use codec::IsoEncoding;
pub use context::IsoVariant;
pub use directory::{IsoDirEntry, IsoDirectory};
pub use file::ExtentReader;
pub use filesystem::{ClusterRange, EntryInfo, IsoFileSystem};
pub use reader::detect;
pub use record::{DirectoryRecord, FileFlags};
pub use susp::{PosixAttributes, SuspEntry};
pub use volume::{VolumeDescriptor, VolumeDescriptorKind};
