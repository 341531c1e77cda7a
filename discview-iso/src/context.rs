//! Immutable reader context and the shared stream handle.

use std::cell::RefCell;
use std::io::SeekFrom;
use std::rc::Rc;

use discview_core::{FsError, ReadSeek};

use crate::codec::IsoEncoding;
use crate::susp::SuspSettings;
use crate::volume::VolumeDescriptor;

/// Which interpretation of the descriptor set the reader selected at open
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoVariant {
    /// Plain ISO 9660 identifiers from the primary descriptor.
    Iso9660,
    /// UCS-2 identifiers from a Joliet supplementary descriptor.
    Joliet,
    /// Primary descriptor with SUSP/Rock Ridge name and attribute overrides.
    RockRidge,
}

/// Shared handle over the caller's byte stream.
///
/// All positioning happens here; the handle is cloned into every object that
/// needs disc access, which keeps the single-threaded discipline local. The
/// stream length is captured once at construction for bounds checks.
#[derive(Debug)]
pub(crate) struct StreamHandle<R> {
    inner: Rc<RefCell<R>>,
    length: u64,
}

impl<R> Clone for StreamHandle<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            length: self.length,
        }
    }
}

impl<R: ReadSeek> StreamHandle<R> {
    pub fn new(mut stream: R) -> Result<Self, FsError> {
        let length = stream.seek(SeekFrom::End(0))?;
        Ok(Self {
            inner: Rc::new(RefCell::new(stream)),
            length,
        })
    }

    /// Total stream length in bytes.
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Read exactly `buf.len()` bytes at `position`, failing with
    /// [`FsError::CorruptedImage`] when the range extends past the stream.
    pub fn read_exact_at(&self, position: u64, buf: &mut [u8]) -> Result<(), FsError> {
        if position + buf.len() as u64 > self.length {
            return Err(FsError::corrupted(format!(
                "read of {} bytes at offset {position} extends past the image end ({})",
                buf.len(),
                self.length
            )));
        }
        let mut stream = self.inner.borrow_mut();
        stream.seek(SeekFrom::Start(position))?;
        stream.read_exact(buf)?;
        Ok(())
    }

    /// Read up to `buf.len()` bytes at `position`; short reads at the stream
    /// end are reported through the returned count.
    pub fn read_at(&self, position: u64, buf: &mut [u8]) -> Result<usize, FsError> {
        if position >= self.length {
            return Ok(0);
        }
        let available = usize::try_from(self.length - position)
            .unwrap_or(usize::MAX)
            .min(buf.len());
        let mut stream = self.inner.borrow_mut();
        stream.seek(SeekFrom::Start(position))?;
        stream.read_exact(&mut buf[..available])?;
        Ok(available)
    }
}

/// Everything fixed at open time: the chosen descriptor, the stream, the
/// identifier encoding, and the SUSP state discovered on the root record.
#[derive(Debug)]
pub(crate) struct IsoContext<R> {
    pub stream: StreamHandle<R>,
    pub volume: VolumeDescriptor,
    pub encoding: IsoEncoding,
    pub variant: IsoVariant,
    pub susp: SuspSettings,
}

impl<R: ReadSeek> IsoContext<R> {
    pub fn block_size(&self) -> u64 {
        u64::from(self.volume.logical_block_size)
    }

    /// Byte offset of a logical block.
    pub fn block_position(&self, lba: u32) -> u64 {
        u64::from(lba) * self.block_size()
    }

    /// Read `length` bytes of an extent starting at `lba`, bounds-checked
    /// against the stream before anything is allocated.
    pub fn read_extent(&self, lba: u32, length: u32) -> Result<Vec<u8>, FsError> {
        let position = self.block_position(lba);
        if position + u64::from(length) > self.stream.len() {
            return Err(FsError::corrupted(format!(
                "extent at block {lba} ({length} bytes) extends past the image end"
            )));
        }
        let mut data = vec![0u8; length as usize];
        self.stream.read_exact_at(position, &mut data)?;
        Ok(data)
    }
}
