//! Read-only stream views over file extents.

use std::io::{self, Read, Seek, SeekFrom};

use discview_core::{FsError, ReadSeek};

use crate::context::{IsoContext, StreamHandle};
use crate::directory::IsoDirEntry;

/// A seekable, read-only view of one file's content.
///
/// The view is sparse: nothing is buffered beyond the bytes asked for, and
/// multi-extent files read as a single logical stream of their concatenated
/// extents.
#[derive(Debug)]
pub struct ExtentReader<R> {
    stream: StreamHandle<R>,
    /// `(image byte offset, byte length)` per extent, in disc order.
    extents: Vec<(u64, u64)>,
    length: u64,
    position: u64,
}

impl<R: ReadSeek> ExtentReader<R> {
    pub(crate) fn new(ctx: &IsoContext<R>, entry: &IsoDirEntry) -> Self {
        let extents: Vec<(u64, u64)> = entry
            .records()
            .iter()
            .map(|r| (ctx.block_position(r.extent_lba), u64::from(r.data_length)))
            .collect();
        let length = extents.iter().map(|&(_, len)| len).sum();
        Self {
            stream: ctx.stream.clone(),
            extents,
            length,
            position: 0,
        }
    }

    /// Total length of the view in bytes.
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl<R: ReadSeek> Read for ExtentReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.position >= self.length {
            return Ok(0);
        }
        let mut skipped = 0u64;
        for &(start, extent_length) in &self.extents {
            if self.position < skipped + extent_length {
                let within = self.position - skipped;
                let available = extent_length - within;
                let count = buf
                    .len()
                    .min(usize::try_from(available).unwrap_or(usize::MAX));
                self.stream
                    .read_exact_at(start + within, &mut buf[..count])
                    .map_err(into_io_error)?;
                self.position += count as u64;
                return Ok(count);
            }
            skipped += extent_length;
        }
        Ok(0)
    }
}

impl<R: ReadSeek> Seek for ExtentReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.position) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(self.length) + i128::from(delta),
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of file view",
            ));
        }
        self.position = u64::try_from(target)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "seek offset overflow"))?;
        Ok(self.position)
    }
}

fn into_io_error(err: FsError) -> io::Error {
    match err {
        FsError::Io(inner) => inner,
        other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
    }
}
