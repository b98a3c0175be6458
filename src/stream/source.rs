use crate::{Result, io_error};
use std::io::{Read, Seek, SeekFrom};

/// An offset-addressed byte source feeding a [`StreamReader`].
///
/// Reads are positioned by absolute offset, so a source has no cursor of its
/// own to restore after out-of-band reads.
///
/// [`StreamReader`]: crate::stream::StreamReader
pub trait ByteSource {
    /// Reads up to `buf.len()` bytes starting at `offset` into `buf`.
    /// Returns the number of bytes read; `0` means end of source.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Total length of the source in bytes, if known.
    fn len(&mut self) -> Option<u64>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        (**self).read_at(offset, buf)
    }

    fn len(&mut self) -> Option<u64> {
        (**self).len()
    }
}

impl ByteSource for &[u8] {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let total = <[u8]>::len(self);
        if offset >= total as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(total - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }

    fn len(&mut self) -> Option<u64> {
        Some(<[u8]>::len(self) as u64)
    }
}

impl ByteSource for Vec<u8> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.as_slice().read_at(offset, buf)
    }

    fn len(&mut self) -> Option<u64> {
        Some(Vec::len(self) as u64)
    }
}

/// Adapts any seekable [`Read`] (files, cursors) into a [`ByteSource`].
pub struct IoSource<R: Read + Seek> {
    inner: R,
}

impl<R: Read + Seek> IoSource<R> {
    /// Wraps a seekable reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ByteSource for IoSource<R> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| io_error(format!("seek to {offset} failed: {e}")))?;
        self.inner
            .read(buf)
            .map_err(|e| io_error(format!("read at {offset} failed: {e}")))
    }

    fn len(&mut self) -> Option<u64> {
        self.inner.seek(SeekFrom::End(0)).ok()
    }
}

impl ByteSource for std::fs::File {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.seek(SeekFrom::Start(offset))
            .map_err(|e| io_error(format!("seek to {offset} failed: {e}")))?;
        self.read(buf)
            .map_err(|e| io_error(format!("read at {offset} failed: {e}")))
    }

    fn len(&mut self) -> Option<u64> {
        self.metadata().ok().map(|m| m.len())
    }
}
