//! Buffered endian-aware stream reading.
//!
//! [`StreamReader`] buffers an offset-addressed byte source to minimize
//! underlying I/O calls while supporting read-and-advance and
//! peek-without-advance semantics in either byte order. Struct reads route
//! through the struct codec; types whose fields need byte swapping opt in
//! via [`SwapEndian`].

mod endian;
mod source;

pub use endian::{Endian, Scalar, SwapEndian};
pub use source::{ByteSource, IoSource};

use crate::{
    Result, argument_error,
    codec::{self, Blittable, Marshalled},
    end_error,
};
use std::io::SeekFrom;

/// Default internal buffer capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 65536;

/// A buffering reader over an offset-addressed byte source.
///
/// The reader's logical position is `buf_start + pos`; the invariant
/// `pos <= valid <= capacity` always holds. Reads that exceed the buffered
/// remainder slide the unread tail to the front of the buffer and top up
/// from the source; reads larger than the whole buffer bypass it. Every
/// capacity from one byte upward produces identical results.
///
/// Running out of data is reported as [`Error::End`](crate::Error), never a
/// zero fill; source failures propagate unchanged.
pub struct StreamReader<S: ByteSource> {
    source: S,
    buf: Box<[u8]>,
    /// Offset of `buf[0]` within the source.
    buf_start: u64,
    /// Bytes of `buf` holding source data.
    valid: usize,
    /// Read position within `buf`.
    pos: usize,
    endian: Endian,
}

impl<S: ByteSource> StreamReader<S> {
    /// Creates a little-endian reader with the default buffer capacity.
    pub fn new(source: S) -> Self {
        Self::with_capacity(source, DEFAULT_CAPACITY)
    }

    /// Creates a reader with an explicit buffer capacity (at least one byte).
    pub fn with_capacity(source: S, capacity: usize) -> Self {
        Self {
            source,
            buf: vec![0u8; capacity.max(1)].into_boxed_slice(),
            buf_start: 0,
            valid: 0,
            pos: 0,
            endian: Endian::Little,
        }
    }

    /// Sets the byte order used by [`read`](Self::read) and
    /// [`peek`](Self::peek).
    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// The configured byte order.
    #[inline]
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// The logical position within the source.
    #[inline]
    pub fn position(&self) -> u64 {
        self.buf_start + self.pos as u64
    }

    /// Total length of the source, if known.
    pub fn len(&mut self) -> Option<u64> {
        self.source.len()
    }

    /// Consumes the reader, returning the source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// True iff `size` bytes can be read without touching the source —
    /// used by callers doing optimistic bulk parsing.
    #[inline]
    pub fn can_read(&self, size: usize) -> bool {
        self.buffered() >= size
    }

    #[inline]
    fn buffered(&self) -> usize {
        self.valid - self.pos
    }

    /// Slides the unread tail to the buffer start, then tops up from the
    /// source until the buffer is full or the source is exhausted.
    fn refill(&mut self) -> Result<()> {
        self.buf.copy_within(self.pos..self.valid, 0);
        self.buf_start += self.pos as u64;
        self.valid -= self.pos;
        self.pos = 0;
        while self.valid < self.buf.len() {
            let offset = self.buf_start + self.valid as u64;
            let n = self.source.read_at(offset, &mut self.buf[self.valid..])?;
            if n == 0 {
                break;
            }
            self.valid += n;
        }
        #[cfg(feature = "log")]
        log::trace!(
            "refilled stream buffer: start={} valid={}",
            self.buf_start,
            self.valid
        );
        Ok(())
    }

    /// Makes at least `size` unread bytes available in the buffer.
    /// `size` must not exceed the buffer capacity.
    fn ensure(&mut self, size: usize) -> Result<()> {
        debug_assert!(size <= self.buf.len());
        if self.buffered() >= size {
            return Ok(());
        }
        self.refill()?;
        if self.buffered() < size {
            return Err(end_error(format!(
                "needed {} bytes at offset {}, only {} available",
                size,
                self.position(),
                self.buffered()
            )));
        }
        Ok(())
    }

    /// Reads exactly `out.len()` bytes, advancing the position. Spans larger
    /// than the buffer capacity are read straight from the source.
    pub fn read_into(&mut self, out: &mut [u8]) -> Result<()> {
        let mut copied = self.buffered().min(out.len());
        out[..copied].copy_from_slice(&self.buf[self.pos..self.pos + copied]);
        self.pos += copied;
        while copied < out.len() {
            let remaining = out.len() - copied;
            if remaining >= self.buf.len() {
                let n = self.source.read_at(self.position(), &mut out[copied..])?;
                if n == 0 {
                    return Err(end_error(format!(
                        "needed {} more bytes at offset {}",
                        remaining,
                        self.position()
                    )));
                }
                self.buf_start = self.position() + n as u64;
                self.pos = 0;
                self.valid = 0;
                copied += n;
            } else {
                self.ensure(1)?;
                let take = self.buffered().min(remaining);
                out[copied..copied + take]
                    .copy_from_slice(&self.buf[self.pos..self.pos + take]);
                self.pos += take;
                copied += take;
            }
        }
        Ok(())
    }

    /// Reads a blittable struct in its in-memory byte order.
    pub fn read_struct<T: Blittable>(&mut self) -> Result<T> {
        let size = size_of::<T>();
        if size <= self.buf.len() {
            self.ensure(size)?;
            let value = codec::from_bytes(&self.buf[self.pos..self.pos + size])?;
            self.pos += size;
            Ok(value)
        } else {
            let mut tmp = vec![0u8; size];
            self.read_into(&mut tmp)?;
            codec::from_bytes(&tmp)
        }
    }

    /// Reads a blittable struct without advancing the position.
    pub fn peek_struct<T: Blittable>(&mut self) -> Result<T> {
        let size = size_of::<T>();
        if size <= self.buf.len() {
            self.ensure(size)?;
            codec::from_bytes(&self.buf[self.pos..self.pos + size])
        } else {
            let bytes = self.read_bytes(self.position(), size)?;
            codec::from_bytes(&bytes)
        }
    }

    /// Reads a primitive in the reader's configured byte order.
    pub fn read<T: Scalar>(&mut self) -> Result<T> {
        let value = self.read_struct::<T>()?;
        Ok(self.convert(value, self.endian))
    }

    /// Reads a primitive in the configured byte order without advancing.
    pub fn peek<T: Scalar>(&mut self) -> Result<T> {
        let value = self.peek_struct::<T>()?;
        Ok(self.convert(value, self.endian))
    }

    /// Reads a little-endian primitive regardless of the configured order.
    pub fn read_le<T: Scalar>(&mut self) -> Result<T> {
        let value = self.read_struct::<T>()?;
        Ok(self.convert(value, Endian::Little))
    }

    /// Reads a big-endian primitive regardless of the configured order.
    pub fn read_be<T: Scalar>(&mut self) -> Result<T> {
        let value = self.read_struct::<T>()?;
        Ok(self.convert(value, Endian::Big))
    }

    /// Peeks a little-endian primitive regardless of the configured order.
    pub fn peek_le<T: Scalar>(&mut self) -> Result<T> {
        let value = self.peek_struct::<T>()?;
        Ok(self.convert(value, Endian::Little))
    }

    /// Peeks a big-endian primitive regardless of the configured order.
    pub fn peek_be<T: Scalar>(&mut self) -> Result<T> {
        let value = self.peek_struct::<T>()?;
        Ok(self.convert(value, Endian::Big))
    }

    #[inline]
    fn convert<T: Scalar>(&self, value: T, order: Endian) -> T {
        if order != Endian::host() {
            value.swap_bytes()
        } else {
            value
        }
    }

    /// Reads a struct and reverses its multi-byte fields when the configured
    /// order differs from the host order. The type declares which fields
    /// swap; the reader never guesses field layout.
    pub fn read_swapped<T: Blittable + SwapEndian>(&mut self) -> Result<T> {
        let mut value = self.read_struct::<T>()?;
        if self.endian != Endian::host() {
            value.swap_endian();
        }
        Ok(value)
    }

    /// Reads a struct through the marshalled codec path, consuming its wire
    /// size from the stream.
    pub fn read_marshalled<T: Marshalled>(&mut self) -> Result<T> {
        let mut tmp = vec![0u8; codec::marshalled_size_of::<T>()];
        self.read_into(&mut tmp)?;
        codec::unmarshal(&tmp)
    }

    /// Reads `len` bytes and decodes them as UTF-8.
    pub fn read_string_utf8(&mut self, len: usize) -> Result<String> {
        let mut tmp = vec![0u8; len];
        self.read_into(&mut tmp)?;
        String::from_utf8(tmp).map_err(|e| argument_error(format!("invalid UTF-8: {e}")))
    }

    /// An out-of-band read of `count` bytes at an absolute source offset.
    ///
    /// Bypasses and does not perturb the internal buffer or the current
    /// position — intended for large one-off reads (embedded blob
    /// extraction) where populating the buffer would be wasteful.
    pub fn read_bytes(&mut self, offset: u64, count: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; count];
        let mut done = 0usize;
        while done < count {
            let n = self.source.read_at(offset + done as u64, &mut out[done..])?;
            if n == 0 {
                return Err(end_error(format!(
                    "needed {} bytes at offset {}, source ended after {}",
                    count, offset, done
                )));
            }
            done += n;
        }
        Ok(out)
    }

    /// Repositions the logical stream position.
    ///
    /// When the target still falls within the buffered window only the
    /// in-buffer position moves; otherwise the buffer is invalidated and the
    /// next read refills it.
    pub fn seek(&mut self, target: SeekFrom) -> Result<u64> {
        let target = match target {
            SeekFrom::Start(offset) => offset,
            SeekFrom::Current(delta) => self
                .position()
                .checked_add_signed(delta)
                .ok_or_else(|| argument_error("seek before start of source"))?,
            SeekFrom::End(delta) => {
                let len = self
                    .len()
                    .ok_or_else(|| argument_error("source length unknown, cannot seek from end"))?;
                len.checked_add_signed(delta)
                    .ok_or_else(|| argument_error("seek before start of source"))?
            }
        };
        if target >= self.buf_start && target <= self.buf_start + self.valid as u64 {
            self.pos = (target - self.buf_start) as usize;
        } else {
            self.buf_start = target;
            self.pos = 0;
            self.valid = 0;
        }
        Ok(target)
    }
}
