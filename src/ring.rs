//! Ring (circular) buffer allocator.
//!
//! A fixed-capacity memory region that places successive variable-size items
//! end-to-end and wraps to the start when an item cannot fit in the
//! remaining tail space. Intended for temporary staging (trampolines, code
//! caves) where only the most recent writes matter: there is no liveness
//! bookkeeping, and an address returned by `add` stays valid only until
//! overwritten by wrap-around.

use crate::{
    Result,
    codec::{self, Blittable, Marshalled},
    source::{MemoryAllocation, MemorySource},
};

/// Whether an item of a given size fits into a [`RingBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fit {
    /// Fits in the remaining tail space.
    Yes,
    /// Fits only after wrapping to the start of the buffer.
    StartOfBuffer,
    /// Exceeds the total capacity; never fits, even empty.
    No,
}

/// A fixed-capacity region allocated from a memory source at construction
/// and freed exactly once on drop.
///
/// `offset` names the byte position of the next write; `address + offset` is
/// the next write pointer. Invariant: `offset <= size`.
pub struct RingBuffer<S: MemorySource> {
    source: S,
    address: usize,
    size: usize,
    offset: usize,
}

impl<S: MemorySource> RingBuffer<S> {
    /// Allocates a ring buffer of `size` bytes from `source`.
    pub fn new(source: S, size: usize) -> Result<Self> {
        let allocation = source.allocate(size)?;
        Ok(Self {
            source,
            address: allocation.address,
            size: allocation.length,
            offset: 0,
        })
    }

    /// Base address of the underlying region.
    #[inline]
    pub fn address(&self) -> usize {
        self.address
    }

    /// Total capacity in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Byte position of the next write.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The address the next item will be written to.
    #[inline]
    pub fn write_pointer(&self) -> usize {
        self.address + self.offset
    }

    /// Classifies whether an item of `item_size` bytes fits.
    pub fn can_fit(&self, item_size: usize) -> Fit {
        if self.size - self.offset >= item_size {
            Fit::Yes
        } else if self.size >= item_size {
            Fit::StartOfBuffer
        } else {
            Fit::No
        }
    }

    /// Places `bytes` at the next write position, wrapping to the start of
    /// the buffer first when the tail space is too small.
    ///
    /// Returns the address written to, or `None` without writing when the
    /// item exceeds the total capacity. The address remains valid only until
    /// overwritten by wrap-around.
    pub fn add_bytes(&mut self, bytes: &[u8]) -> Result<Option<usize>> {
        match self.can_fit(bytes.len()) {
            Fit::No => return Ok(None),
            Fit::StartOfBuffer => self.offset = 0,
            Fit::Yes => {}
        }
        let target = self.address + self.offset;
        self.source.write_raw(target, bytes)?;
        self.offset += bytes.len();
        Ok(Some(target))
    }

    /// Serializes a blittable value and places it via
    /// [`add_bytes`](Self::add_bytes).
    pub fn add<T: Blittable>(&mut self, value: &T) -> Result<Option<usize>> {
        self.add_bytes(codec::bytes_of(value))
    }

    /// Serializes a value through the marshalled codec path and places it
    /// via [`add_bytes`](Self::add_bytes).
    pub fn add_marshalled<T: Marshalled>(&mut self, value: &T) -> Result<Option<usize>> {
        self.add_bytes(&codec::marshal(value))
    }
}

impl<S: MemorySource> Drop for RingBuffer<S> {
    fn drop(&mut self) {
        let freed = self.source.free(MemoryAllocation {
            address: self.address,
            length: self.size,
        });
        if !freed {
            #[cfg(feature = "log")]
            log::warn!(
                "failed to free ring buffer region at {:#x} ({} bytes)",
                self.address,
                self.size
            );
        }
    }
}
