//! Memory source abstraction.
//!
//! A uniform read/write/allocate/protect contract implemented twice: once
//! against the current process's address space ([`LocalSource`]) and once
//! against another running process via OS syscalls ([`ExternalSource`]).
//! Typed reads and writes route through the struct codec, so both blittable
//! and marshalled types move through the same interface.

mod external;
mod local;

pub use external::ExternalSource;
pub use local::LocalSource;

use crate::{
    Result,
    codec::{self, Blittable, Marshalled},
    os::ProtFlags,
};

/// A region of memory produced by [`MemorySource::allocate`].
///
/// The full value must be passed back to [`MemorySource::free`] to release
/// it; `free` consumes the allocation so it cannot be released twice through
/// safe code. The addresses inside are not valid after free.
#[derive(Debug, PartialEq, Eq)]
pub struct MemoryAllocation {
    /// Base address of the region.
    pub address: usize,
    /// Length of the region in bytes.
    pub length: usize,
}

/// Uniform access to an address space, local or in another process.
///
/// Implementations are stateless apart from the external variant's process
/// handle and perform no internal locking; an instance must not be used from
/// multiple threads without external synchronization.
pub trait MemorySource {
    /// Copies `buf.len()` bytes starting at `address` into `buf`.
    ///
    /// Fails with [`Error::Memory`](crate::Error) when the underlying
    /// operation reports failure (invalid address, protected page, target
    /// process gone). Never retried.
    fn read_raw(&self, address: usize, buf: &mut [u8]) -> Result<()>;

    /// Copies `buf` into memory starting at `address`. Same failure contract
    /// as [`read_raw`](MemorySource::read_raw).
    fn write_raw(&self, address: usize, buf: &[u8]) -> Result<()>;

    /// Allocates `length` bytes of read+write+execute memory.
    ///
    /// Fails with [`Error::Allocation`](crate::Error) on OS-level failure.
    fn allocate(&self, length: usize) -> Result<MemoryAllocation>;

    /// Releases an allocation. Best-effort: returns whether the OS call
    /// succeeded instead of failing, since freeing is cleanup rather than a
    /// correctness-critical path.
    fn free(&self, allocation: MemoryAllocation) -> bool;

    /// Changes the protection of `length` bytes at `address`.
    ///
    /// Returns the previous protection where the OS reports it (Windows);
    /// `None` where it does not (Unix). Fails with
    /// [`Error::Permission`](crate::Error) on OS-level failure.
    fn change_protection(
        &self,
        address: usize,
        length: usize,
        prot: ProtFlags,
    ) -> Result<Option<ProtFlags>>;

    /// Reads a blittable value at `address`.
    fn read<T: Blittable>(&self, address: usize) -> Result<T>
    where
        Self: Sized,
    {
        let mut buf = vec![0u8; size_of::<T>()];
        self.read_raw(address, &mut buf)?;
        codec::from_bytes(&buf)
    }

    /// Writes a blittable value at `address`.
    fn write<T: Blittable>(&self, address: usize, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        self.write_raw(address, codec::bytes_of(value))
    }

    /// Reads `count` consecutive blittable values starting at `address`.
    fn read_many<T: Blittable>(&self, address: usize, count: usize) -> Result<Vec<T>>
    where
        Self: Sized,
    {
        let mut buf = vec![0u8; size_of::<T>() * count];
        self.read_raw(address, &mut buf)?;
        codec::slice_from_bytes(&buf)
    }

    /// Writes consecutive blittable values starting at `address`.
    fn write_many<T: Blittable>(&self, address: usize, values: &[T]) -> Result<()>
    where
        Self: Sized,
    {
        self.write_raw(address, codec::slice_as_bytes(values))
    }

    /// Reads a value at `address` through the marshalled codec path. The
    /// memory is expected to hold the wire representation, which is
    /// [`marshalled_size_of::<T>()`](codec::marshalled_size_of) bytes.
    fn read_marshalled<T: Marshalled>(&self, address: usize) -> Result<T>
    where
        Self: Sized,
    {
        let mut buf = vec![0u8; codec::marshalled_size_of::<T>()];
        self.read_raw(address, &mut buf)?;
        codec::unmarshal(&buf)
    }

    /// Writes a value at `address` through the marshalled codec path.
    fn write_marshalled<T: Marshalled>(&self, address: usize, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        self.write_raw(address, &codec::marshal(value))
    }
}
