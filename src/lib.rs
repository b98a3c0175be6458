//! # rawmem
//! A low-level memory-access and binary-serialization toolkit: read, write,
//! and reinterpret raw memory — in the current process and in other running
//! processes — portably across operating systems, and move structured data
//! between memory and byte streams without general-purpose reflection.
//!
//! The crate covers four subsystems:
//! * [`source`] — a uniform read/write/allocate/protect contract over the
//!   local address space or an external process.
//! * [`codec`] — bidirectional conversion between typed values and raw
//!   bytes, with a zero-copy blittable path and a marshalled path for types
//!   whose in-memory layout differs from their wire layout.
//! * [`stream`] — a buffered, endian-aware reader over any seekable byte
//!   source.
//! * [`ring`] — a fixed-capacity ring buffer placing variable-size items
//!   end-to-end with wrap-around.
//!
//! All components are single-threaded by contract: no internal locking, no
//! async. Use external synchronization to share an instance across threads.
//!
//! ## Example
//! ```
//! use rawmem::{LocalSource, MemorySource};
//!
//! let memory = LocalSource::new();
//! let region = memory.allocate(0x1000).unwrap();
//! memory.write(region.address, &0x12345678u32).unwrap();
//! assert_eq!(memory.read::<u32>(region.address).unwrap(), 0x12345678);
//! assert!(memory.free(region));
//! ```

pub mod codec;
mod error;
pub mod os;
pub mod ring;
pub mod source;
pub mod stream;

pub(crate) use error::{
    alloc_error, argument_error, end_error, io_error, memory_error, permission_error,
};
#[cfg(unix)]
pub(crate) use error::unsupported_error;

pub use error::Error;
pub use os::ProtFlags;
pub use ring::{Fit, RingBuffer};
pub use source::{ExternalSource, LocalSource, MemoryAllocation, MemorySource};
pub use stream::{Endian, StreamReader};

pub type Result<T> = core::result::Result<T, Error>;
