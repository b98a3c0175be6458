//! Platform syscall layer.
//!
//! Thin, typed bindings to the OS memory primitives: allocate, free, change
//! protection, and cross-process read/write. This layer marshals arguments,
//! captures OS error codes, and nothing else — failures are reported upward
//! as-is, never retried or interpreted.
//!
//! The active implementation is selected once at compile time; hot paths
//! never branch on the OS at runtime.

use crate::Result;
use bitflags::bitflags;
use core::{ffi::c_void, ptr::NonNull};

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        pub use unix::Native;
    } else if #[cfg(windows)] {
        mod windows;
        pub use windows::Native;
    } else {
        compile_error!("unsupported target OS");
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    /// Memory protection flags for controlling access permissions.
    ///
    /// These flags can be combined using bitwise OR. The bit values match the
    /// POSIX `PROT_*` constants; Windows protection constants are not a
    /// bitset, so the Windows backend maps combinations through a lookup
    /// table. Windows has no "write + execute without read" constant, so
    /// that combination is upgraded to read + write + execute.
    pub struct ProtFlags: i32 {
        /// No access allowed.
        const NONE = 0;

        /// Allow reading from the memory region.
        const READ = 1;

        /// Allow writing to the memory region.
        const WRITE = 2;

        /// Allow executing code in the memory region.
        const EXECUTE = 4;
    }
}

impl ProtFlags {
    /// Read + write + execute, the protection used for fresh allocations so
    /// consumers that stage executable code (code caves, trampolines) can
    /// use them directly.
    pub const RWX: ProtFlags = ProtFlags::READ.union(ProtFlags::WRITE).union(ProtFlags::EXECUTE);
}

/// Typed bindings to one OS family's memory primitives.
///
/// This trait provides a unified interface over virtual-memory management
/// and cross-process memory copies. It has exactly one implementation per
/// OS family, exported as [`Native`].
///
/// Addresses and lengths are raw; process handles are carried as `isize`
/// (a pid on Unix, a `HANDLE` on Windows).
///
/// # Safety
/// Most methods are unsafe because they manipulate a process's virtual
/// address space. Callers must ensure addresses and lengths describe regions
/// they own.
pub trait RawOs {
    /// Allocates a committed anonymous memory region in the current process.
    ///
    /// # Arguments
    /// * `addr` - Preferred starting address. `None` lets the system choose.
    /// * `len` - Size of the region in bytes (rounded up to page size).
    /// * `prot` - Initial protection flags.
    ///
    /// # Safety
    /// `addr`, if given, must be page-aligned and must not overlap a live
    /// mapping the caller still relies on.
    unsafe fn alloc(addr: Option<usize>, len: usize, prot: ProtFlags) -> Result<NonNull<c_void>>;

    /// Releases a region previously returned by [`RawOs::alloc`].
    ///
    /// # Safety
    /// `addr` and `len` must match the original allocation. The region must
    /// not be accessed afterwards.
    unsafe fn free(addr: NonNull<c_void>, len: usize) -> Result<()>;

    /// Changes the protection of a region in the current process.
    ///
    /// Returns the previous protection where the OS reports it (Windows);
    /// `None` where it does not (Unix `mprotect`).
    ///
    /// # Safety
    /// `addr` must be page-aligned and the region must be mapped. Removing
    /// execute permission from code that is currently running is undefined.
    unsafe fn protect(
        addr: NonNull<c_void>,
        len: usize,
        prot: ProtFlags,
    ) -> Result<Option<ProtFlags>>;

    /// Opens a handle to the process identified by `pid` with enough access
    /// for memory reads, writes, allocation, and protection changes.
    fn open_process(pid: u32) -> Result<isize>;

    /// Closes a handle returned by [`RawOs::open_process`]. Best-effort.
    fn close_process(handle: isize);

    /// Copies `buf.len()` bytes from `address` in the target process into
    /// `buf`. Partial copies are reported as failures.
    fn read_process(handle: isize, address: usize, buf: &mut [u8]) -> Result<()>;

    /// Copies `buf` into the target process at `address`. Partial copies are
    /// reported as failures.
    fn write_process(handle: isize, address: usize, buf: &[u8]) -> Result<()>;

    /// Allocates a committed anonymous region inside the target process.
    ///
    /// # Safety
    /// The returned address is only meaningful inside the target process and
    /// must never be dereferenced locally.
    unsafe fn alloc_process(handle: isize, len: usize, prot: ProtFlags) -> Result<NonNull<c_void>>;

    /// Releases a region previously allocated in the target process.
    ///
    /// # Safety
    /// `addr` must come from [`RawOs::alloc_process`] on the same process.
    unsafe fn free_process(handle: isize, addr: NonNull<c_void>, len: usize) -> Result<()>;

    /// Changes the protection of a region inside the target process.
    ///
    /// # Safety
    /// The region must be mapped in the target process.
    unsafe fn protect_process(
        handle: isize,
        addr: NonNull<c_void>,
        len: usize,
        prot: ProtFlags,
    ) -> Result<Option<ProtFlags>>;
}
