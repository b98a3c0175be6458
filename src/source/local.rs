use crate::{
    Result, memory_error,
    os::{Native, ProtFlags, RawOs},
    source::{MemoryAllocation, MemorySource},
};
use core::{ffi::c_void, ptr::NonNull};

/// A memory source over the current process's address space.
///
/// Reads and writes are direct memory copies. A cheap guard converts the
/// obviously-invalid addresses (null, end-of-address-space overflow) into
/// [`Error::Memory`](crate::Error); other invalid addresses fault exactly as
/// a raw pointer access would, matching OS semantics.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalSource;

impl LocalSource {
    /// Creates a local memory source. Carries no state.
    #[inline]
    pub const fn new() -> Self {
        LocalSource
    }

    /// Allocates read+write+execute memory, optionally at a preferred
    /// address (page-aligned). `None` lets the OS choose.
    pub fn allocate_at(&self, addr: Option<usize>, length: usize) -> Result<MemoryAllocation> {
        let ptr = unsafe { Native::alloc(addr, length, ProtFlags::RWX)? };
        Ok(MemoryAllocation {
            address: ptr.as_ptr() as usize,
            length,
        })
    }
}

fn check_range(address: usize, len: usize) -> Result<()> {
    if address == 0 {
        return Err(memory_error("null address"));
    }
    if address.checked_add(len).is_none() {
        return Err(memory_error(format!(
            "range of {} bytes at {:#x} exceeds the address space",
            len, address
        )));
    }
    Ok(())
}

impl MemorySource for LocalSource {
    fn read_raw(&self, address: usize, buf: &mut [u8]) -> Result<()> {
        check_range(address, buf.len())?;
        unsafe {
            core::ptr::copy_nonoverlapping(address as *const u8, buf.as_mut_ptr(), buf.len())
        };
        Ok(())
    }

    fn write_raw(&self, address: usize, buf: &[u8]) -> Result<()> {
        check_range(address, buf.len())?;
        unsafe { core::ptr::copy_nonoverlapping(buf.as_ptr(), address as *mut u8, buf.len()) };
        Ok(())
    }

    fn allocate(&self, length: usize) -> Result<MemoryAllocation> {
        self.allocate_at(None, length)
    }

    fn free(&self, allocation: MemoryAllocation) -> bool {
        let Some(ptr) = NonNull::new(allocation.address as *mut c_void) else {
            return false;
        };
        unsafe { Native::free(ptr, allocation.length).is_ok() }
    }

    fn change_protection(
        &self,
        address: usize,
        length: usize,
        prot: ProtFlags,
    ) -> Result<Option<ProtFlags>> {
        let ptr = NonNull::new(address as *mut c_void)
            .ok_or_else(|| crate::permission_error("null address"))?;
        unsafe { Native::protect(ptr, length, prot) }
    }
}
