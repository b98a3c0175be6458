use crate::{
    Result,
    os::{Native, ProtFlags, RawOs},
    source::{MemoryAllocation, MemorySource},
};
use core::{ffi::c_void, ptr::NonNull};

/// A memory source over another running process, mediated by OS syscalls.
///
/// Owns the process handle opened at construction and closes it exactly once
/// on drop. The handle is fixed and not revalidated: if the target process
/// exits, operations fail with [`Error::Memory`](crate::Error) rather than
/// crash, and if the target is restarted the source must be recreated.
#[derive(Debug)]
pub struct ExternalSource {
    handle: isize,
    pid: u32,
}

impl ExternalSource {
    /// Opens the process identified by `pid` for memory access.
    pub fn open(pid: u32) -> Result<Self> {
        let handle = Native::open_process(pid)?;
        #[cfg(feature = "log")]
        log::debug!("opened process {pid} for memory access");
        Ok(Self { handle, pid })
    }

    /// The pid this source was opened against.
    #[inline]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// The raw OS handle (a pid on Unix, a `HANDLE` on Windows).
    #[inline]
    pub fn raw_handle(&self) -> isize {
        self.handle
    }
}

impl Drop for ExternalSource {
    fn drop(&mut self) {
        Native::close_process(self.handle);
    }
}

impl MemorySource for ExternalSource {
    fn read_raw(&self, address: usize, buf: &mut [u8]) -> Result<()> {
        Native::read_process(self.handle, address, buf)
    }

    fn write_raw(&self, address: usize, buf: &[u8]) -> Result<()> {
        Native::write_process(self.handle, address, buf)
    }

    fn allocate(&self, length: usize) -> Result<MemoryAllocation> {
        let ptr = unsafe { Native::alloc_process(self.handle, length, ProtFlags::RWX)? };
        Ok(MemoryAllocation {
            address: ptr.as_ptr() as usize,
            length,
        })
    }

    fn free(&self, allocation: MemoryAllocation) -> bool {
        let Some(ptr) = NonNull::new(allocation.address as *mut c_void) else {
            return false;
        };
        unsafe { Native::free_process(self.handle, ptr, allocation.length).is_ok() }
    }

    fn change_protection(
        &self,
        address: usize,
        length: usize,
        prot: ProtFlags,
    ) -> Result<Option<ProtFlags>> {
        let ptr = NonNull::new(address as *mut c_void)
            .ok_or_else(|| crate::permission_error("null address"))?;
        unsafe { Native::protect_process(self.handle, ptr, length, prot) }
    }
}
