use crate::{
    Result, alloc_error, memory_error, permission_error, unsupported_error,
    os::{ProtFlags, RawOs},
};
use core::{ffi::c_void, ptr::NonNull};
use libc::{MAP_ANONYMOUS, MAP_PRIVATE, mmap, mprotect, munmap};

/// The Unix implementation of the syscall layer.
///
/// Local operations bind to `mmap`/`munmap`/`mprotect`. External-process
/// reads and writes bind to the vectored cross-process copy calls
/// (`process_vm_readv`/`process_vm_writev`, Linux only). Unix offers no
/// syscall to allocate or reprotect memory in another process without
/// ptrace, so those operations report [`Error::Unsupported`].
pub struct Native;

fn errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

impl RawOs for Native {
    unsafe fn alloc(addr: Option<usize>, len: usize, prot: ProtFlags) -> Result<NonNull<c_void>> {
        let ptr = unsafe {
            mmap(
                addr.unwrap_or(0) as _,
                len,
                prot.bits(),
                MAP_PRIVATE | MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if core::ptr::eq(ptr, libc::MAP_FAILED) {
            return Err(alloc_error(format!("mmap failed with errno {}", errno())));
        }
        #[cfg(feature = "log")]
        log::debug!("mmap anonymous: addr={:p} len={} prot={:?}", ptr, len, prot);
        Ok(unsafe { NonNull::new_unchecked(ptr) })
    }

    unsafe fn free(addr: NonNull<c_void>, len: usize) -> Result<()> {
        let res = unsafe { munmap(addr.as_ptr(), len) };
        if res != 0 {
            return Err(memory_error(format!(
                "munmap failed with errno {}",
                errno()
            )));
        }
        Ok(())
    }

    unsafe fn protect(
        addr: NonNull<c_void>,
        len: usize,
        prot: ProtFlags,
    ) -> Result<Option<ProtFlags>> {
        let res = unsafe { mprotect(addr.as_ptr(), len, prot.bits()) };
        if res != 0 {
            return Err(permission_error(format!(
                "mprotect failed with errno {}",
                errno()
            )));
        }
        // The kernel does not report the prior protection.
        Ok(None)
    }

    fn open_process(pid: u32) -> Result<isize> {
        // Signal 0 performs the permission and existence checks only.
        let res = unsafe { libc::kill(pid as libc::pid_t, 0) };
        if res != 0 {
            return Err(memory_error(format!(
                "cannot attach to pid {}: errno {}",
                pid,
                errno()
            )));
        }
        Ok(pid as isize)
    }

    fn close_process(_handle: isize) {
        // A pid is not a kernel object; nothing to release.
    }

    #[cfg(target_os = "linux")]
    fn read_process(handle: isize, address: usize, buf: &mut [u8]) -> Result<()> {
        let local = libc::iovec {
            iov_base: buf.as_mut_ptr() as *mut c_void,
            iov_len: buf.len(),
        };
        let remote = libc::iovec {
            iov_base: address as *mut c_void,
            iov_len: buf.len(),
        };
        let n = unsafe { libc::process_vm_readv(handle as libc::pid_t, &local, 1, &remote, 1, 0) };
        if n < 0 || n as usize != buf.len() {
            return Err(memory_error(format!(
                "process_vm_readv of {} bytes at {:#x} failed with errno {}",
                buf.len(),
                address,
                errno()
            )));
        }
        Ok(())
    }

    #[cfg(target_os = "linux")]
    fn write_process(handle: isize, address: usize, buf: &[u8]) -> Result<()> {
        let local = libc::iovec {
            iov_base: buf.as_ptr() as *mut c_void,
            iov_len: buf.len(),
        };
        let remote = libc::iovec {
            iov_base: address as *mut c_void,
            iov_len: buf.len(),
        };
        let n = unsafe { libc::process_vm_writev(handle as libc::pid_t, &local, 1, &remote, 1, 0) };
        if n < 0 || n as usize != buf.len() {
            return Err(memory_error(format!(
                "process_vm_writev of {} bytes at {:#x} failed with errno {}",
                buf.len(),
                address,
                errno()
            )));
        }
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn read_process(_handle: isize, _address: usize, _buf: &mut [u8]) -> Result<()> {
        Err(unsupported_error(
            "cross-process read requires process_vm_readv",
        ))
    }

    #[cfg(not(target_os = "linux"))]
    fn write_process(_handle: isize, _address: usize, _buf: &[u8]) -> Result<()> {
        Err(unsupported_error(
            "cross-process write requires process_vm_writev",
        ))
    }

    unsafe fn alloc_process(
        _handle: isize,
        _len: usize,
        _prot: ProtFlags,
    ) -> Result<NonNull<c_void>> {
        Err(unsupported_error("remote allocation is not available on unix"))
    }

    unsafe fn free_process(_handle: isize, _addr: NonNull<c_void>, _len: usize) -> Result<()> {
        Err(unsupported_error("remote free is not available on unix"))
    }

    unsafe fn protect_process(
        _handle: isize,
        _addr: NonNull<c_void>,
        _len: usize,
        _prot: ProtFlags,
    ) -> Result<Option<ProtFlags>> {
        Err(unsupported_error(
            "remote protection change is not available on unix",
        ))
    }
}
