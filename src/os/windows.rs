use crate::{
    Result, alloc_error, memory_error, permission_error,
    os::{ProtFlags, RawOs},
};
use core::{ffi::c_void, ptr::NonNull};
use windows_sys::Win32::{
    Foundation::{CloseHandle, GetLastError, HANDLE},
    System::Diagnostics::Debug::{ReadProcessMemory, WriteProcessMemory},
    System::Memory::{
        MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_EXECUTE, PAGE_EXECUTE_READ,
        PAGE_EXECUTE_READWRITE, PAGE_NOACCESS, PAGE_PROTECTION_FLAGS, PAGE_READONLY,
        PAGE_READWRITE, VirtualAlloc, VirtualAllocEx, VirtualFree, VirtualFreeEx, VirtualProtect,
        VirtualProtectEx,
    },
    System::Threading::{
        OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION, PROCESS_VM_READ,
        PROCESS_VM_WRITE,
    },
};

/// The Windows implementation of the syscall layer.
///
/// Local operations bind to `VirtualAlloc`/`VirtualFree`/`VirtualProtect`;
/// external-process operations bind to the `Ex` variants plus
/// `ReadProcessMemory`/`WriteProcessMemory` through a handle opened with
/// `OpenProcess`.
pub struct Native;

/// Windows protection constants are not a bitset; map each R/W/X combination
/// to the tightest constant granting at least that access. Write implies
/// read (`PAGE_READWRITE`), and write + execute has no dedicated constant,
/// so it is upgraded to `PAGE_EXECUTE_READWRITE`.
fn prot_win(prot: ProtFlags) -> PAGE_PROTECTION_FLAGS {
    match prot.bits() {
        0 => PAGE_NOACCESS,
        0b001 => PAGE_READONLY,
        0b010 | 0b011 => PAGE_READWRITE,
        0b100 => PAGE_EXECUTE,
        0b101 => PAGE_EXECUTE_READ,
        0b110 | 0b111 => PAGE_EXECUTE_READWRITE,
        _ => unreachable!("ProtFlags carries only R/W/X bits"),
    }
}

/// Inverse of [`prot_win`] for reporting previous protection. Copy-on-write
/// and guard modifiers are folded into their base access.
fn win_prot(win: PAGE_PROTECTION_FLAGS) -> ProtFlags {
    use windows_sys::Win32::System::Memory::{
        PAGE_EXECUTE_WRITECOPY, PAGE_GUARD, PAGE_NOCACHE, PAGE_WRITECOMBINE, PAGE_WRITECOPY,
    };
    match win & !(PAGE_GUARD | PAGE_NOCACHE | PAGE_WRITECOMBINE) {
        PAGE_READONLY => ProtFlags::READ,
        PAGE_READWRITE | PAGE_WRITECOPY => ProtFlags::READ | ProtFlags::WRITE,
        PAGE_EXECUTE => ProtFlags::EXECUTE,
        PAGE_EXECUTE_READ => ProtFlags::READ | ProtFlags::EXECUTE,
        PAGE_EXECUTE_READWRITE | PAGE_EXECUTE_WRITECOPY => ProtFlags::RWX,
        _ => ProtFlags::NONE,
    }
}

impl RawOs for Native {
    unsafe fn alloc(addr: Option<usize>, len: usize, prot: ProtFlags) -> Result<NonNull<c_void>> {
        let ptr = unsafe {
            VirtualAlloc(
                addr.unwrap_or(0) as _,
                len,
                MEM_RESERVE | MEM_COMMIT,
                prot_win(prot),
            )
        };
        if ptr.is_null() {
            let err_code = unsafe { GetLastError() };
            return Err(alloc_error(format!(
                "VirtualAlloc failed with error: {}",
                err_code
            )));
        }
        #[cfg(feature = "log")]
        log::debug!("VirtualAlloc: addr={:p} len={} prot={:?}", ptr, len, prot);
        Ok(unsafe { NonNull::new_unchecked(ptr) })
    }

    unsafe fn free(addr: NonNull<c_void>, _len: usize) -> Result<()> {
        if unsafe { VirtualFree(addr.as_ptr(), 0, MEM_RELEASE) } == 0 {
            let err_code = unsafe { GetLastError() };
            return Err(memory_error(format!(
                "VirtualFree failed with error: {}",
                err_code
            )));
        }
        Ok(())
    }

    unsafe fn protect(
        addr: NonNull<c_void>,
        len: usize,
        prot: ProtFlags,
    ) -> Result<Option<ProtFlags>> {
        let mut old: PAGE_PROTECTION_FLAGS = 0;
        if unsafe { VirtualProtect(addr.as_ptr(), len, prot_win(prot), &mut old) } == 0 {
            let err_code = unsafe { GetLastError() };
            return Err(permission_error(format!(
                "VirtualProtect failed with error: {}",
                err_code
            )));
        }
        Ok(Some(win_prot(old)))
    }

    fn open_process(pid: u32) -> Result<isize> {
        let handle = unsafe {
            OpenProcess(
                PROCESS_VM_READ | PROCESS_VM_WRITE | PROCESS_VM_OPERATION
                    | PROCESS_QUERY_INFORMATION,
                0,
                pid,
            )
        };
        if handle.is_null() {
            let err_code = unsafe { GetLastError() };
            return Err(memory_error(format!(
                "OpenProcess for pid {} failed with error: {}",
                pid, err_code
            )));
        }
        Ok(handle as isize)
    }

    fn close_process(handle: isize) {
        unsafe { CloseHandle(handle as HANDLE) };
    }

    fn read_process(handle: isize, address: usize, buf: &mut [u8]) -> Result<()> {
        let mut read_count = 0usize;
        let res = unsafe {
            ReadProcessMemory(
                handle as HANDLE,
                address as *const c_void,
                buf.as_mut_ptr() as *mut c_void,
                buf.len(),
                &mut read_count,
            )
        };
        if res == 0 || read_count != buf.len() {
            let err_code = unsafe { GetLastError() };
            return Err(memory_error(format!(
                "ReadProcessMemory of {} bytes at {:#x} failed with error: {}",
                buf.len(),
                address,
                err_code
            )));
        }
        Ok(())
    }

    fn write_process(handle: isize, address: usize, buf: &[u8]) -> Result<()> {
        let mut written_count = 0usize;
        let res = unsafe {
            WriteProcessMemory(
                handle as HANDLE,
                address as *const c_void,
                buf.as_ptr() as *const c_void,
                buf.len(),
                &mut written_count,
            )
        };
        if res == 0 || written_count != buf.len() {
            let err_code = unsafe { GetLastError() };
            return Err(memory_error(format!(
                "WriteProcessMemory of {} bytes at {:#x} failed with error: {}",
                buf.len(),
                address,
                err_code
            )));
        }
        Ok(())
    }

    unsafe fn alloc_process(
        handle: isize,
        len: usize,
        prot: ProtFlags,
    ) -> Result<NonNull<c_void>> {
        let ptr = unsafe {
            VirtualAllocEx(
                handle as HANDLE,
                core::ptr::null(),
                len,
                MEM_RESERVE | MEM_COMMIT,
                prot_win(prot),
            )
        };
        if ptr.is_null() {
            let err_code = unsafe { GetLastError() };
            return Err(alloc_error(format!(
                "VirtualAllocEx failed with error: {}",
                err_code
            )));
        }
        Ok(unsafe { NonNull::new_unchecked(ptr) })
    }

    unsafe fn free_process(handle: isize, addr: NonNull<c_void>, _len: usize) -> Result<()> {
        if unsafe { VirtualFreeEx(handle as HANDLE, addr.as_ptr(), 0, MEM_RELEASE) } == 0 {
            let err_code = unsafe { GetLastError() };
            return Err(memory_error(format!(
                "VirtualFreeEx failed with error: {}",
                err_code
            )));
        }
        Ok(())
    }

    unsafe fn protect_process(
        handle: isize,
        addr: NonNull<c_void>,
        len: usize,
        prot: ProtFlags,
    ) -> Result<Option<ProtFlags>> {
        let mut old: PAGE_PROTECTION_FLAGS = 0;
        if unsafe {
            VirtualProtectEx(handle as HANDLE, addr.as_ptr(), len, prot_win(prot), &mut old)
        } == 0
        {
            let err_code = unsafe { GetLastError() };
            return Err(permission_error(format!(
                "VirtualProtectEx failed with error: {}",
                err_code
            )));
        }
        Ok(Some(win_prot(old)))
    }
}
