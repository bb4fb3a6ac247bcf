use crate::instance::{InstanceGuard, InstanceLock};
use anyhow::{Context, Result};
use widestring::U16CString;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{CloseHandle, GetLastError, ERROR_ALREADY_EXISTS, HANDLE};
use windows::Win32::System::Threading::{CreateMutexW, ReleaseMutex};

/// Session-wide exclusivity through a named kernel mutex.
pub struct NamedMutexLock;

impl InstanceLock for NamedMutexLock {
    fn try_acquire(&self, key: &str) -> Result<Option<InstanceGuard>> {
        let name = U16CString::from_str(key)?;
        let handle = unsafe { CreateMutexW(None, true, PCWSTR(name.as_ptr())) }
            .context("CreateMutexW failed")?;

        if unsafe { GetLastError() } == ERROR_ALREADY_EXISTS {
            unsafe {
                let _ = CloseHandle(handle);
            }
            return Ok(None);
        }

        let raw = handle.0 as isize;
        Ok(Some(InstanceGuard::new(move || unsafe {
            let handle = HANDLE(raw as *mut _);
            let _ = ReleaseMutex(handle);
            let _ = CloseHandle(handle);
        })))
    }
}
