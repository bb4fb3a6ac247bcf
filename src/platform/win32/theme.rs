use crate::theme::{SubscriptionId, ThemeCallback, ThemeWatcher};
use anyhow::{bail, Context, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::c_void;
use std::thread::JoinHandle;
use widestring::U16CString;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{CloseHandle, ERROR_SUCCESS, HANDLE};
use windows::Win32::System::Registry::{
    RegCloseKey, RegGetValueW, RegNotifyChangeKeyValue, RegOpenKeyExW, HKEY, HKEY_CURRENT_USER,
    KEY_NOTIFY, KEY_READ, REG_NOTIFY_CHANGE_LAST_SET, RRF_RT_REG_DWORD,
};
use windows::Win32::System::Threading::{
    CreateEventW, SetEvent, WaitForMultipleObjects, INFINITE, WAIT_OBJECT_0,
};

const PERSONALIZE_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Themes\Personalize";
/// The taskbar follows the system scheme, not the app scheme.
const LIGHT_THEME_VALUE: &str = "SystemUsesLightTheme";

fn read_light_theme() -> Option<bool> {
    let key = U16CString::from_str(PERSONALIZE_KEY).ok()?;
    let value = U16CString::from_str(LIGHT_THEME_VALUE).ok()?;
    let mut data: u32 = 0;
    let mut size = std::mem::size_of::<u32>() as u32;

    let status = unsafe {
        RegGetValueW(
            HKEY_CURRENT_USER,
            PCWSTR(key.as_ptr()),
            PCWSTR(value.as_ptr()),
            RRF_RT_REG_DWORD,
            None,
            Some(&mut data as *mut u32 as *mut c_void),
            Some(&mut size),
        )
    };
    (status == ERROR_SUCCESS).then_some(data != 0)
}

struct Watch {
    stop: isize,
    thread: JoinHandle<()>,
}

impl Watch {
    fn stop(self) {
        let stop = HANDLE(self.stop as *mut _);
        unsafe {
            let _ = SetEvent(stop);
        }
        if self.thread.join().is_err() {
            log::warn!("Theme watcher thread panicked");
        }
        unsafe {
            let _ = CloseHandle(stop);
        }
    }
}

/// Watches the personalization key and calls subscribers from a background
/// thread whenever the light/dark value actually flips.
#[derive(Default)]
pub struct RegistryThemeWatcher {
    watches: RefCell<HashMap<SubscriptionId, Watch>>,
    next_id: Cell<u64>,
}

impl RegistryThemeWatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ThemeWatcher for RegistryThemeWatcher {
    fn is_light_theme(&self) -> bool {
        read_light_theme().unwrap_or(false)
    }

    fn subscribe(&self, callback: ThemeCallback) -> Result<SubscriptionId> {
        let stop = unsafe { CreateEventW(None, true, false, PCWSTR::null()) }
            .context("CreateEventW failed")?;
        let stop_raw = stop.0 as isize;

        let spawned = std::thread::Builder::new()
            .name("theme-watcher".into())
            .spawn(move || {
                if let Err(e) = watch_key(stop_raw, callback) {
                    log::warn!("Theme watcher stopped: {:#}", e);
                }
            });
        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                unsafe {
                    let _ = CloseHandle(stop);
                }
                return Err(e).context("Failed to spawn theme watcher");
            }
        };

        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.watches.borrow_mut().insert(
            id,
            Watch {
                stop: stop_raw,
                thread,
            },
        );
        log::debug!("Theme watcher {:?} started", id);
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let watch = self.watches.borrow_mut().remove(&id);
        if let Some(watch) = watch {
            watch.stop();
            log::debug!("Theme watcher {:?} stopped", id);
        }
    }
}

impl Drop for RegistryThemeWatcher {
    fn drop(&mut self) {
        for (_, watch) in self.watches.get_mut().drain() {
            watch.stop();
        }
    }
}

fn watch_key(stop_raw: isize, callback: ThemeCallback) -> Result<()> {
    let stop = HANDLE(stop_raw as *mut _);
    let path = U16CString::from_str(PERSONALIZE_KEY)?;

    let mut key = HKEY::default();
    let status = unsafe {
        RegOpenKeyExW(
            HKEY_CURRENT_USER,
            PCWSTR(path.as_ptr()),
            0,
            KEY_NOTIFY | KEY_READ,
            &mut key,
        )
    };
    if status != ERROR_SUCCESS {
        bail!("RegOpenKeyExW failed: {:?}", status);
    }

    let changed = match unsafe { CreateEventW(None, false, false, PCWSTR::null()) } {
        Ok(event) => event,
        Err(e) => {
            unsafe {
                let _ = RegCloseKey(key);
            }
            return Err(e).context("CreateEventW failed");
        }
    };

    let result = notify_loop(key, changed, stop, &callback);

    unsafe {
        let _ = RegCloseKey(key);
        let _ = CloseHandle(changed);
    }
    result
}

fn notify_loop(key: HKEY, changed: HANDLE, stop: HANDLE, callback: &ThemeCallback) -> Result<()> {
    let mut last = read_light_theme();
    loop {
        let status =
            unsafe { RegNotifyChangeKeyValue(key, false, REG_NOTIFY_CHANGE_LAST_SET, changed, true) };
        if status != ERROR_SUCCESS {
            bail!("RegNotifyChangeKeyValue failed: {:?}", status);
        }

        let signalled = unsafe { WaitForMultipleObjects(&[changed, stop], false, INFINITE) };
        if signalled != WAIT_OBJECT_0 {
            return Ok(());
        }

        let now = read_light_theme();
        if now != last {
            last = now;
            callback();
        }
    }
}
