use crate::engine::AutoHideEngine;
use crate::settings::SettingsStore;
use std::ffi::c_void;
use std::rc::Rc;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{BOOL, HWND, LPARAM};
use windows::Win32::UI::Shell::{SHAppBarMessage, APPBARDATA};
use windows::Win32::UI::WindowsAndMessaging::{
    FindWindowW, SystemParametersInfoW, SPIF_SENDCHANGE, SPIF_UPDATEINIFILE,
    SPI_GETCLIENTAREAANIMATION, SPI_SETCLIENTAREAANIMATION, SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS,
};

const ABM_GETSTATE: u32 = 0x4;
const ABM_SETSTATE: u32 = 0xA;
const ABS_AUTOHIDE: u32 = 0x1;
const ABS_ALWAYSONTOP: u32 = 0x2;

fn appbar_data() -> APPBARDATA {
    let taskbar =
        unsafe { FindWindowW(w!("Shell_TrayWnd"), PCWSTR::null()) }.unwrap_or(HWND::default());
    APPBARDATA {
        cbSize: std::mem::size_of::<APPBARDATA>() as u32,
        hWnd: taskbar,
        ..Default::default()
    }
}

fn auto_hide_state() -> bool {
    let mut data = appbar_data();
    let state = unsafe { SHAppBarMessage(ABM_GETSTATE, &mut data) } as u32;
    state & ABS_AUTOHIDE != 0
}

fn set_auto_hide_state(enabled: bool) {
    let mut data = appbar_data();
    let state = if enabled { ABS_AUTOHIDE } else { ABS_ALWAYSONTOP };
    data.lParam = LPARAM(state as isize);
    unsafe {
        SHAppBarMessage(ABM_SETSTATE, &mut data);
    }
    log::debug!("Taskbar auto-hide set to {}", enabled);
}

/// Drives the shell's own auto-hide flag. No foreground-window heuristics:
/// while auto mode is on the taskbar is left as the shell has it.
pub struct AppBarEngine {
    settings: Rc<dyn SettingsStore>,
}

impl AppBarEngine {
    pub fn new(settings: Rc<dyn SettingsStore>) -> Self {
        Self { settings }
    }
}

impl AutoHideEngine for AppBarEngine {
    fn is_bar_currently_auto_hidden(&self) -> bool {
        auto_hide_state()
    }

    fn is_animation_enabled(&self) -> bool {
        let mut enabled = BOOL(0);
        let result = unsafe {
            SystemParametersInfoW(
                SPI_GETCLIENTAREAANIMATION,
                0,
                Some(&mut enabled as *mut BOOL as *mut c_void),
                SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
            )
        };
        match result {
            Ok(()) => enabled.as_bool(),
            Err(e) => {
                log::warn!("Failed to read client-area animation: {}", e);
                false
            }
        }
    }

    fn toggle_animation(&self) -> bool {
        let wanted = !self.is_animation_enabled();
        // The SET action takes the value itself in the pointer slot.
        let result = unsafe {
            SystemParametersInfoW(
                SPI_SETCLIENTAREAANIMATION,
                0,
                Some(wanted as usize as *mut c_void),
                SPIF_UPDATEINIFILE | SPIF_SENDCHANGE,
            )
        };
        if let Err(e) = result {
            log::warn!("Failed to set client-area animation: {}", e);
        }
        self.is_animation_enabled()
    }

    fn recompute_and_apply(&self) {
        if self.settings.auto_mode_enabled() {
            return;
        }
        set_auto_hide_state(!auto_hide_state());
    }

    fn cancel_pending_auto_hide(&self) {
        if auto_hide_state() {
            set_auto_hide_state(false);
        }
    }

    fn hide_bar_now(&self) {
        set_auto_hide_state(true);
    }
}
