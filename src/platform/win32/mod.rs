//! Win32 implementations of the tray's platform seams.

mod icons;
mod instance;
mod popup;
mod shell;
mod taskbar;
mod theme;
mod window;

pub use icons::GlyphIcons;
pub use instance::NamedMutexLock;
pub use popup::Win32Popup;
pub use shell::Win32Shell;
pub use taskbar::AppBarEngine;
pub use theme::RegistryThemeWatcher;
pub use window::Win32Windows;

use crate::i18n::{detect_locale, BuiltinLocalizer};
use crate::paths::SystemLauncher;
use crate::process::DelayedKill;
use crate::settings::{FileSettings, SettingsStore};
use crate::tray::{TrayController, TrayDeps};
use anyhow::Result;
use std::rc::Rc;
use windows::Win32::Foundation::HWND;
use windows::Win32::Globalization::GetUserDefaultLocaleName;
use windows::Win32::System::Threading::{GetCurrentProcess, TerminateProcess};
use windows::Win32::UI::WindowsAndMessaging::{DispatchMessageW, GetMessageW, TranslateMessage, MSG};

const LOCALE_NAME_MAX_LENGTH: usize = 85;

/// Wires every collaborator to its Win32 or file-backed implementation.
pub fn native_deps() -> Result<TrayDeps> {
    let settings: Rc<dyn SettingsStore> = Rc::new(FileSettings::open_default()?);
    let locale = detect_locale();
    log::debug!("UI locale: {}", locale);

    Ok(TrayDeps {
        windows: Rc::new(Win32Windows::new()?),
        shell: Rc::new(Win32Shell),
        popup: Rc::new(Win32Popup),
        engine: Rc::new(AppBarEngine::new(Rc::clone(&settings))),
        settings,
        theme: Rc::new(RegistryThemeWatcher::new()),
        icons: Rc::new(GlyphIcons::new()?),
        localizer: Rc::new(BuiltinLocalizer::for_locale(&locale)),
        launcher: Rc::new(SystemLauncher),
        process: Rc::new(DelayedKill),
    })
}

/// Pumps thread messages, draining the tray's deferred queue after each
/// dispatch, until WM_QUIT or an error.
pub fn run_message_loop(tray: &mut TrayController) {
    let mut msg = MSG::default();
    loop {
        let status = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };
        if status.0 <= 0 {
            break;
        }
        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        tray.run_pending();
    }
    log::debug!("Message loop finished");
}

pub fn terminate_current_process(exit_code: u32) {
    unsafe {
        let _ = TerminateProcess(GetCurrentProcess(), exit_code);
    }
}

pub fn user_locale_name() -> Option<String> {
    let mut buffer = [0u16; LOCALE_NAME_MAX_LENGTH];
    let len = unsafe { GetUserDefaultLocaleName(&mut buffer) };
    if len <= 1 {
        return None;
    }
    Some(String::from_utf16_lossy(&buffer[..len as usize - 1]))
}
