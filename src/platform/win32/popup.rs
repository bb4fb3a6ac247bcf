use super::window::to_hwnd;
use crate::tray::menu::{MenuCommand, MenuItemDescriptor, MenuItemKind, Point, PopupHost};
use crate::tray::window::WindowHandle;
use anyhow::{Context, Result};
use widestring::U16CString;
use windows::core::PCWSTR;
use windows::Win32::Foundation::POINT;
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, DestroyMenu, GetCursorPos, SetForegroundWindow, TrackPopupMenu,
    HMENU, MF_CHECKED, MF_SEPARATOR, MF_STRING, TPM_BOTTOMALIGN, TPM_LEFTALIGN, TPM_NONOTIFY,
    TPM_RETURNCMD,
};

/// Native popup menu built fresh for every display.
pub struct Win32Popup;

fn append_item(menu: HMENU, item: &MenuItemDescriptor) -> Result<()> {
    match item.kind {
        MenuItemKind::Separator => unsafe {
            AppendMenuW(menu, MF_SEPARATOR, 0, PCWSTR::null()).context("AppendMenuW separator")
        },
        MenuItemKind::Action(command) | MenuItemKind::Toggle { command, .. } => {
            let label = U16CString::from_str(item.mnemonic_label())?;
            let mut flags = MF_STRING;
            if item.is_checked() {
                flags |= MF_CHECKED;
            }
            unsafe {
                AppendMenuW(menu, flags, command.id() as usize, PCWSTR(label.as_ptr()))
                    .with_context(|| format!("AppendMenuW {:?}", command))
            }
        }
    }
}

impl PopupHost for Win32Popup {
    fn cursor_position(&self) -> Point {
        let mut pt = POINT::default();
        match unsafe { GetCursorPos(&mut pt) } {
            Ok(()) => Point { x: pt.x, y: pt.y },
            Err(e) => {
                log::debug!("GetCursorPos failed: {}", e);
                Point::default()
            }
        }
    }

    fn track_popup(
        &self,
        owner: WindowHandle,
        items: &[MenuItemDescriptor],
        at: Point,
    ) -> Option<MenuCommand> {
        let menu = match unsafe { CreatePopupMenu() } {
            Ok(menu) => menu,
            Err(e) => {
                log::warn!("CreatePopupMenu failed: {}", e);
                return None;
            }
        };

        for item in items {
            if let Err(e) = append_item(menu, item) {
                log::warn!("{:#}", e);
            }
        }

        let hwnd = to_hwnd(owner);
        let chosen = unsafe {
            // Without this the menu stays open after a click elsewhere.
            let _ = SetForegroundWindow(hwnd);
            TrackPopupMenu(
                menu,
                TPM_LEFTALIGN | TPM_BOTTOMALIGN | TPM_RETURNCMD | TPM_NONOTIFY,
                at.x,
                at.y,
                0,
                hwnd,
                None,
            )
        };
        unsafe {
            let _ = DestroyMenu(menu);
        }

        MenuCommand::from_id(chosen.0 as u32)
    }
}
