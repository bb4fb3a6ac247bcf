use super::window::to_hwnd;
use crate::tray::shell::{IconFlags, IconRecord, NotifyShell, NotifyVerb};
use anyhow::{bail, Result};
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIM_ADD, NIM_DELETE, NIM_MODIFY, NOTIFYICONDATAW, NOTIFY_ICON_DATA_FLAGS,
    NOTIFY_ICON_MESSAGE,
};
use windows::Win32::UI::WindowsAndMessaging::HICON;

/// Lays an `IconRecord` out as `NOTIFYICONDATAW`. Fields whose flag is not
/// set stay zeroed.
pub(super) fn encode(record: &IconRecord) -> NOTIFYICONDATAW {
    let mut nid: NOTIFYICONDATAW = unsafe { std::mem::zeroed() };
    nid.cbSize = std::mem::size_of::<NOTIFYICONDATAW>() as u32;
    nid.hWnd = to_hwnd(record.window);
    nid.uID = record.id;
    nid.uFlags = NOTIFY_ICON_DATA_FLAGS(record.flags.bits());

    if record.flags.contains(IconFlags::MESSAGE) {
        nid.uCallbackMessage = record.callback_message;
    }
    if record.flags.contains(IconFlags::ICON) {
        if let Some(icon) = record.icon {
            nid.hIcon = HICON(icon.0 as *mut _);
        }
    }
    if record.flags.contains(IconFlags::TIP) {
        nid.szTip = *record.tooltip.units();
    }
    nid
}

fn opcode(verb: NotifyVerb) -> NOTIFY_ICON_MESSAGE {
    match verb {
        NotifyVerb::Add => NIM_ADD,
        NotifyVerb::Modify => NIM_MODIFY,
        NotifyVerb::Delete => NIM_DELETE,
    }
}

pub struct Win32Shell;

impl NotifyShell for Win32Shell {
    fn notify(&self, verb: NotifyVerb, record: &IconRecord) -> Result<()> {
        let nid = encode(record);
        let accepted = unsafe { Shell_NotifyIconW(opcode(verb), &nid) }.as_bool();
        if !accepted {
            bail!("Shell_NotifyIconW {:?} rejected for icon {}", verb, record.id);
        }
        Ok(())
    }
}
