//! Records and verbs of the shell notification icon protocol.
//!
//! The native encoding lives in the platform backend; this module owns the
//! field table so callers cannot send fields they did not mean to change.

use super::window::WindowHandle;
use anyhow::Result;
use bitflags::bitflags;
use std::fmt;

/// Capacity of the tooltip buffer in UTF-16 units, terminator included.
pub const TOOLTIP_CAPACITY: usize = 128;

bitflags! {
    /// Which `IconRecord` fields the shell should read.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IconFlags: u32 {
        const MESSAGE = 0x1;
        const ICON = 0x2;
        const TIP = 0x4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyVerb {
    Add = 0,
    Modify = 1,
    Delete = 2,
}

/// Opaque handle to an icon bitmap owned by an icon provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IconHandle(pub isize);

/// Fixed-size, NUL-terminated UTF-16 tooltip buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Tooltip([u16; TOOLTIP_CAPACITY]);

impl Tooltip {
    /// Encodes `text`, truncating so the terminator always fits.
    pub fn new(text: &str) -> Self {
        let mut buf = [0u16; TOOLTIP_CAPACITY];
        let mut len = 0;
        for unit in text.encode_utf16() {
            if len == TOOLTIP_CAPACITY - 1 {
                break;
            }
            buf[len] = unit;
            len += 1;
        }
        // Never leave half a surrogate pair behind the cut.
        if len > 0 && (0xD800..0xDC00).contains(&buf[len - 1]) {
            buf[len - 1] = 0;
        }
        Self(buf)
    }

    pub fn units(&self) -> &[u16; TOOLTIP_CAPACITY] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.iter().position(|&u| u == 0).unwrap_or(TOOLTIP_CAPACITY)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn text(&self) -> String {
        String::from_utf16_lossy(&self.0[..self.len()])
    }
}

impl Default for Tooltip {
    fn default() -> Self {
        Self([0; TOOLTIP_CAPACITY])
    }
}

impl fmt::Debug for Tooltip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tooltip({:?})", self.text())
    }
}

/// One call's worth of the notification icon record. Only the fields named
/// by `flags` are significant to the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRecord {
    pub window: WindowHandle,
    pub id: u32,
    pub flags: IconFlags,
    pub callback_message: u32,
    pub icon: Option<IconHandle>,
    pub tooltip: Tooltip,
}

impl IconRecord {
    pub fn add(
        window: WindowHandle,
        id: u32,
        icon: IconHandle,
        tooltip: &str,
        callback_message: u32,
    ) -> Self {
        Self {
            window,
            id,
            flags: IconFlags::ICON | IconFlags::MESSAGE | IconFlags::TIP,
            callback_message,
            icon: Some(icon),
            tooltip: Tooltip::new(tooltip),
        }
    }

    pub fn modify_icon(window: WindowHandle, id: u32, icon: IconHandle) -> Self {
        Self {
            window,
            id,
            flags: IconFlags::ICON,
            callback_message: 0,
            icon: Some(icon),
            tooltip: Tooltip::default(),
        }
    }

    pub fn delete(window: WindowHandle, id: u32) -> Self {
        Self {
            window,
            id,
            flags: IconFlags::empty(),
            callback_message: 0,
            icon: None,
            tooltip: Tooltip::default(),
        }
    }
}

pub trait NotifyShell {
    fn notify(&self, verb: NotifyVerb, record: &IconRecord) -> Result<()>;
}
