use super::shell::{IconHandle, IconRecord, NotifyShell, NotifyVerb};
use super::window::WindowHandle;
use std::cell::Cell;
use std::rc::Rc;

pub const ICON_SIZE: u32 = 32;

pub trait IconResourceProvider {
    fn icon_for_theme(&self, is_light: bool) -> IconHandle;
}

/// Renders the tray glyph as RGBA: a screen outline with a bar along the
/// bottom edge. Light themes get a black glyph, dark themes a white one.
pub fn render_glyph(is_light: bool, size: u32) -> Vec<u8> {
    let ink: [u8; 3] = if is_light { [0, 0, 0] } else { [255, 255, 255] };
    let mut data = vec![0u8; (size * size * 4) as usize];

    let margin = (size / 8).max(1);
    let stroke = (size / 16).max(1);
    let bar_height = (size / 6).max(2);
    // Sizes too small for the frame come out fully transparent.
    let (left, right) = (margin, size.saturating_sub(margin + 1));
    let (top, bottom) = (margin + size / 8, size.saturating_sub(margin + 1));

    for y in 0..size {
        for x in 0..size {
            let inside = x >= left && x <= right && y >= top && y <= bottom;
            if !inside {
                continue;
            }

            let on_frame = x < left + stroke
                || x > right.saturating_sub(stroke)
                || y < top + stroke
                || y > bottom.saturating_sub(stroke);
            let on_bar = y > bottom.saturating_sub(bar_height);

            if on_frame || on_bar {
                let idx = ((y * size + x) * 4) as usize;
                data[idx..idx + 3].copy_from_slice(&ink);
                data[idx + 3] = 255;
            }
        }
    }

    data
}

/// The visible notification icon. Identity and window stay fixed for the
/// lifetime of the value so every verb addresses the same shell icon.
pub struct TrayIcon {
    shell: Rc<dyn NotifyShell>,
    icons: Rc<dyn IconResourceProvider>,
    window: WindowHandle,
    id: u32,
    callback_message: u32,
    tooltip: String,
    registered: Cell<bool>,
}

impl TrayIcon {
    pub fn new(
        shell: Rc<dyn NotifyShell>,
        icons: Rc<dyn IconResourceProvider>,
        window: WindowHandle,
        id: u32,
        callback_message: u32,
        tooltip: impl Into<String>,
    ) -> Self {
        Self {
            shell,
            icons,
            window,
            id,
            callback_message,
            tooltip: tooltip.into(),
            registered: Cell::new(false),
        }
    }

    /// True while the shell holds an icon added by this value.
    pub fn is_registered(&self) -> bool {
        self.registered.get()
    }

    pub fn show(&self, theme_is_light: bool) -> bool {
        let icon = self.icons.icon_for_theme(theme_is_light);
        let record = IconRecord::add(self.window, self.id, icon, &self.tooltip, self.callback_message);
        let added = self.send(NotifyVerb::Add, &record);
        self.registered.set(added);
        added
    }

    /// Swaps the glyph. An icon the shell never accepted gets a full Add
    /// instead, so a notification area that was not ready at startup
    /// picks the icon up on the next theme change.
    pub fn update_for_theme(&self, theme_is_light: bool) -> bool {
        if !self.registered.get() {
            log::debug!("Icon {} not registered, retrying add", self.id);
            return self.show(theme_is_light);
        }
        let icon = self.icons.icon_for_theme(theme_is_light);
        let record = IconRecord::modify_icon(self.window, self.id, icon);
        self.send(NotifyVerb::Modify, &record)
    }

    pub fn hide(&self) -> bool {
        let record = IconRecord::delete(self.window, self.id);
        self.registered.set(false);
        self.send(NotifyVerb::Delete, &record)
    }

    fn send(&self, verb: NotifyVerb, record: &IconRecord) -> bool {
        match self.shell.notify(verb, record) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Notification icon {:?} failed: {:#}", verb, e);
                false
            }
        }
    }
}
