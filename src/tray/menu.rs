//! Fixed context menu shown from the tray icon.

use super::window::WindowHandle;
use crate::i18n::{LangKey, Localizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuCommand {
    About = 1,
    Animation = 2,
    AutoMode = 3,
    ShowBarOnExit = 4,
    Exit = 5,
}

impl MenuCommand {
    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Option<Self> {
        [
            Self::About,
            Self::Animation,
            Self::AutoMode,
            Self::ShowBarOnExit,
            Self::Exit,
        ]
        .into_iter()
        .find(|c| c.id() == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItemKind {
    Action(MenuCommand),
    Toggle { command: MenuCommand, checked: bool },
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemDescriptor {
    pub label: String,
    pub access_key: Option<char>,
    pub help_text: &'static str,
    pub kind: MenuItemKind,
}

impl MenuItemDescriptor {
    fn action(label: String, key: char, help_text: &'static str, command: MenuCommand) -> Self {
        Self {
            label,
            access_key: Some(key),
            help_text,
            kind: MenuItemKind::Action(command),
        }
    }

    fn toggle(label: String, key: char, help_text: &'static str, command: MenuCommand) -> Self {
        Self {
            label,
            access_key: Some(key),
            help_text,
            kind: MenuItemKind::Toggle {
                command,
                checked: false,
            },
        }
    }

    fn separator() -> Self {
        Self {
            label: String::new(),
            access_key: None,
            help_text: "",
            kind: MenuItemKind::Separator,
        }
    }

    pub fn command(&self) -> Option<MenuCommand> {
        match self.kind {
            MenuItemKind::Action(command) | MenuItemKind::Toggle { command, .. } => Some(command),
            MenuItemKind::Separator => None,
        }
    }

    pub fn is_checked(&self) -> bool {
        matches!(self.kind, MenuItemKind::Toggle { checked: true, .. })
    }

    /// Label with the access key marked by `&`, appended as `(&K)` when the
    /// label does not contain the key (e.g. translated labels).
    pub fn mnemonic_label(&self) -> String {
        let label = self.label.replace('&', "&&");
        let Some(key) = self.access_key else {
            return label;
        };

        let position = label
            .char_indices()
            .find(|(_, c)| c.eq_ignore_ascii_case(&key))
            .map(|(i, _)| i);
        match position {
            Some(i) => format!("{}&{}", &label[..i], &label[i..]),
            None => format!("{} (&{})", label, key.to_ascii_uppercase()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MenuToggleState {
    pub animation_enabled: bool,
    pub auto_mode_enabled: bool,
    pub show_bar_on_exit_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

pub trait PopupHost {
    fn cursor_position(&self) -> Point;

    /// Shows the menu modally and returns the chosen command, if any.
    fn track_popup(
        &self,
        owner: WindowHandle,
        items: &[MenuItemDescriptor],
        at: Point,
    ) -> Option<MenuCommand>;
}

/// Localized labels, fetched once before the menu is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLabels {
    pub about: String,
    pub animation: String,
    pub auto_mode: String,
    pub show_bar_on_exit: String,
    pub exit: String,
}

impl MenuLabels {
    pub fn acquire(strings: &dyn Localizer) -> Self {
        Self {
            about: strings.string_for(LangKey::About),
            animation: strings.string_for(LangKey::Animation),
            auto_mode: strings.string_for(LangKey::AutoMode),
            show_bar_on_exit: strings.string_for(LangKey::ShowBarOnExit),
            exit: strings.string_for(LangKey::Exit),
        }
    }
}

const ANIMATION_SLOT: usize = 1;
const AUTO_MODE_SLOT: usize = 3;
const SHOW_BAR_ON_EXIT_SLOT: usize = 5;

pub struct ContextMenu {
    items: Vec<MenuItemDescriptor>,
}

impl ContextMenu {
    pub fn build(labels: &MenuLabels) -> Self {
        let items = vec![
            MenuItemDescriptor::action(
                labels.about.clone(),
                'A',
                "Open SmartTaskbar GitHub page",
                MenuCommand::About,
            ),
            MenuItemDescriptor::toggle(
                labels.animation.clone(),
                'N',
                "Toggle taskbar animation",
                MenuCommand::Animation,
            ),
            MenuItemDescriptor::separator(),
            MenuItemDescriptor::toggle(
                labels.auto_mode.clone(),
                'U',
                "Toggle auto mode",
                MenuCommand::AutoMode,
            ),
            MenuItemDescriptor::separator(),
            MenuItemDescriptor::toggle(
                labels.show_bar_on_exit.clone(),
                'S',
                "Show taskbar on exit",
                MenuCommand::ShowBarOnExit,
            ),
            MenuItemDescriptor::action(
                labels.exit.clone(),
                'E',
                "Exit SmartTaskbar",
                MenuCommand::Exit,
            ),
        ];
        Self { items }
    }

    pub fn items(&self) -> &[MenuItemDescriptor] {
        &self.items
    }

    pub fn apply_toggle_state(&mut self, state: MenuToggleState) {
        self.set_slot(ANIMATION_SLOT, state.animation_enabled);
        self.set_slot(AUTO_MODE_SLOT, state.auto_mode_enabled);
        self.set_slot(SHOW_BAR_ON_EXIT_SLOT, state.show_bar_on_exit_enabled);
    }

    /// Applies `state`, then shows the menu at the pointer position sampled
    /// now rather than when the click was delivered.
    pub fn refresh_and_show(
        &mut self,
        state: MenuToggleState,
        host: &dyn PopupHost,
        owner: WindowHandle,
    ) -> Option<MenuCommand> {
        self.apply_toggle_state(state);
        let anchor = host.cursor_position();
        host.track_popup(owner, &self.items, anchor)
    }

    pub fn set_checked(&mut self, command: MenuCommand, value: bool) {
        for item in &mut self.items {
            if let MenuItemKind::Toggle { command: c, checked } = &mut item.kind {
                if *c == command {
                    *checked = value;
                }
            }
        }
    }

    pub fn is_checked(&self, command: MenuCommand) -> Option<bool> {
        self.items.iter().find_map(|item| match item.kind {
            MenuItemKind::Toggle { command: c, checked } if c == command => Some(checked),
            _ => None,
        })
    }

    fn set_slot(&mut self, slot: usize, value: bool) {
        match self.items.get_mut(slot).map(|item| &mut item.kind) {
            Some(MenuItemKind::Toggle { checked, .. }) => *checked = value,
            _ => log::debug!("Menu slot {} is not a toggle, skipping", slot),
        }
    }
}
