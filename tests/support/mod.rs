#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use smart_taskbar::engine::AutoHideEngine;
use smart_taskbar::i18n::BuiltinLocalizer;
use smart_taskbar::paths::UrlLauncher;
use smart_taskbar::process::ProcessControl;
use smart_taskbar::settings::SettingsStore;
use smart_taskbar::theme::{SubscriptionId, ThemeCallback, ThemeWatcher};
use smart_taskbar::tray::icon::IconResourceProvider;
use smart_taskbar::tray::menu::{MenuCommand, MenuItemDescriptor, Point, PopupHost};
use smart_taskbar::tray::router::{CallbackRouter, RouteOutcome};
use smart_taskbar::tray::shell::{IconFlags, IconHandle, IconRecord, NotifyShell, NotifyVerb};
use smart_taskbar::tray::window::{ClassRegistration, MessagePoster, WindowHandle, WindowSystem};
use smart_taskbar::tray::TrayDeps;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const LIGHT_ICON: IconHandle = IconHandle(100);
pub const DARK_ICON: IconHandle = IconHandle(200);

/// Ordered record of side effects across every fake.
#[derive(Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.borrow().iter().filter(|e| *e == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == entry)
    }
}

#[derive(Default)]
pub struct FakeWindows {
    pub journal: Journal,
    pub fail_register: Cell<bool>,
    pub fail_create: Cell<bool>,
    registered: RefCell<HashSet<String>>,
    next_handle: Cell<isize>,
    routers: RefCell<HashMap<isize, CallbackRouter>>,
    pub created: RefCell<Vec<WindowHandle>>,
    pub destroyed: RefCell<Vec<WindowHandle>>,
    posted: Arc<Mutex<Vec<(isize, u32)>>>,
}

impl FakeWindows {
    pub fn live_window(&self) -> Option<WindowHandle> {
        let destroyed = self.destroyed.borrow();
        self.created
            .borrow()
            .iter()
            .copied()
            .find(|w| !destroyed.contains(w))
    }

    /// Feeds a message through the window's router, as the window procedure
    /// would. Destroyed windows forward everything.
    pub fn deliver(&self, window: WindowHandle, message: u32, lparam: isize) -> RouteOutcome {
        self.routers
            .borrow()
            .get(&window.as_raw())
            .map_or(RouteOutcome::Forward, |router| router.route(message, 0, lparam))
    }

    /// Delivers messages posted from other threads, in order.
    pub fn deliver_posted(&self) -> usize {
        let posted: Vec<_> = self.posted.lock().unwrap().drain(..).collect();
        for (raw, message) in &posted {
            if let Some(window) = WindowHandle::from_raw(*raw) {
                self.deliver(window, *message, 0);
            }
        }
        posted.len()
    }
}

impl WindowSystem for FakeWindows {
    fn register_class(&self, class_name: &str) -> Result<ClassRegistration> {
        if self.fail_register.get() {
            bail!("class registration refused");
        }
        self.journal.push("windows.register");
        if self.registered.borrow_mut().insert(class_name.to_string()) {
            Ok(ClassRegistration::Registered)
        } else {
            Ok(ClassRegistration::AlreadyRegistered)
        }
    }

    fn create_message_window(
        &self,
        _class_name: &str,
        _title: &str,
        router: CallbackRouter,
    ) -> Result<WindowHandle> {
        if self.fail_create.get() {
            bail!("window creation refused");
        }
        let raw = self.next_handle.get() + 0x10;
        self.next_handle.set(raw);
        let handle = WindowHandle::from_raw(raw).ok_or_else(|| anyhow!("null handle"))?;
        self.routers.borrow_mut().insert(raw, router);
        self.created.borrow_mut().push(handle);
        self.journal.push("windows.create");
        Ok(handle)
    }

    fn destroy_window(&self, window: WindowHandle) -> Result<()> {
        self.routers.borrow_mut().remove(&window.as_raw());
        self.destroyed.borrow_mut().push(window);
        self.journal.push("windows.destroy");
        Ok(())
    }

    fn message_poster(&self, window: WindowHandle, message: u32) -> MessagePoster {
        let posted = Arc::clone(&self.posted);
        let raw = window.as_raw();
        Box::new(move || posted.lock().unwrap().push((raw, message)))
    }
}

/// Shell-side state of one registered icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellIcon {
    pub icon: Option<IconHandle>,
    pub tooltip: String,
    pub callback_message: u32,
}

/// Keeps icons keyed by (window, id) and applies only the fields a record
/// flags, the way the notification area does.
#[derive(Default)]
pub struct FakeShell {
    pub journal: Journal,
    pub reject_add: Cell<bool>,
    pub icons: RefCell<HashMap<(isize, u32), ShellIcon>>,
    pub calls: RefCell<Vec<(NotifyVerb, IconRecord)>>,
}

impl FakeShell {
    pub fn icon(&self, window: WindowHandle, id: u32) -> Option<ShellIcon> {
        self.icons.borrow().get(&(window.as_raw(), id)).cloned()
    }

    pub fn verbs(&self) -> Vec<NotifyVerb> {
        self.calls.borrow().iter().map(|(verb, _)| *verb).collect()
    }
}

impl NotifyShell for FakeShell {
    fn notify(&self, verb: NotifyVerb, record: &IconRecord) -> Result<()> {
        self.calls.borrow_mut().push((verb, record.clone()));
        self.journal.push(format!("shell.{:?}", verb).to_lowercase());

        let key = (record.window.as_raw(), record.id);
        let mut icons = self.icons.borrow_mut();
        match verb {
            NotifyVerb::Add => {
                if self.reject_add.get() || icons.contains_key(&key) {
                    bail!("add rejected");
                }
                let mut entry = ShellIcon {
                    icon: None,
                    tooltip: String::new(),
                    callback_message: 0,
                };
                apply(&mut entry, record);
                icons.insert(key, entry);
            }
            NotifyVerb::Modify => {
                let entry = icons.get_mut(&key).ok_or_else(|| anyhow!("no such icon"))?;
                apply(entry, record);
            }
            NotifyVerb::Delete => {
                icons.remove(&key).ok_or_else(|| anyhow!("no such icon"))?;
            }
        }
        Ok(())
    }
}

fn apply(entry: &mut ShellIcon, record: &IconRecord) {
    if record.flags.contains(IconFlags::ICON) {
        entry.icon = record.icon;
    }
    if record.flags.contains(IconFlags::TIP) {
        entry.tooltip = record.tooltip.text();
    }
    if record.flags.contains(IconFlags::MESSAGE) {
        entry.callback_message = record.callback_message;
    }
}

/// Records every display and answers from a script of choices.
#[derive(Default)]
pub struct FakePopup {
    pub cursor: Cell<Point>,
    pub shown: RefCell<Vec<(Vec<MenuItemDescriptor>, Point)>>,
    pub answers: RefCell<VecDeque<Option<MenuCommand>>>,
}

impl FakePopup {
    pub fn answer(&self, choice: Option<MenuCommand>) {
        self.answers.borrow_mut().push_back(choice);
    }

    pub fn display_count(&self) -> usize {
        self.shown.borrow().len()
    }

    pub fn checked_in_display(&self, display: usize, command: MenuCommand) -> Option<bool> {
        self.shown.borrow().get(display).and_then(|(items, _)| {
            items
                .iter()
                .find(|item| item.command() == Some(command))
                .map(|item| item.is_checked())
        })
    }
}

impl PopupHost for FakePopup {
    fn cursor_position(&self) -> Point {
        self.cursor.get()
    }

    fn track_popup(
        &self,
        _owner: WindowHandle,
        items: &[MenuItemDescriptor],
        at: Point,
    ) -> Option<MenuCommand> {
        self.shown.borrow_mut().push((items.to_vec(), at));
        self.answers.borrow_mut().pop_front().flatten()
    }
}

#[derive(Default)]
pub struct FakeEngine {
    pub journal: Journal,
    pub auto_hidden: Cell<bool>,
    pub animation: Cell<bool>,
}

impl AutoHideEngine for FakeEngine {
    fn is_bar_currently_auto_hidden(&self) -> bool {
        self.auto_hidden.get()
    }

    fn is_animation_enabled(&self) -> bool {
        self.animation.get()
    }

    fn toggle_animation(&self) -> bool {
        self.animation.set(!self.animation.get());
        self.journal.push("engine.toggle_animation");
        self.animation.get()
    }

    fn recompute_and_apply(&self) {
        self.journal.push("engine.recompute");
    }

    fn cancel_pending_auto_hide(&self) {
        self.journal.push("engine.cancel");
    }

    fn hide_bar_now(&self) {
        self.journal.push("engine.hide");
    }
}

pub struct FakeSettings {
    pub auto_mode: Cell<bool>,
    pub show_bar_on_exit: Cell<bool>,
    pub fail_writes: Cell<bool>,
}

impl Default for FakeSettings {
    fn default() -> Self {
        Self {
            auto_mode: Cell::new(true),
            show_bar_on_exit: Cell::new(true),
            fail_writes: Cell::new(false),
        }
    }
}

impl SettingsStore for FakeSettings {
    fn auto_mode_enabled(&self) -> bool {
        self.auto_mode.get()
    }

    fn set_auto_mode_enabled(&self, enabled: bool) -> Result<()> {
        if self.fail_writes.get() {
            bail!("read-only settings");
        }
        self.auto_mode.set(enabled);
        Ok(())
    }

    fn show_bar_on_exit(&self) -> bool {
        self.show_bar_on_exit.get()
    }

    fn set_show_bar_on_exit(&self, enabled: bool) -> Result<()> {
        if self.fail_writes.get() {
            bail!("read-only settings");
        }
        self.show_bar_on_exit.set(enabled);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTheme {
    pub journal: Journal,
    pub light: Cell<bool>,
    pub fail_subscribe: Cell<bool>,
    subscribers: RefCell<Vec<(SubscriptionId, ThemeCallback)>>,
    next_id: Cell<u64>,
}

impl FakeTheme {
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Flips the scheme and notifies every subscriber.
    pub fn switch_to(&self, light: bool) {
        self.light.set(light);
        for (_, callback) in self.subscribers.borrow().iter() {
            callback();
        }
    }
}

impl ThemeWatcher for FakeTheme {
    fn is_light_theme(&self) -> bool {
        self.light.get()
    }

    fn subscribe(&self, callback: ThemeCallback) -> Result<SubscriptionId> {
        if self.fail_subscribe.get() {
            bail!("no theme notifications");
        }
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push((id, callback));
        self.journal.push("theme.subscribe");
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.borrow_mut().retain(|(s, _)| *s != id);
        self.journal.push("theme.unsubscribe");
    }
}

pub struct FakeIcons;

impl IconResourceProvider for FakeIcons {
    fn icon_for_theme(&self, is_light: bool) -> IconHandle {
        if is_light {
            LIGHT_ICON
        } else {
            DARK_ICON
        }
    }
}

#[derive(Default)]
pub struct FakeLauncher {
    pub opened: RefCell<Vec<String>>,
}

impl UrlLauncher for FakeLauncher {
    fn open(&self, url: &str) -> Result<()> {
        self.opened.borrow_mut().push(url.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeProcess {
    pub journal: Journal,
    pub scheduled: RefCell<Vec<Duration>>,
}

impl ProcessControl for FakeProcess {
    fn schedule_termination(&self, grace: Duration) {
        self.scheduled.borrow_mut().push(grace);
        self.journal.push("process.terminate");
    }
}

/// Every fake, sharing one journal, plus the wiring into `TrayDeps`.
pub struct Harness {
    pub journal: Journal,
    pub windows: Rc<FakeWindows>,
    pub shell: Rc<FakeShell>,
    pub popup: Rc<FakePopup>,
    pub engine: Rc<FakeEngine>,
    pub settings: Rc<FakeSettings>,
    pub theme: Rc<FakeTheme>,
    pub launcher: Rc<FakeLauncher>,
    pub process: Rc<FakeProcess>,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::default();
        Self {
            windows: Rc::new(FakeWindows {
                journal: journal.clone(),
                ..Default::default()
            }),
            shell: Rc::new(FakeShell {
                journal: journal.clone(),
                ..Default::default()
            }),
            popup: Rc::new(FakePopup::default()),
            engine: Rc::new(FakeEngine {
                journal: journal.clone(),
                ..Default::default()
            }),
            settings: Rc::new(FakeSettings::default()),
            theme: Rc::new(FakeTheme {
                journal: journal.clone(),
                ..Default::default()
            }),
            launcher: Rc::new(FakeLauncher::default()),
            process: Rc::new(FakeProcess {
                journal: journal.clone(),
                ..Default::default()
            }),
            journal,
        }
    }

    pub fn deps(&self) -> TrayDeps {
        TrayDeps {
            windows: self.windows.clone(),
            shell: self.shell.clone(),
            popup: self.popup.clone(),
            engine: self.engine.clone(),
            settings: self.settings.clone(),
            theme: self.theme.clone(),
            icons: Rc::new(FakeIcons),
            localizer: Rc::new(BuiltinLocalizer::english()),
            launcher: self.launcher.clone(),
            process: self.process.clone(),
        }
    }
}
