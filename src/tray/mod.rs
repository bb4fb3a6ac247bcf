//! Notification-area presence: message window, icon, context menu, and the
//! actions bound to them.

pub mod icon;
pub mod menu;
pub mod router;
pub mod shell;
pub mod window;

use crate::engine::AutoHideEngine;
use crate::i18n::Localizer;
use crate::instance::{InstanceGuard, InstanceLock};
use crate::paths::UrlLauncher;
use crate::process::ProcessControl;
use crate::settings::SettingsStore;
use crate::theme::{SubscriptionId, ThemeWatcher};
use anyhow::{Context, Result};
use icon::{IconResourceProvider, TrayIcon};
use menu::{ContextMenu, MenuCommand, MenuLabels, MenuToggleState, PopupHost};
use router::{CallbackQueue, CallbackRouter, RoutedKind, TrayEvent};
use shell::NotifyShell;
use std::rc::Rc;
use std::time::Duration;
use window::{MessageWindow, WindowSystem};

pub const PROJECT_URL: &str = "https://github.com/ChanpleCai/SmartTaskbar";

#[derive(Debug, Clone)]
pub struct TrayOptions {
    pub class_name: String,
    pub window_title: String,
    pub tooltip: String,
    pub icon_id: u32,
    pub callback_message: u32,
    pub theme_message: u32,
    pub exit_grace: Duration,
}

impl Default for TrayOptions {
    fn default() -> Self {
        Self {
            class_name: "SmartTaskbarTrayWindow".into(),
            window_title: "SmartTaskbar Tray Window".into(),
            tooltip: "SmartTaskbar".into(),
            icon_id: 1,
            callback_message: router::TRAY_CALLBACK_MESSAGE,
            theme_message: router::THEME_CHANGED_MESSAGE,
            exit_grace: Duration::from_millis(500),
        }
    }
}

/// Everything the tray talks to. Platform pieces and collaborators alike sit
/// behind traits so the controller runs unchanged against fakes.
#[derive(Clone)]
pub struct TrayDeps {
    pub windows: Rc<dyn WindowSystem>,
    pub shell: Rc<dyn NotifyShell>,
    pub popup: Rc<dyn PopupHost>,
    pub engine: Rc<dyn AutoHideEngine>,
    pub settings: Rc<dyn SettingsStore>,
    pub theme: Rc<dyn ThemeWatcher>,
    pub icons: Rc<dyn IconResourceProvider>,
    pub localizer: Rc<dyn Localizer>,
    pub launcher: Rc<dyn UrlLauncher>,
    pub process: Rc<dyn ProcessControl>,
}

/// The window and the shell icon registered against it. Released together,
/// icon first, since removing the icon needs the window handle.
struct TrayPresence {
    icon: Option<TrayIcon>,
    window: MessageWindow,
}

impl TrayPresence {
    fn release(&mut self) {
        if let Some(icon) = self.icon.take() {
            icon.hide();
        }
        self.window.destroy();
    }
}

impl Drop for TrayPresence {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct TrayController {
    deps: TrayDeps,
    options: TrayOptions,
    queue: CallbackQueue,
    menu: ContextMenu,
    presence: TrayPresence,
    theme_subscription: Option<SubscriptionId>,
    exited: bool,
}

impl TrayController {
    pub fn new(deps: TrayDeps, options: TrayOptions) -> Result<Self> {
        let labels = MenuLabels::acquire(deps.localizer.as_ref());

        let queue = CallbackQueue::new();
        let router = CallbackRouter::new(options.callback_message, options.theme_message, queue.clone());
        let window = MessageWindow::create(
            Rc::clone(&deps.windows),
            &options.class_name,
            &options.window_title,
            router,
        )?;
        let handle = window
            .handle()
            .context("Message window has no handle")?;

        let menu = ContextMenu::build(&labels);

        let icon = TrayIcon::new(
            Rc::clone(&deps.shell),
            Rc::clone(&deps.icons),
            handle,
            options.icon_id,
            options.callback_message,
            options.tooltip.clone(),
        );
        if !icon.show(deps.theme.is_light_theme()) {
            log::warn!("Tray icon not registered; continuing without it");
        }
        let presence = TrayPresence {
            icon: Some(icon),
            window,
        };

        let poster = deps.windows.message_poster(handle, options.theme_message);
        let theme_subscription = match deps.theme.subscribe(poster) {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Theme changes will not update the tray icon: {:#}", e);
                None
            }
        };

        log::info!("Tray ready");
        Ok(Self {
            deps,
            options,
            queue,
            menu,
            presence,
            theme_subscription,
            exited: false,
        })
    }

    pub fn queue(&self) -> &CallbackQueue {
        &self.queue
    }

    pub fn menu(&self) -> &ContextMenu {
        &self.menu
    }

    pub fn has_exited(&self) -> bool {
        self.exited
    }

    /// Drains the deferred queue. Called by the pump after each dispatched
    /// message has fully returned.
    pub fn run_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.queue.pop() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    pub fn handle(&mut self, event: TrayEvent) {
        if self.exited {
            log::debug!("Ignoring {:?} after exit", event);
            return;
        }

        match event {
            TrayEvent::Shell(RoutedKind::RightClick) => self.show_context_menu(),
            TrayEvent::Shell(RoutedKind::DoubleClick) => self.on_double_click(),
            TrayEvent::Shell(RoutedKind::Other) => {}
            TrayEvent::ThemeChanged => self.on_theme_changed(),
        }
    }

    fn current_toggle_state(&self) -> MenuToggleState {
        MenuToggleState {
            animation_enabled: self.deps.engine.is_animation_enabled(),
            auto_mode_enabled: self.deps.settings.auto_mode_enabled(),
            show_bar_on_exit_enabled: self.deps.settings.show_bar_on_exit(),
        }
    }

    fn show_context_menu(&mut self) {
        let Some(owner) = self.presence.window.handle() else {
            return;
        };

        let state = self.current_toggle_state();
        let popup = Rc::clone(&self.deps.popup);
        if let Some(command) = self.menu.refresh_and_show(state, popup.as_ref(), owner) {
            self.on_menu_command(command);
        }
    }

    fn on_double_click(&mut self) {
        if let Err(e) = self.deps.settings.set_auto_mode_enabled(false) {
            log::warn!("Failed to turn auto mode off: {:#}", e);
        }
        self.deps.engine.recompute_and_apply();
        self.hide_bar_if_warranted();
    }

    fn on_theme_changed(&mut self) {
        let is_light = self.deps.theme.is_light_theme();
        log::debug!("Theme changed, light = {}", is_light);
        if let Some(icon) = &self.presence.icon {
            icon.update_for_theme(is_light);
        }
    }

    pub fn on_menu_command(&mut self, command: MenuCommand) {
        log::debug!("Menu command: {:?}", command);
        match command {
            MenuCommand::About => {
                if let Err(e) = self.deps.launcher.open(PROJECT_URL) {
                    log::warn!("{:#}", e);
                }
            }
            MenuCommand::Animation => {
                let enabled = self.deps.engine.toggle_animation();
                self.menu.set_checked(MenuCommand::Animation, enabled);
            }
            MenuCommand::AutoMode => {
                let settings = Rc::clone(&self.deps.settings);
                let result = if settings.auto_mode_enabled() {
                    settings.set_auto_mode_enabled(false).map(|()| self.hide_bar_if_warranted())
                } else {
                    settings.set_auto_mode_enabled(true)
                };
                if let Err(e) = result {
                    log::warn!("Failed to save auto mode: {:#}", e);
                }
                self.menu.set_checked(MenuCommand::AutoMode, settings.auto_mode_enabled());
            }
            MenuCommand::ShowBarOnExit => {
                let settings = Rc::clone(&self.deps.settings);
                if let Err(e) = settings.set_show_bar_on_exit(!settings.show_bar_on_exit()) {
                    log::warn!("Failed to save show-bar-on-exit: {:#}", e);
                }
                self.menu.set_checked(MenuCommand::ShowBarOnExit, settings.show_bar_on_exit());
            }
            MenuCommand::Exit => self.exit(),
        }
    }

    fn hide_bar_if_warranted(&self) {
        if self.deps.engine.is_bar_currently_auto_hidden() {
            self.deps.engine.hide_bar_now();
        }
    }

    /// Leaves the taskbar in the state the user asked for, removes the tray
    /// presence, and schedules a hard process kill. Runs at most once.
    pub fn exit(&mut self) {
        if self.exited {
            return;
        }
        self.exited = true;
        log::info!("Exiting");

        if self.deps.settings.show_bar_on_exit() {
            self.deps.engine.cancel_pending_auto_hide();
        } else {
            self.hide_bar_if_warranted();
        }

        self.unsubscribe_theme();
        self.presence.release();
        self.deps.process.schedule_termination(self.options.exit_grace);
    }

    fn unsubscribe_theme(&mut self) {
        if let Some(id) = self.theme_subscription.take() {
            self.deps.theme.unsubscribe(id);
        }
    }
}

impl Drop for TrayController {
    fn drop(&mut self) {
        self.unsubscribe_theme();
    }
}

/// The tray together with the single-instance guard that admitted it.
pub struct RunningTray {
    pub controller: TrayController,
    _guard: InstanceGuard,
}

/// Applies the single-instance gate, then builds the tray. Returns `None`
/// without touching the window system or the shell when `key` is taken.
pub fn launch(
    lock: &dyn InstanceLock,
    key: &str,
    deps: TrayDeps,
    options: TrayOptions,
) -> Result<Option<RunningTray>> {
    let Some(guard) = lock.try_acquire(key)? else {
        log::info!("Another instance is already running");
        return Ok(None);
    };

    let controller = TrayController::new(deps, options)?;
    Ok(Some(RunningTray {
        controller,
        _guard: guard,
    }))
}
