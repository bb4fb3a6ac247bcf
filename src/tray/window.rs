//! The message-only window that receives the notification icon's callbacks.

use super::router::CallbackRouter;
use anyhow::{Context, Result};
use std::num::NonZeroIsize;
use std::rc::Rc;

/// Opaque native window handle. Never null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(NonZeroIsize);

impl WindowHandle {
    pub fn from_raw(raw: isize) -> Option<Self> {
        NonZeroIsize::new(raw).map(Self)
    }

    pub fn as_raw(self) -> isize {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassRegistration {
    Registered,
    AlreadyRegistered,
}

/// Callback that posts a private message to a window from any thread.
pub type MessagePoster = Box<dyn Fn() + Send + 'static>;

pub trait WindowSystem {
    /// Registers the window class. Registering the same name twice must
    /// report `AlreadyRegistered` instead of failing.
    fn register_class(&self, class_name: &str) -> Result<ClassRegistration>;

    /// Creates a message-only window whose messages are fed to `router`.
    fn create_message_window(
        &self,
        class_name: &str,
        title: &str,
        router: CallbackRouter,
    ) -> Result<WindowHandle>;

    fn destroy_window(&self, window: WindowHandle) -> Result<()>;

    fn message_poster(&self, window: WindowHandle, message: u32) -> MessagePoster;
}

/// Owns one message-only window and destroys it at most once.
pub struct MessageWindow {
    system: Rc<dyn WindowSystem>,
    handle: Option<WindowHandle>,
}

impl MessageWindow {
    pub fn create(
        system: Rc<dyn WindowSystem>,
        class_name: &str,
        title: &str,
        router: CallbackRouter,
    ) -> Result<Self> {
        let registration = system
            .register_class(class_name)
            .with_context(|| format!("Failed to register window class {}", class_name))?;
        if registration == ClassRegistration::AlreadyRegistered {
            log::debug!("Window class {} already registered", class_name);
        }

        let handle = system
            .create_message_window(class_name, title, router)
            .context("Failed to create message window")?;
        log::debug!("Created message window {:#x}", handle.as_raw());

        Ok(Self {
            system,
            handle: Some(handle),
        })
    }

    pub fn handle(&self) -> Option<WindowHandle> {
        self.handle
    }

    /// Returns true only for the call that actually released the window.
    pub fn destroy(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return false;
        };

        if let Err(e) = self.system.destroy_window(handle) {
            log::warn!("Failed to destroy message window: {:#}", e);
        }
        true
    }
}

impl Drop for MessageWindow {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tray::router::CallbackQueue;
    use anyhow::anyhow;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct StubWindows {
        fail_create: bool,
        registered: RefCell<Vec<String>>,
        destroyed: Cell<usize>,
    }

    impl WindowSystem for StubWindows {
        fn register_class(&self, class_name: &str) -> Result<ClassRegistration> {
            let mut registered = self.registered.borrow_mut();
            if registered.iter().any(|c| c == class_name) {
                return Ok(ClassRegistration::AlreadyRegistered);
            }
            registered.push(class_name.to_string());
            Ok(ClassRegistration::Registered)
        }

        fn create_message_window(&self, _: &str, _: &str, _: CallbackRouter) -> Result<WindowHandle> {
            if self.fail_create {
                return Err(anyhow!("no window for you"));
            }
            Ok(WindowHandle::from_raw(0x42).unwrap())
        }

        fn destroy_window(&self, _: WindowHandle) -> Result<()> {
            self.destroyed.set(self.destroyed.get() + 1);
            Ok(())
        }

        fn message_poster(&self, _: WindowHandle, _: u32) -> MessagePoster {
            Box::new(|| {})
        }
    }

    fn router() -> CallbackRouter {
        CallbackRouter::new(0x401, 0x402, CallbackQueue::new())
    }

    #[test]
    fn null_handle_is_unrepresentable() {
        assert!(WindowHandle::from_raw(0).is_none());
        assert_eq!(WindowHandle::from_raw(-3).unwrap().as_raw(), -3);
    }

    #[test]
    fn second_registration_is_tolerated() {
        // Arrange
        let system = Rc::new(StubWindows::default());

        // Act
        let first = MessageWindow::create(system.clone(), "Cls", "t", router());
        let second = MessageWindow::create(system.clone(), "Cls", "t", router());

        // Assert
        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(system.registered.borrow().len(), 1);
    }

    #[test]
    fn destroy_releases_exactly_once() {
        // Arrange
        let system = Rc::new(StubWindows::default());
        let mut window = MessageWindow::create(system.clone(), "Cls", "t", router()).unwrap();

        // Act
        let first = window.destroy();
        let second = window.destroy();
        drop(window);

        // Assert
        assert!(first);
        assert!(!second);
        assert_eq!(system.destroyed.get(), 1);
    }

    #[test]
    fn drop_destroys_live_window() {
        let system = Rc::new(StubWindows::default());
        let window = MessageWindow::create(system.clone(), "Cls", "t", router()).unwrap();

        drop(window);

        assert_eq!(system.destroyed.get(), 1);
    }

    #[test]
    fn creation_failure_is_an_error() {
        let system = Rc::new(StubWindows {
            fail_create: true,
            ..StubWindows::default()
        });

        let result = MessageWindow::create(system, "Cls", "t", router());

        assert!(result.is_err());
    }
}
