//! Classification of raw window messages and deferral onto the UI queue.
//!
//! The window procedure must not act on shell callbacks directly: opening the
//! context menu pumps a nested message loop, which must never run underneath
//! the dispatch frame that delivered the click. Matched messages are queued
//! here and drained by the pump loop once that frame has returned.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

pub const WM_USER: u32 = 0x0400;
pub const TRAY_CALLBACK_MESSAGE: u32 = WM_USER + 1;
pub const THEME_CHANGED_MESSAGE: u32 = WM_USER + 2;

const WM_LBUTTONDBLCLK: u32 = 0x0203;
const WM_RBUTTONDOWN: u32 = 0x0204;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutedKind {
    RightClick,
    DoubleClick,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutedMessage {
    pub kind: RoutedKind,
}

impl RoutedMessage {
    /// Decodes the mouse message carried in the low word of the payload.
    pub fn decode(lparam: isize) -> Self {
        let kind = match (lparam & 0xFFFF) as u32 {
            WM_RBUTTONDOWN => RoutedKind::RightClick,
            WM_LBUTTONDBLCLK => RoutedKind::DoubleClick,
            _ => RoutedKind::Other,
        };
        Self { kind }
    }

    pub fn is_inert(&self) -> bool {
        self.kind == RoutedKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayEvent {
    Shell(RoutedKind),
    ThemeChanged,
}

/// What the window procedure should do after routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Not ours; hand it to the default window procedure.
    Forward,
    /// Ours, but nothing to do.
    Inert,
    Deferred(TrayEvent),
}

/// Single-threaded FIFO of events waiting for the next pump tick.
#[derive(Clone, Default)]
pub struct CallbackQueue {
    inner: Rc<RefCell<VecDeque<TrayEvent>>>,
}

impl CallbackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never blocks. Returns false if the queue is busy.
    pub fn post(&self, event: TrayEvent) -> bool {
        match self.inner.try_borrow_mut() {
            Ok(mut queue) => {
                queue.push_back(event);
                true
            }
            Err(_) => false,
        }
    }

    pub fn pop(&self) -> Option<TrayEvent> {
        self.inner.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct MessageRoute {
    pub message: u32,
    pub decode: fn(isize) -> Option<TrayEvent>,
}

pub struct CallbackRouter {
    routes: Vec<MessageRoute>,
    queue: CallbackQueue,
}

impl CallbackRouter {
    pub fn new(callback_message: u32, theme_message: u32, queue: CallbackQueue) -> Self {
        let routes = vec![
            MessageRoute {
                message: callback_message,
                decode: |lparam| {
                    let routed = RoutedMessage::decode(lparam);
                    (!routed.is_inert()).then_some(TrayEvent::Shell(routed.kind))
                },
            },
            MessageRoute {
                message: theme_message,
                decode: |_| Some(TrayEvent::ThemeChanged),
            },
        ];
        Self { routes, queue }
    }

    pub fn route(&self, message: u32, _wparam: usize, lparam: isize) -> RouteOutcome {
        let Some(route) = self.routes.iter().find(|r| r.message == message) else {
            return RouteOutcome::Forward;
        };

        let Some(event) = (route.decode)(lparam) else {
            return RouteOutcome::Inert;
        };

        if !self.queue.post(event) {
            log::warn!("Callback queue busy, dropping {:?}", event);
            return RouteOutcome::Inert;
        }
        RouteOutcome::Deferred(event)
    }
}

/// Runs routing for the window procedure. A panic must not unwind across
/// the native callback, so it is logged and the message is forwarded.
pub fn guarded(route: impl FnOnce() -> RouteOutcome) -> RouteOutcome {
    catch_unwind(AssertUnwindSafe(route)).unwrap_or_else(|_| {
        log::error!("Panic while routing a window message; forwarding it");
        RouteOutcome::Forward
    })
}
