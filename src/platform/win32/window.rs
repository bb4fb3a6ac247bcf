use crate::tray::router::{guarded, CallbackRouter, RouteOutcome};
use crate::tray::window::{ClassRegistration, MessagePoster, WindowHandle, WindowSystem};
use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use widestring::U16CString;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{
    GetLastError, ERROR_CLASS_ALREADY_EXISTS, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, PostMessageW, RegisterClassExW, HWND_MESSAGE,
    WINDOW_EX_STYLE, WINDOW_STYLE, WNDCLASSEXW,
};

static REGISTERED_CLASSES: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

thread_local! {
    static ROUTERS: RefCell<HashMap<isize, CallbackRouter>> = RefCell::new(HashMap::new());
}

pub(super) fn to_hwnd(window: WindowHandle) -> HWND {
    HWND(window.as_raw() as *mut _)
}

pub struct Win32Windows {
    instance: HINSTANCE,
}

impl Win32Windows {
    pub fn new() -> Result<Self> {
        let module = unsafe { GetModuleHandleW(PCWSTR::null()) }.context("GetModuleHandleW failed")?;
        Ok(Self {
            instance: HINSTANCE(module.0),
        })
    }
}

impl WindowSystem for Win32Windows {
    fn register_class(&self, class_name: &str) -> Result<ClassRegistration> {
        let mut registered = REGISTERED_CLASSES
            .lock()
            .map_err(|_| anyhow!("Class registry poisoned"))?;
        if registered.contains(class_name) {
            return Ok(ClassRegistration::AlreadyRegistered);
        }

        let name = U16CString::from_str(class_name)?;
        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            lpfnWndProc: Some(tray_wnd_proc),
            hInstance: self.instance,
            lpszClassName: PCWSTR(name.as_ptr()),
            ..Default::default()
        };

        let atom = unsafe { RegisterClassExW(&wc) };
        let registration = if atom != 0 {
            ClassRegistration::Registered
        } else {
            let error = unsafe { GetLastError() };
            if error != ERROR_CLASS_ALREADY_EXISTS {
                bail!("RegisterClassExW failed: {:?}", error);
            }
            ClassRegistration::AlreadyRegistered
        };

        registered.insert(class_name.to_string());
        Ok(registration)
    }

    fn create_message_window(
        &self,
        class_name: &str,
        title: &str,
        router: CallbackRouter,
    ) -> Result<WindowHandle> {
        let class = U16CString::from_str(class_name)?;
        let title = U16CString::from_str(title)?;

        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                PCWSTR(class.as_ptr()),
                PCWSTR(title.as_ptr()),
                WINDOW_STYLE(0),
                0,
                0,
                0,
                0,
                HWND_MESSAGE,
                None,
                self.instance,
                None,
            )
        }
        .context("CreateWindowExW failed")?;

        let handle = WindowHandle::from_raw(hwnd.0 as isize)
            .context("CreateWindowExW returned a null window")?;
        ROUTERS.with(|routers| routers.borrow_mut().insert(handle.as_raw(), router));
        Ok(handle)
    }

    fn destroy_window(&self, window: WindowHandle) -> Result<()> {
        // DestroyWindow re-enters the window procedure, so no borrow is held here.
        let result = unsafe { DestroyWindow(to_hwnd(window)) };
        ROUTERS.with(|routers| routers.borrow_mut().remove(&window.as_raw()));
        result.context("DestroyWindow failed")
    }

    fn message_poster(&self, window: WindowHandle, message: u32) -> MessagePoster {
        let raw = window.as_raw();
        Box::new(move || unsafe {
            let _ = PostMessageW(HWND(raw as *mut _), message, WPARAM(0), LPARAM(0));
        })
    }
}

fn route(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> RouteOutcome {
    ROUTERS.with(|routers| match routers.try_borrow() {
        Ok(routers) => routers
            .get(&(hwnd.0 as isize))
            .map_or(RouteOutcome::Forward, |router| router.route(msg, wparam.0, lparam.0)),
        Err(_) => RouteOutcome::Forward,
    })
}

unsafe extern "system" fn tray_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let outcome = guarded(|| route(hwnd, msg, wparam, lparam));

    match outcome {
        RouteOutcome::Forward => DefWindowProcW(hwnd, msg, wparam, lparam),
        RouteOutcome::Inert | RouteOutcome::Deferred(_) => LRESULT(0),
    }
}
