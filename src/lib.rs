pub mod engine;
pub mod i18n;
pub mod instance;
pub mod logging;
pub mod paths;
#[cfg(windows)]
pub mod platform;
pub mod process;
pub mod settings;
pub mod theme;
pub mod tray;
