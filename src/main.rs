#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::Result;

#[cfg(windows)]
fn main() -> Result<()> {
    use smart_taskbar::instance::INSTANCE_KEY;
    use smart_taskbar::platform::{self, NamedMutexLock};
    use smart_taskbar::tray::{self, TrayOptions};

    smart_taskbar::logging::init();
    log::info!("Starting SmartTaskbar {}", env!("CARGO_PKG_VERSION"));

    let deps = platform::native_deps()?;
    let Some(mut running) = tray::launch(&NamedMutexLock, INSTANCE_KEY, deps, TrayOptions::default())
        .inspect_err(|e| log::error!("Failed to start tray: {:#}", e))?
    else {
        return Ok(());
    };

    platform::run_message_loop(&mut running.controller);
    Ok(())
}

#[cfg(not(windows))]
fn main() -> Result<()> {
    smart_taskbar::logging::init();
    anyhow::bail!("SmartTaskbar manages the Windows taskbar and only runs on Windows");
}
