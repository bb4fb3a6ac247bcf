use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .context("Could not determine config directory")
        .map(|p| p.join("smart-taskbar"))
}

pub fn settings_path() -> Result<PathBuf> {
    config_dir().map(|p| p.join("settings.toml"))
}

pub fn log_path() -> Result<PathBuf> {
    config_dir().map(|p| p.join("smart-taskbar.log"))
}

pub trait UrlLauncher {
    fn open(&self, url: &str) -> Result<()>;
}

/// Opens URLs with the desktop's default handler.
pub struct SystemLauncher;

impl UrlLauncher for SystemLauncher {
    fn open(&self, url: &str) -> Result<()> {
        open::that(url).with_context(|| format!("Failed to open {}", url))?;
        Ok(())
    }
}
