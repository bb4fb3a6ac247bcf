//! Persisted user preferences.

use crate::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AutoModeType {
    #[default]
    Auto,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub auto_mode: AutoModeType,
    #[serde(default = "default_show_bar_on_exit")]
    pub show_bar_on_exit: bool,
}

fn default_show_bar_on_exit() -> bool {
    true
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            auto_mode: AutoModeType::default(),
            show_bar_on_exit: default_show_bar_on_exit(),
        }
    }
}

pub trait SettingsStore {
    fn auto_mode_enabled(&self) -> bool;
    fn set_auto_mode_enabled(&self, enabled: bool) -> Result<()>;
    fn show_bar_on_exit(&self) -> bool;
    fn set_show_bar_on_exit(&self, enabled: bool) -> Result<()>;
}

/// Settings kept in memory and written through to a TOML file. A failed
/// write leaves the in-memory value untouched.
pub struct FileSettings {
    path: PathBuf,
    current: RefCell<UserSettings>,
}

impl FileSettings {
    pub fn open_default() -> Result<Self> {
        Ok(Self::open(paths::settings_path()?))
    }

    pub fn open(path: PathBuf) -> Self {
        let current = match load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings: {:#}", e);
                UserSettings::default()
            }
        };
        Self {
            path,
            current: RefCell::new(current),
        }
    }

    pub fn snapshot(&self) -> UserSettings {
        self.current.borrow().clone()
    }

    fn update(&self, apply: impl FnOnce(&mut UserSettings)) -> Result<()> {
        let mut next = self.snapshot();
        apply(&mut next);
        save(&self.path, &next)?;
        *self.current.borrow_mut() = next;
        Ok(())
    }
}

impl SettingsStore for FileSettings {
    fn auto_mode_enabled(&self) -> bool {
        self.current.borrow().auto_mode == AutoModeType::Auto
    }

    fn set_auto_mode_enabled(&self, enabled: bool) -> Result<()> {
        self.update(|s| {
            s.auto_mode = if enabled {
                AutoModeType::Auto
            } else {
                AutoModeType::None
            }
        })
    }

    fn show_bar_on_exit(&self) -> bool {
        self.current.borrow().show_bar_on_exit
    }

    fn set_show_bar_on_exit(&self, enabled: bool) -> Result<()> {
        self.update(|s| s.show_bar_on_exit = enabled)
    }
}

fn load(path: &Path) -> Result<UserSettings> {
    if !path.exists() {
        return Ok(UserSettings::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let settings = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(settings)
}

fn save(path: &Path, settings: &UserSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
