use crate::paths;
use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use std::fs::{self, File, OpenOptions};
use std::path::Path;

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))
}

/// `RUST_LOG` overrides the default `info` filter. Output goes to the log
/// file in the config directory, or stderr if that cannot be opened.
pub fn init() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    let file = paths::log_path().and_then(|path| open_log_file(&path));
    let fallback = match file {
        Ok(file) => {
            builder.target(Target::Pipe(Box::new(file)));
            None
        }
        Err(e) => Some(e),
    };

    builder.init();

    if let Some(e) = fallback {
        log::warn!("Logging to stderr: {:#}", e);
    }
}
