//! Startup gate that keeps a single tray alive per exclusivity key.

use anyhow::Result;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

pub const INSTANCE_KEY: &str = "{959d3545-aa5c-42a8-a327-6e2c079daa94}";

/// Holds the exclusivity key until dropped.
pub struct InstanceGuard {
    release: Option<Box<dyn FnOnce()>>,
}

impl InstanceGuard {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

pub trait InstanceLock {
    /// `Ok(None)` means another instance already holds `key`.
    fn try_acquire(&self, key: &str) -> Result<Option<InstanceGuard>>;
}

/// Exclusivity scoped to the lock value and its clones.
#[derive(Clone, Default)]
pub struct InProcessLock {
    held: Arc<Mutex<HashSet<String>>>,
}

impl InProcessLock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InstanceLock for InProcessLock {
    fn try_acquire(&self, key: &str) -> Result<Option<InstanceGuard>> {
        let mut held = self
            .held
            .lock()
            .map_err(|_| anyhow::anyhow!("Instance lock poisoned"))?;
        if !held.insert(key.to_string()) {
            return Ok(None);
        }

        let shared = Arc::clone(&self.held);
        let key = key.to_string();
        Ok(Some(InstanceGuard::new(move || {
            if let Ok(mut held) = shared.lock() {
                held.remove(&key);
            }
        })))
    }
}
