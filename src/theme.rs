use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Invoked from the watcher's own thread whenever the colour scheme changes.
pub type ThemeCallback = Box<dyn Fn() + Send + 'static>;

pub trait ThemeWatcher {
    fn is_light_theme(&self) -> bool;
    fn subscribe(&self, callback: ThemeCallback) -> Result<SubscriptionId>;
    fn unsubscribe(&self, id: SubscriptionId);
}
