/// Decides whether the taskbar should be hidden and applies the result.
pub trait AutoHideEngine {
    fn is_bar_currently_auto_hidden(&self) -> bool;
    fn is_animation_enabled(&self) -> bool;
    /// Flips taskbar animation and returns the value now in effect.
    fn toggle_animation(&self) -> bool;
    fn recompute_and_apply(&self);
    /// Leaves the taskbar visible, dropping any auto-hide that is pending.
    fn cancel_pending_auto_hide(&self);
    fn hide_bar_now(&self);
}
