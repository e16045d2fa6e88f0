//! Platform capabilities consumed by the views.
//!
//! The traits here are the seams between the view logic and the desktop
//! shell: system chrome visibility and the hardware back action. Listener
//! registrations hand back a [`Subscription`] guard that releases the
//! listener when dropped.

use std::fmt::{Debug, Formatter, Result as FmtResult};

/// Scoped listener registration.
///
/// Dropping the guard (or calling [`Subscription::cancel`]) runs the release
/// closure exactly once.
#[must_use = "dropping a subscription immediately unregisters the listener"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Creates a subscription that runs `release` when cancelled or dropped.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Creates a subscription with nothing to release.
    pub fn empty() -> Self {
        Self { release: None }
    }

    /// Releases the listener now.
    pub fn cancel(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Visibility of the system navigation chrome around the application.
pub trait SystemChrome {
    /// Hides or restores the system bars.
    fn set_system_bars_hidden(&self, hidden: bool);
}

/// Hardware (or shortcut) back action.
pub trait HardwareBack {
    /// Registers `callback` to run on every back action.
    ///
    /// While registered the callback intercepts the action, so the default
    /// navigation does not run. Dropping the returned guard unregisters it.
    fn on_hardware_back(&self, callback: Box<dyn Fn()>) -> Subscription;
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use crate::platform::Subscription;

    #[test]
    fn test_subscription_releases_once_on_drop() {
        let released = Rc::new(Cell::new(0));
        let counter = Rc::clone(&released);
        let subscription = Subscription::new(move || counter.set(counter.get() + 1));
        drop(subscription);
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_subscription_cancel() {
        let released = Rc::new(Cell::new(0));
        let counter = Rc::clone(&released);
        Subscription::new(move || counter.set(counter.get() + 1)).cancel();
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_empty_subscription() {
        let subscription = Subscription::empty();
        assert!(format!("{subscription:?}").contains("active: false"));
    }
}
