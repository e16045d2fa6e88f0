//! Connectivity monitor with scoped subscriptions.
//!
//! A [`ConnectivityWatch`] always yields `Unknown` first, then the reading
//! taken at subscription time, then one value per platform callback. There is
//! no retry or smoothing: every callback is forwarded as-is.

use std::{rc::Rc, sync::Arc};

use {
    async_channel::{Receiver, Sender, unbounded},
    parking_lot::RwLock,
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::platform::Subscription;

/// Tri-state network reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectivityState {
    /// No reading has arrived yet.
    #[default]
    Unknown,
    /// The network is reachable.
    Connected,
    /// The network is unreachable.
    Disconnected,
}

impl ConnectivityState {
    /// Whether the state is a confirmed lack of connectivity.
    #[must_use]
    pub fn is_disconnected(self) -> bool {
        self == ConnectivityState::Disconnected
    }
}

impl From<bool> for ConnectivityState {
    fn from(available: bool) -> Self {
        if available {
            ConnectivityState::Connected
        } else {
            ConnectivityState::Disconnected
        }
    }
}

/// Platform source of reachability readings.
pub trait ConnectivityProvider {
    /// Queries the current reachability.
    fn current_state(&self) -> ConnectivityState;

    /// Registers `listener` for every reachability change.
    ///
    /// The listener stays registered until the returned guard is dropped.
    fn subscribe(&self, listener: Box<dyn Fn(ConnectivityState)>) -> Subscription;
}

/// Shared observer over a [`ConnectivityProvider`].
#[derive(Clone)]
pub struct ConnectivityMonitor {
    provider: Rc<dyn ConnectivityProvider>,
}

impl ConnectivityMonitor {
    /// Creates a monitor over `provider`.
    pub fn new(provider: Rc<dyn ConnectivityProvider>) -> Self {
        Self { provider }
    }

    /// Subscribes to reachability readings.
    ///
    /// The returned watch has already received `Unknown` followed by the
    /// current reading. Dropping the watch releases the platform listener.
    #[must_use]
    pub fn subscribe(&self) -> ConnectivityWatch {
        let (sender, receiver) = unbounded();
        let latest = Arc::new(RwLock::new(ConnectivityState::Unknown));

        let _ = sender.try_send(ConnectivityState::Unknown);

        let listener = {
            let sender = sender.clone();
            let latest = Arc::clone(&latest);
            self.provider.subscribe(Box::new(move |state| {
                debug!(?state, "Connectivity changed");
                *latest.write() = state;
                let _ = sender.try_send(state);
            }))
        };

        let current = self.provider.current_state();
        debug!(state = ?current, "Initial connectivity reading");
        *latest.write() = current;
        let _ = sender.try_send(current);

        ConnectivityWatch {
            receiver,
            latest,
            listener: Some(listener),
            sender: Some(sender),
        }
    }
}

/// Active connectivity subscription.
pub struct ConnectivityWatch {
    receiver: Receiver<ConnectivityState>,
    latest: Arc<RwLock<ConnectivityState>>,
    listener: Option<Subscription>,
    sender: Option<Sender<ConnectivityState>>,
}

impl ConnectivityWatch {
    /// Waits for the next reading.
    ///
    /// Returns `None` once the watch has been unsubscribed and drained.
    pub async fn next(&self) -> Option<ConnectivityState> {
        self.receiver.recv().await.ok()
    }

    /// Returns a queued reading without waiting.
    pub fn try_next(&self) -> Option<ConnectivityState> {
        self.receiver.try_recv().ok()
    }

    /// Most recent reading received from the platform.
    #[must_use]
    pub fn latest(&self) -> ConnectivityState {
        *self.latest.read()
    }

    /// Stops all further emissions and releases the platform listener.
    pub fn unsubscribe(&mut self) {
        if let Some(listener) = self.listener.take() {
            debug!("Releasing connectivity listener");
            listener.cancel();
        }
        self.sender.take();
    }
}

impl Drop for ConnectivityWatch {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
