//! Global application state with reactive update mechanisms.
//!
//! `AppState` holds what both views need to agree on, the connectivity
//! reading and the current route, and broadcasts every change.

use std::sync::Arc;

use {
    parking_lot::RwLock,
    tokio::sync::broadcast::{Receiver, Sender, channel},
};

use crate::{network::ConnectivityState, state::navigation::Route};

/// Capacity of the state broadcast channel.
const STATE_CHANNEL_CAPACITY: usize = 16;

/// Central state container with thread-safe access.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Latest connectivity reading.
    pub connectivity: Arc<RwLock<ConnectivityState>>,
    /// Route currently on top of the navigation stack.
    pub route: Arc<RwLock<Route>>,
    /// Broadcast channel for state change notifications.
    state_tx: Sender<AppStateEvent>,
}

/// Application state change events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppStateEvent {
    /// Connectivity reading changed.
    ConnectivityChanged(ConnectivityState),
    /// A new route became current.
    RouteChanged(Route),
}

impl AppState {
    /// Creates state starting at the gallery with an `Unknown` reading.
    #[must_use]
    pub fn new() -> Self {
        let (state_tx, _) = channel(STATE_CHANNEL_CAPACITY);

        Self {
            connectivity: Arc::new(RwLock::new(ConnectivityState::Unknown)),
            route: Arc::new(RwLock::new(Route::Gallery)),
            state_tx,
        }
    }

    /// Updates the connectivity reading and notifies subscribers.
    ///
    /// Repeated identical readings are not re-broadcast.
    pub fn update_connectivity(&self, state: ConnectivityState) {
        {
            let mut current = self.connectivity.write();
            if *current == state {
                return;
            }
            *current = state;
        }
        let _ = self
            .state_tx
            .send(AppStateEvent::ConnectivityChanged(state));
    }

    /// Records a navigation and notifies subscribers.
    pub fn update_route(&self, route: Route) {
        *self.route.write() = route.clone();
        let _ = self.state_tx.send(AppStateEvent::RouteChanged(route));
    }

    /// Subscribes to application state changes.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<AppStateEvent> {
        self.state_tx.subscribe()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state_tx.receiver_count()
    }

    #[must_use]
    pub fn get_connectivity(&self) -> ConnectivityState {
        *self.connectivity.read()
    }

    #[must_use]
    pub fn get_route(&self) -> Route {
        self.route.read().clone()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
