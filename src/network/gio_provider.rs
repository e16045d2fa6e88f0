//! Connectivity readings from `gio::NetworkMonitor`.

use {
    libadwaita::{
        gio::{NetworkMonitor, prelude::NetworkMonitorExt},
        glib::prelude::ObjectExt,
    },
    tracing::debug,
};

use crate::{
    network::monitor::{ConnectivityProvider, ConnectivityState},
    platform::Subscription,
};

/// Reachability provider backed by the default GIO network monitor.
#[derive(Debug, Clone)]
pub struct GioConnectivityProvider {
    monitor: NetworkMonitor,
}

impl GioConnectivityProvider {
    /// Wraps the process-wide default network monitor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            monitor: NetworkMonitor::default(),
        }
    }
}

impl Default for GioConnectivityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityProvider for GioConnectivityProvider {
    fn current_state(&self) -> ConnectivityState {
        self.monitor.is_network_available().into()
    }

    fn subscribe(&self, listener: Box<dyn Fn(ConnectivityState)>) -> Subscription {
        let handler = self
            .monitor
            .connect_network_changed(move |_, available| listener(available.into()));
        let monitor = self.monitor.clone();
        Subscription::new(move || {
            debug!("Disconnecting network-changed handler");
            monitor.disconnect(handler);
        })
    }
}
