//! Network reachability monitoring.
//!
//! Mirrors the platform's network callbacks into a tri-state signal shared by
//! the gallery and detail views.

pub mod gio_provider;
pub mod monitor;

pub use {
    gio_provider::GioConnectivityProvider,
    monitor::{ConnectivityMonitor, ConnectivityProvider, ConnectivityState, ConnectivityWatch},
};
