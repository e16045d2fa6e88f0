//! Connectivity-aware gallery filtering.
//!
//! Only the image source decides visibility: an item with a bundled image and
//! a remote audio track stays visible offline.

use crate::{catalog::models::CatalogItem, network::ConnectivityState};

/// Returns the items the gallery shows for the given connectivity.
///
/// While disconnected only items with a bundled image are returned; in every
/// other state (including `Unknown`) the whole catalog is returned in order.
/// The result is recomputed on every call.
#[must_use]
pub fn visible_items(
    catalog: &[CatalogItem],
    connectivity: ConnectivityState,
) -> Vec<&CatalogItem> {
    match connectivity {
        ConnectivityState::Disconnected => catalog
            .iter()
            .filter(|item| item.image.is_local())
            .collect(),
        ConnectivityState::Unknown | ConnectivityState::Connected => catalog.iter().collect(),
    }
}
