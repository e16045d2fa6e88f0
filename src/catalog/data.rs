//! Compile-time gallery catalog.

use crate::catalog::models::{
    CatalogItem,
    MediaSource::{Local, Remote},
};

/// Every gallery entry, in display order.
pub static CATALOG: &[CatalogItem] = &[
    CatalogItem {
        id: "leaf-1",
        title: "Morning Fern",
        image: Local("images/morning-fern.jpg"),
        audio: Local("audio/forest-birds.ogg"),
    },
    CatalogItem {
        id: "leaf-2",
        title: "Maple Rain",
        image: Local("images/maple-rain.jpg"),
        audio: Remote("https://assets.cozyleaf.example/audio/maple-rain.mp3"),
    },
    CatalogItem {
        id: "leaf-3",
        title: "Autumn Drift",
        image: Remote("https://assets.cozyleaf.example/images/autumn-drift.jpg"),
        audio: Remote("https://assets.cozyleaf.example/audio/autumn-wind.mp3"),
    },
    CatalogItem {
        id: "leaf-4",
        title: "Moss Garden",
        image: Local("images/moss-garden.jpg"),
        audio: Local("audio/creek.ogg"),
    },
    CatalogItem {
        id: "leaf-5",
        title: "Evening Pine",
        image: Remote("https://assets.cozyleaf.example/images/evening-pine.jpg"),
        audio: Local("audio/crickets.ogg"),
    },
    CatalogItem {
        id: "leaf-6",
        title: "Willow Stream",
        image: Remote("https://assets.cozyleaf.example/images/willow-stream.jpg"),
        audio: Remote("https://assets.cozyleaf.example/audio/willow-stream.mp3"),
    },
];

/// Looks up a catalog entry by id.
#[must_use]
pub fn find_item(id: &str) -> Option<&'static CatalogItem> {
    find_in(CATALOG, id)
}

/// Looks up an entry by id in an arbitrary catalog slice.
#[must_use]
pub fn find_in<'a>(catalog: &'a [CatalogItem], id: &str) -> Option<&'a CatalogItem> {
    catalog.iter().find(|item| item.id == id)
}
