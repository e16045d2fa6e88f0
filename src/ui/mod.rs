//! GNOME HIG-compliant user interface built entirely with Libadwaita.
//!
//! The window hosts an `adw::NavigationView` with the gallery grid as its root
//! page; detail pages are pushed on top of it by catalog id.


pub mod application;
pub mod chrome;
pub mod components;
pub mod header_bar;
pub mod views;

pub use {
    application::CozyLeafApplication,
    chrome::{WindowBackHandler, WindowChrome},
    components::{Artwork, GalleryCard, Placeholder, PlayOverlay},
    header_bar::HeaderBar,
    views::{DetailView, GalleryGridView},
};
