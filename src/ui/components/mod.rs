//! Reusable UI components following GNOME HIG guidelines.
//!
//! Each component exposes its root as a public `widget` field and is
//! configured through a builder.


pub mod artwork;
pub mod gallery_card;
pub mod placeholder;
pub mod play_overlay;

pub use {
    artwork::Artwork,
    gallery_card::GalleryCard,
    placeholder::{Placeholder, PlaceholderText},
    play_overlay::PlayOverlay,
};
