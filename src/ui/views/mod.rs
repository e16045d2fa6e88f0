//! Gallery grid and detail page.


pub mod detail_view;
pub mod gallery_grid;

pub use {detail_view::DetailView, gallery_grid::GalleryGridView};
