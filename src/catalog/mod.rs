//! Static gallery catalog and the connectivity-aware gallery filter.
//!
//! The catalog is compiled into the binary and never changes at runtime.
//! Views resolve entries by id instead of holding on to them.

pub mod data;
pub mod filter;
pub mod models;

pub use {
    data::{CATALOG, find_in, find_item},
    filter::visible_items,
    models::{CatalogItem, MediaSource},
};
