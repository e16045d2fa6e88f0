//! Gallery header bar with the application title and version.

use libadwaita::{HeaderBar as LibadwaitaHeaderBar, WindowTitle};

/// Application title shown in the header and the window.
pub const APP_TITLE: &str = "Cozy Leaf";

/// Version label shown under the title.
#[must_use]
pub fn version_label() -> String {
    format!("Version {}", env!("CARGO_PKG_VERSION"))
}

/// Header bar of the gallery page.
pub struct HeaderBar {
    /// The underlying Libadwaita header bar widget.
    pub widget: LibadwaitaHeaderBar,
    /// Title and version.
    pub title: WindowTitle,
}

impl HeaderBar {
    #[must_use]
    pub fn new() -> Self {
        let title = WindowTitle::new(APP_TITLE, &version_label());
        let widget = LibadwaitaHeaderBar::builder()
            .title_widget(&title)
            .build();

        Self { widget, title }
    }
}

impl Default for HeaderBar {
    fn default() -> Self {
        Self::new()
    }
}
