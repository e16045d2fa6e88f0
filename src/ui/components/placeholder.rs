//! Full-page placeholders for detail content that cannot be shown.

use {
    anyhow::Error,
    libadwaita::{StatusPage, gtk::Widget, prelude::Cast},
};

use crate::{error::ErrorReporter, state::DetailContent};

/// Text and icon of a placeholder page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderText {
    pub icon_name: &'static str,
    pub title: String,
    pub description: String,
}

impl PlaceholderText {
    /// Placeholder for `content`, or `None` when the content can be shown.
    #[must_use]
    pub fn for_content(content: &DetailContent<'_>) -> Option<Self> {
        let error = content.error()?;
        let title = ErrorReporter::to_user_message(&Error::from(error));

        let (icon_name, description) = match content {
            DetailContent::NotFound { id } => (
                "image-missing-symbolic",
                format!("Nothing in the gallery has the id \u{201c}{id}\u{201d}."),
            ),
            DetailContent::Offline(item) => (
                "network-offline-symbolic",
                format!(
                    "\u{201c}{}\u{201d} is hosted online. Reconnect to view it.",
                    item.title
                ),
            ),
            DetailContent::Ready(_) => return None,
        };

        Some(Self {
            icon_name,
            title,
            description,
        })
    }
}

/// `adw::StatusPage` showing a [`PlaceholderText`].
#[derive(Clone)]
pub struct Placeholder {
    /// The underlying GTK widget.
    pub widget: Widget,
    /// The status page.
    pub status_page: StatusPage,
}

impl Placeholder {
    #[must_use]
    pub fn new() -> Self {
        let status_page = StatusPage::builder()
            .vexpand(true)
            .css_classes(["detail-placeholder"])
            .build();

        Self {
            widget: status_page.upcast_ref::<Widget>().clone(),
            status_page,
        }
    }

    pub fn set_text(&self, text: &PlaceholderText) {
        self.status_page.set_icon_name(Some(text.icon_name));
        self.status_page.set_title(&text.title);
        self.status_page.set_description(Some(&text.description));
    }
}

impl Default for Placeholder {
    fn default() -> Self {
        Self::new()
    }
}
