//! Cover-fit picture for a catalog image.
//!
//! Bundled images are read straight from the assets directory; remote images
//! are downloaded through the shared [`SourceFetcher`] and decoded into a
//! texture on the main loop.

use {
    anyhow::Error,
    libadwaita::{
        gio::File,
        glib::{Bytes, MainContext},
        gtk::{AccessibleRole::Img, ContentFit::Cover, Picture, Widget, gdk::Texture},
        prelude::{AccessibleExt, Cast, ObjectExt, WidgetExt},
    },
    tracing::{debug, warn},
};

use crate::{audio::fetch::SourceFetcher, catalog::MediaSource, error::ErrorReporter};

/// CSS class added when the image could not be shown.
pub const MISSING_CLASS: &str = "artwork-missing";

/// Builder pattern for configuring `Artwork` components.
#[derive(Debug, Default)]
pub struct ArtworkBuilder {
    source: Option<MediaSource>,
    fetcher: Option<SourceFetcher>,
    description: Option<String>,
    width: i32,
    height: i32,
}

impl ArtworkBuilder {
    /// Sets the image to display.
    #[must_use]
    pub fn source(mut self, source: MediaSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the fetcher used to resolve the image.
    ///
    /// Without a fetcher the picture stays empty.
    #[must_use]
    pub fn fetcher(mut self, fetcher: SourceFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Sets the tooltip describing the image.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets a minimum size for the picture.
    #[must_use]
    pub fn dimensions(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn build(self) -> Artwork {
        Artwork::new(
            self.source,
            self.fetcher,
            self.description,
            self.width,
            self.height,
        )
    }
}

/// Image display that fills its allocation, cropping as needed.
#[derive(Clone)]
pub struct Artwork {
    /// The underlying GTK widget.
    pub widget: Widget,
    /// The picture widget displaying the image.
    pub picture: Picture,
    /// Image shown by this component.
    pub source: Option<MediaSource>,
}

impl Artwork {
    /// Creates the picture and starts resolving `source`.
    ///
    /// # Arguments
    ///
    /// * `source` - Image to display
    /// * `fetcher` - Fetcher for bundled and remote assets
    /// * `description` - Tooltip text
    /// * `width` - Minimum width, ignored when not positive
    /// * `height` - Minimum height, ignored when not positive
    #[must_use]
    pub fn new(
        source: Option<MediaSource>,
        fetcher: Option<SourceFetcher>,
        description: Option<String>,
        width: i32,
        height: i32,
    ) -> Self {
        let picture = Picture::builder()
            .content_fit(Cover)
            .can_shrink(true)
            .hexpand(true)
            .vexpand(true)
            .css_classes(["artwork"])
            .build();

        if width > 0 && height > 0 {
            picture.set_size_request(width, height);
        }

        picture.set_accessible_role(Img);
        picture.set_tooltip_text(description.as_deref());

        match (source, fetcher) {
            (Some(source @ MediaSource::Local(_)), Some(fetcher)) => {
                load_local(&picture, source, &fetcher);
            }
            (Some(source @ MediaSource::Remote(_)), Some(fetcher)) => {
                load_remote(&picture, source, fetcher);
            }
            _ => {}
        }

        Self {
            widget: picture.upcast_ref::<Widget>().clone(),
            picture,
            source,
        }
    }

    #[must_use]
    pub fn builder() -> ArtworkBuilder {
        ArtworkBuilder::default()
    }
}

fn load_local(picture: &Picture, source: MediaSource, fetcher: &SourceFetcher) {
    let Some(path) = source.local_path(fetcher.assets_dir()) else {
        return;
    };

    if path.exists() {
        debug!(path = %path.display(), "Showing bundled image");
        picture.set_file(Some(&File::for_path(&path)));
    } else {
        warn!(path = %path.display(), "Bundled image is missing");
        picture.add_css_class(MISSING_CLASS);
    }
}

fn load_remote(picture: &Picture, source: MediaSource, fetcher: SourceFetcher) {
    let picture = picture.downgrade();

    MainContext::default().spawn_local(async move {
        let texture = match fetcher.fetch(source).await {
            Ok(bytes) => Texture::from_bytes(&Bytes::from_owned(bytes)).map_err(Error::from),
            Err(e) => Err(Error::from(e)),
        };

        // The card may have been dropped while the download ran.
        let Some(picture) = picture.upgrade() else {
            return;
        };

        match texture {
            Ok(texture) => picture.set_paintable(Some(&texture)),
            Err(e) => {
                ErrorReporter::warn(&e, &format!("Loading image {source}"));
                picture.add_css_class(MISSING_CLASS);
            }
        }
    });
}
