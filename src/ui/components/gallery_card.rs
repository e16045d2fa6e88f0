//! Gallery grid card: cover-fit image with a title overlay.
//!
//! Cards are activated by click, tap, or keyboard (Enter/Space through the
//! `FlowBoxChild`), and announce themselves to assistive technology as
//! "View {title}".

use std::rc::Rc;

use libadwaita::{
    gtk::{
        AccessibleRole::Button as AccessibleButton,
        Align::{End, Fill},
        FlowBoxChild, GestureClick, Label, Overlay,
        Overflow::Hidden,
        Widget,
        accessible::Property,
        pango::EllipsizeMode::End as EllipsizeEnd,
    },
    prelude::{AccessibleExt, AccessibleExtManual, Cast, FlowBoxChildExt, WidgetExt},
};

use crate::{
    audio::fetch::SourceFetcher,
    catalog::CatalogItem,
    ui::components::artwork::Artwork,
};

/// Side length of a card's image, before the grid stretches it.
pub const CARD_SIZE: i32 = 160;

/// Accessible label announced for a card.
#[must_use]
pub fn accessible_label(title: &str) -> String {
    format!("View {title}")
}

/// Builder pattern for configuring `GalleryCard` components.
pub struct GalleryCardBuilder {
    item: &'static CatalogItem,
    fetcher: Option<SourceFetcher>,
    size: i32,
    on_card_clicked: Option<Rc<dyn Fn()>>,
}

impl GalleryCardBuilder {
    /// Sets the fetcher used for the card image.
    #[must_use]
    pub fn fetcher(mut self, fetcher: SourceFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Sets the side length of the card image.
    #[must_use]
    pub fn size(mut self, size: i32) -> Self {
        self.size = size;
        self
    }

    /// Sets the callback run when the card is activated.
    #[must_use]
    pub fn on_card_clicked(mut self, callback: Rc<dyn Fn()>) -> Self {
        self.on_card_clicked = Some(callback);
        self
    }

    #[must_use]
    pub fn build(self) -> GalleryCard {
        GalleryCard::new(self.item, self.fetcher, self.size, self.on_card_clicked)
    }
}

/// A single catalog entry in the gallery grid.
pub struct GalleryCard {
    /// The underlying GTK widget (`FlowBoxChild`).
    pub widget: Widget,
    /// Image component.
    pub artwork: Artwork,
    /// Title overlay label.
    pub title_label: Label,
    /// Catalog entry shown by this card.
    pub item: &'static CatalogItem,
}

impl GalleryCard {
    /// Creates a card for `item`.
    ///
    /// # Arguments
    ///
    /// * `item` - Catalog entry to display
    /// * `fetcher` - Fetcher for the card image
    /// * `size` - Side length of the image
    /// * `on_card_clicked` - Callback for activation
    #[must_use]
    pub fn new(
        item: &'static CatalogItem,
        fetcher: Option<SourceFetcher>,
        size: i32,
        on_card_clicked: Option<Rc<dyn Fn()>>,
    ) -> Self {
        let mut artwork = Artwork::builder()
            .source(item.image)
            .description(item.title)
            .dimensions(size, size);
        if let Some(fetcher) = fetcher {
            artwork = artwork.fetcher(fetcher);
        }
        let artwork = artwork.build();

        let title_label = Label::builder()
            .label(item.title)
            .halign(Fill)
            .valign(End)
            .xalign(0.0)
            .ellipsize(EllipsizeEnd)
            .lines(1)
            .css_classes(["card-title", "osd"])
            .build();

        let overlay = Overlay::builder()
            .child(&artwork.widget)
            .overflow(Hidden)
            .css_classes(["card", "gallery-card"])
            .build();
        overlay.add_overlay(&title_label);

        let label = accessible_label(item.title);
        let child = FlowBoxChild::new();
        child.set_child(Some(&overlay));
        child.set_focusable(true);
        child.set_accessible_role(AccessibleButton);
        child.update_property(&[Property::Label(&label)]);
        child.set_tooltip_text(Some(item.title));

        if let Some(callback) = on_card_clicked {
            let click_controller = GestureClick::new();
            let click_callback = Rc::clone(&callback);
            click_controller.connect_released(move |_gesture, _n_press, _x, _y| click_callback());
            overlay.add_controller(click_controller);

            child.connect_activate(move |_| callback());
        }

        Self {
            widget: child.upcast_ref::<Widget>().clone(),
            artwork,
            title_label,
            item,
        }
    }

    #[must_use]
    pub fn builder(item: &'static CatalogItem) -> GalleryCardBuilder {
        GalleryCardBuilder {
            item,
            fetcher: None,
            size: CARD_SIZE,
            on_card_clicked: None,
        }
    }
}
