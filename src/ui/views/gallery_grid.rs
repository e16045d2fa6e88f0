//! Connectivity-aware gallery grid.
//!
//! The grid is rebuilt from [`visible_items`] on every connectivity change
//! broadcast through `AppState`, so remote-hosted items disappear while the
//! network is down and come back once it returns.

use std::{cell::RefCell, rc::Rc};

use {
    libadwaita::{
        glib::{JoinHandle, MainContext},
        gtk::{
            AccessibleRole::Grid,
            Align::{Fill, Start},
            FlowBox,
            PolicyType::{Automatic, Never},
            ScrolledWindow,
            SelectionMode::None as SelectionNone,
            Widget,
        },
        prelude::{AccessibleExt, Cast, WidgetExt},
    },
    tokio::sync::broadcast::error::RecvError,
    tracing::debug,
};

use crate::{
    audio::fetch::SourceFetcher,
    catalog::{CATALOG, CatalogItem, visible_items},
    network::ConnectivityState,
    state::{AppState, AppStateEvent},
    ui::components::gallery_card::GalleryCard,
};

/// Callback run with the id of an activated item.
pub type ItemActivated = Rc<dyn Fn(&'static str)>;

/// Builder pattern for configuring `GalleryGridView` components.
pub struct GalleryGridViewBuilder {
    app_state: Option<AppState>,
    fetcher: Option<SourceFetcher>,
    catalog: &'static [CatalogItem],
    columns: u32,
    on_item_activated: Option<ItemActivated>,
}

impl Default for GalleryGridViewBuilder {
    fn default() -> Self {
        Self {
            app_state: None,
            fetcher: None,
            catalog: CATALOG,
            columns: 2,
            on_item_activated: None,
        }
    }
}

impl GalleryGridViewBuilder {
    /// Sets the application state the grid follows.
    ///
    /// Without it the grid shows the full catalog and never refreshes.
    #[must_use]
    pub fn app_state(mut self, app_state: AppState) -> Self {
        self.app_state = Some(app_state);
        self
    }

    #[must_use]
    pub fn fetcher(mut self, fetcher: SourceFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Replaces the built-in catalog.
    #[must_use]
    pub fn catalog(mut self, catalog: &'static [CatalogItem]) -> Self {
        self.catalog = catalog;
        self
    }

    /// Sets the number of columns; values below 1 are treated as 1.
    #[must_use]
    pub fn columns(mut self, columns: u32) -> Self {
        self.columns = columns;
        self
    }

    /// Sets the callback run when a card is activated.
    #[must_use]
    pub fn on_item_activated(mut self, callback: ItemActivated) -> Self {
        self.on_item_activated = Some(callback);
        self
    }

    #[must_use]
    pub fn build(self) -> GalleryGridView {
        GalleryGridView::new(
            self.app_state,
            self.fetcher,
            self.catalog,
            self.columns,
            self.on_item_activated,
        )
    }
}

/// Cards currently shown by the grid, kept so refreshes can be compared.
#[derive(Clone)]
struct GridContent {
    flow_box: FlowBox,
    catalog: &'static [CatalogItem],
    fetcher: Option<SourceFetcher>,
    on_item_activated: Option<ItemActivated>,
    shown: Rc<RefCell<Vec<&'static str>>>,
}

impl GridContent {
    fn populate(&self, connectivity: ConnectivityState) {
        let items = visible_items(self.catalog, connectivity);
        let ids: Vec<&'static str> = items.iter().map(|item| item.id).collect();

        if *self.shown.borrow() == ids && self.flow_box.first_child().is_some() {
            return;
        }

        debug!(?connectivity, count = ids.len(), "Rebuilding gallery grid");

        while let Some(child) = self.flow_box.first_child() {
            self.flow_box.remove(&child);
        }

        for item in items {
            let card = self.create_card(item);
            self.flow_box.insert(&card.widget, -1);
        }

        *self.shown.borrow_mut() = ids;
    }

    fn create_card(&self, item: &'static CatalogItem) -> GalleryCard {
        let mut builder = GalleryCard::builder(item);

        if let Some(fetcher) = &self.fetcher {
            builder = builder.fetcher(fetcher.clone());
        }

        if let Some(callback) = &self.on_item_activated {
            let callback = Rc::clone(callback);
            builder = builder.on_card_clicked(Rc::new(move || callback(item.id)));
        }

        builder.build()
    }
}

/// Two-column (by default) grid of gallery cards.
pub struct GalleryGridView {
    /// The underlying GTK widget (scrolled window).
    pub widget: Widget,
    /// The flow box holding the cards.
    pub flow_box: FlowBox,
    content: GridContent,
    subscription_handle: Option<JoinHandle<()>>,
}

impl GalleryGridView {
    /// Creates the grid and fills it for the current connectivity reading.
    #[must_use]
    pub fn new(
        app_state: Option<AppState>,
        fetcher: Option<SourceFetcher>,
        catalog: &'static [CatalogItem],
        columns: u32,
        on_item_activated: Option<ItemActivated>,
    ) -> Self {
        let columns = columns.max(1);

        let flow_box = FlowBox::builder()
            .halign(Fill)
            .valign(Start)
            .homogeneous(true)
            .min_children_per_line(columns)
            .max_children_per_line(columns)
            .selection_mode(SelectionNone)
            .row_spacing(8)
            .column_spacing(8)
            .margin_top(12)
            .margin_bottom(12)
            .margin_start(12)
            .margin_end(12)
            .css_classes(["gallery-grid"])
            .build();
        flow_box.set_accessible_role(Grid);

        let scrolled_window = ScrolledWindow::builder()
            .hscrollbar_policy(Never)
            .vscrollbar_policy(Automatic)
            .hexpand(true)
            .vexpand(true)
            .child(&flow_box)
            .build();

        let content = GridContent {
            flow_box: flow_box.clone(),
            catalog,
            fetcher,
            on_item_activated,
            shown: Rc::new(RefCell::new(Vec::new())),
        };

        // Subscribe before the first fill so no reading falls in between.
        let subscription = app_state.map(|state| {
            let receiver = state.subscribe();
            (state, receiver)
        });

        let connectivity = subscription
            .as_ref()
            .map_or(ConnectivityState::Unknown, |(state, _)| state.get_connectivity());
        content.populate(connectivity);

        let subscription_handle = subscription.map(|(state, mut receiver)| {
            let content = content.clone();
            MainContext::default().spawn_local(async move {
                loop {
                    match receiver.recv().await {
                        Ok(AppStateEvent::ConnectivityChanged(connectivity)) => {
                            content.populate(connectivity);
                        }
                        Ok(AppStateEvent::RouteChanged(_)) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "Gallery lagged behind state updates");
                            content.populate(state.get_connectivity());
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            })
        });

        Self {
            widget: scrolled_window.upcast_ref::<Widget>().clone(),
            flow_box,
            content,
            subscription_handle,
        }
    }

    #[must_use]
    pub fn builder() -> GalleryGridViewBuilder {
        GalleryGridViewBuilder::default()
    }

    /// Rebuilds the grid for `connectivity`.
    pub fn set_connectivity(&self, connectivity: ConnectivityState) {
        self.content.populate(connectivity);
    }

    /// Ids of the cards currently shown, in order.
    #[must_use]
    pub fn shown_ids(&self) -> Vec<&'static str> {
        self.content.shown.borrow().clone()
    }
}

impl Drop for GalleryGridView {
    fn drop(&mut self) {
        if let Some(handle) = self.subscription_handle.take() {
            handle.abort();
        }
    }
}
