//! Full-screen detail page with looping background audio.
//!
//! The page holds widgets only. Audio and lifecycle belong to a
//! [`DetailSession`] running on the main loop: page visibility, the play
//! button, the back button, and connectivity readings are forwarded to it as
//! [`SessionEvent`]s, and its [`SessionNotice`]s are rendered back onto the
//! widgets.
//!
//! The page sets `can-pop` to false, so the navigation view's own back
//! gestures and shortcuts are disabled and every way back goes through the
//! session's teardown first.

use std::{cell::Cell, rc::Rc};

use {
    async_channel::{Sender, unbounded},
    libadwaita::{
        HeaderBar, NavigationPage, NavigationView, Toast, ToastOverlay, ToolbarView,
        glib::{GString, MainContext},
        gtk::{
            Box as GtkBox, Button, Orientation::Vertical, Overlay, Stack,
            StackTransitionType::Crossfade, Widget, accessible::Property,
        },
        prelude::{AccessibleExtManual, ButtonExt, Cast, NavigationPageExt},
    },
    tokio::{
        select,
        sync::{broadcast::error::RecvError, oneshot},
    },
    tracing::debug,
};

use crate::{
    audio::{AudioBackend, PlaybackOptions, fetch::SourceFetcher},
    catalog::{CATALOG, CatalogItem},
    network::ConnectivityState,
    platform::{HardwareBack, SystemChrome},
    state::{
        AppState, AppStateEvent, DetailContent, DetailSession, Route, SessionEvent, SessionNotice,
    },
    ui::components::{
        artwork::Artwork,
        placeholder::{Placeholder, PlaceholderText},
        play_overlay::PlayOverlay,
    },
};

/// Stack page showing the image and play control.
pub const CONTENT_PAGE: &str = "content";
/// Stack page showing a not-found or offline placeholder.
pub const PLACEHOLDER_PAGE: &str = "placeholder";
/// Label announced by screen readers for the back button.
pub const BACK_BUTTON_LABEL: &str = "Go back to gallery";

/// Builder pattern for configuring `DetailView` pages.
pub struct DetailViewBuilder<B: AudioBackend> {
    id: String,
    backend: Rc<B>,
    chrome: Rc<dyn SystemChrome>,
    back: Rc<dyn HardwareBack>,
    app_state: Option<AppState>,
    fetcher: Option<SourceFetcher>,
    navigation_view: Option<NavigationView>,
    catalog: &'static [CatalogItem],
    playback_options: PlaybackOptions,
}

impl<B: AudioBackend + 'static> DetailViewBuilder<B> {
    /// Sets the application state supplying connectivity readings.
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

    /// Sets the navigation view popped once a back action has torn down.
    #[must_use]
    pub fn navigation_view(mut self, navigation_view: NavigationView) -> Self {
        self.navigation_view = Some(navigation_view);
        self
    }

    #[must_use]
    pub fn catalog(mut self, catalog: &'static [CatalogItem]) -> Self {
        self.catalog = catalog;
        self
    }

    #[must_use]
    pub fn playback_options(mut self, options: PlaybackOptions) -> Self {
        self.playback_options = options;
        self
    }

    #[must_use]
    pub fn build(self) -> DetailView {
        DetailView::new(self)
    }
}

/// Widgets the session's notices are rendered onto.
#[derive(Clone)]
struct DetailSurface {
    stack: Stack,
    image_frame: Overlay,
    placeholder: Placeholder,
    play_overlay: PlayOverlay,
    toast_overlay: ToastOverlay,
    fetcher: Option<SourceFetcher>,
    artwork_shown: Rc<Cell<bool>>,
}

impl DetailSurface {
    fn show_content(&self, content: &DetailContent<'_>) {
        if let Some(text) = PlaceholderText::for_content(content) {
            self.placeholder.set_text(&text);
            self.stack.set_visible_child_name(PLACEHOLDER_PAGE);
            return;
        }

        // The image is only requested once the content is known to be showable.
        if let Some(item) = content.playable_item()
            && !self.artwork_shown.replace(true)
        {
            let mut artwork = Artwork::builder().source(item.image).description(item.title);
            if let Some(fetcher) = &self.fetcher {
                artwork = artwork.fetcher(fetcher.clone());
            }
            self.image_frame.set_child(Some(&artwork.build().widget));
        }

        self.stack.set_visible_child_name(CONTENT_PAGE);
    }

    fn render(&self, notice: SessionNotice, navigation_view: Option<&NavigationView>) {
        match notice {
            SessionNotice::State(state) => self.play_overlay.set_state(state),
            SessionNotice::Content(content) => self.show_content(&content),
            SessionNotice::Failed(message) => self.toast_overlay.add_toast(Toast::new(&message)),
            SessionNotice::NavigateBack => {
                if let Some(navigation_view) = navigation_view {
                    navigation_view.pop();
                }
            }
        }
    }
}

/// Detail page for one catalog id.
pub struct DetailView {
    /// The navigation page to push.
    pub page: NavigationPage,
    /// The page content.
    pub widget: Widget,
    /// Play/pause control.
    pub play_overlay: PlayOverlay,
    /// On-screen back button.
    pub back_button: Button,
    /// Route this page renders.
    pub route: Route,
    events: Sender<SessionEvent>,
    surface: DetailSurface,
}

impl DetailView {
    /// Starts configuring a page for `id`.
    pub fn builder<B: AudioBackend + 'static>(
        id: impl Into<String>,
        backend: Rc<B>,
        chrome: Rc<dyn SystemChrome>,
        back: Rc<dyn HardwareBack>,
    ) -> DetailViewBuilder<B> {
        DetailViewBuilder {
            id: id.into(),
            backend,
            chrome,
            back,
            app_state: None,
            fetcher: None,
            navigation_view: None,
            catalog: CATALOG,
            playback_options: PlaybackOptions::default(),
        }
    }

    fn new<B: AudioBackend + 'static>(config: DetailViewBuilder<B>) -> Self {
        let route = Route::detail(config.id.clone());

        // Subscribe before reading the current value so no reading is lost.
        let connectivity_rx = config.app_state.as_ref().map(AppState::subscribe);
        let connectivity = config
            .app_state
            .as_ref()
            .map_or(ConnectivityState::Unknown, AppState::get_connectivity);

        let (session, notices) = DetailSession::new(
            config.backend,
            config.chrome,
            config.back,
            config.id,
            connectivity,
        );
        let mut session = session
            .with_catalog(config.catalog)
            .with_playback_options(config.playback_options);
        let content = session.content().clone();

        let (events, events_rx) = unbounded();

        let play_overlay = PlayOverlay::builder()
            .state(session.state())
            .on_toggle(forward(&events, SessionEvent::TogglePlayback))
            .build();

        let image_frame = Overlay::builder()
            .hexpand(true)
            .vexpand(true)
            .child(&GtkBox::new(Vertical, 0))
            .css_classes(["detail-image"])
            .build();
        image_frame.add_overlay(&play_overlay.widget);

        let placeholder = Placeholder::new();

        let stack = Stack::builder().transition_type(Crossfade).build();
        stack.add_named(&image_frame, Some(CONTENT_PAGE));
        stack.add_named(&placeholder.widget, Some(PLACEHOLDER_PAGE));

        let back_button = Button::builder()
            .icon_name("go-previous-symbolic")
            .tooltip_text("Back")
            .build();
        back_button.update_property(&[Property::Label(BACK_BUTTON_LABEL)]);
        let on_back = forward(&events, SessionEvent::Back);
        back_button.connect_clicked(move |_| on_back());

        let header = HeaderBar::builder().show_back_button(false).build();
        header.pack_start(&back_button);

        let toolbar = ToolbarView::new();
        toolbar.add_top_bar(&header);
        toolbar.set_content(Some(&stack));

        let toast_overlay = ToastOverlay::new();
        toast_overlay.set_child(Some(&toolbar));

        let title = match &content {
            DetailContent::NotFound { .. } => "Not Found",
            DetailContent::Offline(item) | DetailContent::Ready(item) => item.title,
        };
        let page = NavigationPage::builder()
            .child(&toast_overlay)
            .title(title)
            .tag(route.path())
            .can_pop(false)
            .build();

        let on_shown = forward(&events, SessionEvent::FocusGained);
        page.connect_shown(move |_| on_shown());
        let on_hidden = forward(&events, SessionEvent::FocusLost);
        page.connect_hidden(move |_| on_hidden());

        let surface = DetailSurface {
            stack,
            image_frame,
            placeholder,
            play_overlay: play_overlay.clone(),
            toast_overlay: toast_overlay.clone(),
            fetcher: config.fetcher,
            artwork_shown: Rc::new(Cell::new(false)),
        };
        surface.show_content(&content);

        let (finished_tx, mut finished_rx) = oneshot::channel::<()>();

        if let (Some(state), Some(mut receiver)) = (config.app_state, connectivity_rx) {
            let events = events.clone();
            MainContext::default().spawn_local(async move {
                loop {
                    let received = select! {
                        _ = &mut finished_rx => break,
                        received = receiver.recv() => received,
                    };
                    let reading = match received {
                        Ok(AppStateEvent::ConnectivityChanged(reading)) => reading,
                        Ok(AppStateEvent::RouteChanged(_)) => continue,
                        Err(RecvError::Lagged(_)) => state.get_connectivity(),
                        Err(RecvError::Closed) => break,
                    };
                    if events
                        .send(SessionEvent::ConnectivityChanged(reading))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            });
        }

        {
            let surface = surface.clone();
            let navigation_view = config.navigation_view;
            MainContext::default().spawn_local(async move {
                while let Ok(notice) = notices.recv().await {
                    surface.render(notice, navigation_view.as_ref());
                }
            });
        }

        let id = route.to_string();
        MainContext::default().spawn_local(async move {
            session.run(events_rx).await;
            let _ = finished_tx.send(());
            debug!(route = %id, "Detail page released its session");
        });

        Self {
            page,
            widget: toast_overlay.upcast_ref::<Widget>().clone(),
            play_overlay,
            back_button,
            route,
            events,
            surface,
        }
    }

    /// Forwards `event` to the session.
    ///
    /// Returns `false` once the session has finished.
    pub fn send(&self, event: SessionEvent) -> bool {
        self.events.try_send(event).is_ok()
    }

    /// Name of the stack page currently shown.
    #[must_use]
    pub fn visible_surface(&self) -> Option<GString> {
        self.surface.stack.visible_child_name()
    }
}

fn forward(events: &Sender<SessionEvent>, event: SessionEvent) -> Rc<dyn Fn()> {
    let events = events.clone();
    Rc::new(move || {
        if events.try_send(event).is_err() {
            debug!(?event, "Detail session already finished");
        }
    })
}
