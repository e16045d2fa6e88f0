//! Main application window and navigation structure.
//!
//! This module implements the `CozyLeafApplication`, which owns the shared
//! services (audio backend, asset fetcher, application state) and builds the
//! window with the gallery as the root navigation page.

use std::rc::Rc;

use {
    anyhow::Result,
    libadwaita::{
        Application, ApplicationWindow, ColorScheme, NavigationPage, NavigationView, StyleManager,
        ToolbarView,
        glib::{ExitCode, MainContext},
        prelude::{
            AdwApplicationWindowExt, ApplicationExt, ApplicationExtManual, GtkApplicationExt,
            GtkWindowExt, NavigationPageExt, WidgetExt,
        },
    },
    tokio::runtime::Handle,
    tracing::{debug, info},
};

use crate::{
    audio::{NativeAudioBackend, PlaybackOptions, fetch::SourceFetcher},
    config::{SettingsManager, ThemePreference, UserSettings},
    error::ResultExt,
    network::{ConnectivityMonitor, GioConnectivityProvider},
    state::{AppState, Route},
    ui::{
        chrome::{WindowBackHandler, WindowChrome},
        header_bar::{APP_TITLE, HeaderBar},
        views::{DetailView, GalleryGridView},
    },
};

/// Application identifier registered with the session bus.
pub const APP_ID: &str = "com.example.cozyleaf";

/// Colour scheme requested for a theme preference.
#[must_use]
pub fn color_scheme_for(preference: ThemePreference) -> ColorScheme {
    match preference {
        ThemePreference::System => ColorScheme::Default,
        ThemePreference::Light => ColorScheme::ForceLight,
        ThemePreference::Dark => ColorScheme::ForceDark,
    }
}

/// Services shared by every page of the window.
#[derive(Clone)]
struct UiContext {
    backend: Rc<NativeAudioBackend>,
    fetcher: SourceFetcher,
    app_state: AppState,
    settings: UserSettings,
}

/// Main application class with window management.
pub struct CozyLeafApplication {
    /// The main application instance.
    pub app: Application,
    /// Native audio backend used by detail pages.
    pub audio_backend: Rc<NativeAudioBackend>,
    /// Loader for bundled and remote assets.
    pub fetcher: SourceFetcher,
    /// Application state manager.
    pub app_state: AppState,
    /// User settings manager.
    pub settings: SettingsManager,
}

impl CozyLeafApplication {
    /// Creates the application and its services.
    ///
    /// # Arguments
    ///
    /// * `settings` - Loaded user settings
    /// * `runtime` - Runtime that runs downloads, decoding and status ticks
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client for remote assets cannot be built.
    pub fn new(settings: SettingsManager, runtime: Handle) -> Result<Self> {
        let (assets_dir, timeout) = {
            let current = settings.get_settings();
            (current.assets_dir(), current.fetch_timeout())
        };
        debug!(assets_dir = %assets_dir.display(), "Resolved assets directory");

        let fetcher = SourceFetcher::new(assets_dir, timeout, runtime.clone())
            .add_context("Failed to initialize asset fetcher")?;
        let audio_backend = Rc::new(NativeAudioBackend::new(fetcher.clone(), runtime));

        let app = Application::builder().application_id(APP_ID).build();

        Ok(Self {
            app,
            audio_backend,
            fetcher,
            app_state: AppState::new(),
            settings,
        })
    }

    /// Runs the GTK main loop until the last window closes.
    pub fn run(&self) -> ExitCode {
        let context = UiContext {
            backend: Rc::clone(&self.audio_backend),
            fetcher: self.fetcher.clone(),
            app_state: self.app_state.clone(),
            settings: self.settings.get_settings().clone(),
        };

        self.app.connect_activate(move |app| {
            // A second launch only raises the existing window.
            if let Some(window) = app.active_window() {
                window.present();
                return;
            }
            build_ui(app, &context);
        });

        self.app.run()
    }
}

/// Builds the window, the gallery page and the connectivity feed.
fn build_ui(app: &Application, context: &UiContext) {
    StyleManager::default().set_color_scheme(color_scheme_for(context.settings.theme_preference));

    let window = ApplicationWindow::builder()
        .application(app)
        .title(APP_TITLE)
        .default_width(420)
        .default_height(760)
        .build();

    let navigation_view = NavigationView::new();
    {
        let app_state = context.app_state.clone();
        navigation_view.connect_popped(move |navigation_view, page| {
            debug!(tag = ?page.tag(), "Page popped");
            let route = navigation_view
                .visible_page()
                .and_then(|visible| visible.tag())
                .and_then(|tag| Route::parse(&tag))
                .unwrap_or_default();
            app_state.update_route(route);
        });
    }

    let on_item_activated = {
        let context = context.clone();
        let window = window.clone();
        let navigation_view = navigation_view.clone();
        Rc::new(move |id: &'static str| {
            // A card can report both a click and an activation.
            if context.app_state.get_route() != Route::Gallery {
                debug!(id, "Detail page already open");
                return;
            }
            open_detail(&context, &window, &navigation_view, id);
        })
    };

    let gallery = GalleryGridView::builder()
        .app_state(context.app_state.clone())
        .fetcher(context.fetcher.clone())
        .columns(context.settings.grid_columns)
        .on_item_activated(on_item_activated)
        .build();

    let header_bar = HeaderBar::new();
    let toolbar = ToolbarView::new();
    toolbar.add_top_bar(&header_bar.widget);
    toolbar.set_content(Some(&gallery.widget));

    let gallery_page = NavigationPage::builder()
        .child(&toolbar)
        .title(APP_TITLE)
        .tag(Route::Gallery.path())
        .build();
    navigation_view.add(&gallery_page);

    window.set_content(Some(&navigation_view));

    // The grid lives as long as the window.
    let gallery = Rc::new(gallery);
    window.connect_destroy(move |_| {
        debug!(cards = gallery.shown_ids().len(), "Gallery closed");
    });

    start_connectivity_feed(&context.app_state);

    window.present();
    info!("Cozy Leaf window presented");
}

/// Pushes the detail page for `id`.
fn open_detail(
    context: &UiContext,
    window: &ApplicationWindow,
    navigation_view: &NavigationView,
    id: &str,
) {
    let options = PlaybackOptions {
        progress_interval: context.settings.progress_interval(),
        ..PlaybackOptions::default()
    };

    let view = DetailView::builder(
        id,
        Rc::clone(&context.backend),
        Rc::new(WindowChrome::new(window)),
        Rc::new(WindowBackHandler::new(window)),
    )
    .app_state(context.app_state.clone())
    .fetcher(context.fetcher.clone())
    .navigation_view(navigation_view.clone())
    .playback_options(options)
    .build();

    navigation_view.push(&view.page);
    context.app_state.update_route(view.route.clone());
}

/// Mirrors connectivity readings into `AppState` for the lifetime of the app.
///
/// This is the only monitor subscription in the process.
fn start_connectivity_feed(app_state: &AppState) {
    let monitor = ConnectivityMonitor::new(Rc::new(GioConnectivityProvider::new()));
    let watch = monitor.subscribe();
    let app_state = app_state.clone();

    MainContext::default().spawn_local(async move {
        while let Some(state) = watch.next().await {
            app_state.update_connectivity(state);
        }
    });
}
