//! Play/pause button overlaid on the detail image.
//!
//! The button mirrors a [`PlayControl`]: it shows a spinner and refuses input
//! while a load is in flight, so a second toggle cannot start while the first
//! transition is pending.

use std::{cell::Cell, rc::Rc};

use libadwaita::{
    Spinner,
    gtk::{
        AccessibleRole::Button as AccessibleButton,
        Align::{Center, End},
        Button, Widget,
        accessible::Property,
    },
    prelude::{AccessibleExt, AccessibleExtManual, ButtonExt, Cast, WidgetExt},
};

use crate::state::{PlayControl, PlaybackState};

/// Builder pattern for configuring `PlayOverlay` components.
#[derive(Default)]
pub struct PlayOverlayBuilder {
    state: PlaybackState,
    on_toggle: Option<Rc<dyn Fn()>>,
}

impl PlayOverlayBuilder {
    /// Sets the playback state shown initially.
    #[must_use]
    pub fn state(mut self, state: PlaybackState) -> Self {
        self.state = state;
        self
    }

    /// Sets the callback run when the button is clicked.
    #[must_use]
    pub fn on_toggle(mut self, callback: Rc<dyn Fn()>) -> Self {
        self.on_toggle = Some(callback);
        self
    }

    #[must_use]
    pub fn build(self) -> PlayOverlay {
        PlayOverlay::new(self.state, self.on_toggle)
    }
}

/// Circular play/pause control with a loading affordance.
#[derive(Clone)]
pub struct PlayOverlay {
    /// The underlying GTK widget (button).
    pub widget: Widget,
    /// The button widget.
    pub button: Button,
    spinner: Spinner,
    control: Rc<Cell<PlayControl>>,
}

impl PlayOverlay {
    /// Creates the control for `state`.
    #[must_use]
    pub fn new(state: PlaybackState, on_toggle: Option<Rc<dyn Fn()>>) -> Self {
        let button = Button::builder()
            .halign(Center)
            .valign(End)
            .margin_bottom(48)
            .width_request(64)
            .height_request(64)
            .css_classes(["circular", "osd", "play-overlay"])
            .build();
        button.set_accessible_role(AccessibleButton);

        if let Some(callback) = on_toggle {
            button.connect_clicked(move |_| callback());
        }

        let control = PlayControl::for_state(state);
        let overlay = Self {
            widget: button.upcast_ref::<Widget>().clone(),
            button,
            spinner: Spinner::new(),
            control: Rc::new(Cell::new(control)),
        };
        overlay.render(control);
        overlay
    }

    #[must_use]
    pub fn builder() -> PlayOverlayBuilder {
        PlayOverlayBuilder::default()
    }

    /// Updates the control for a new playback state.
    pub fn set_state(&self, state: PlaybackState) {
        let control = PlayControl::for_state(state);
        if self.control.replace(control) != control {
            self.render(control);
        }
    }

    /// Presentation currently shown.
    #[must_use]
    pub fn control(&self) -> PlayControl {
        self.control.get()
    }

    fn render(&self, control: PlayControl) {
        if control.loading {
            self.button.set_child(Some(&self.spinner));
        } else {
            self.button.set_icon_name(control.icon_name);
        }
        self.button.set_sensitive(control.sensitive);
        self.button.set_tooltip_text(Some(control.tooltip));
        self.button.update_property(&[Property::Label(control.accessible_label)]);
    }
}
