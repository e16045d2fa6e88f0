//! Window-backed implementations of the platform traits.
//!
//! On the desktop the "system bars" are the window decorations and panels,
//! hidden by going fullscreen. The hardware back action is Escape, BackSpace,
//! Alt+Left, or the mouse back button.

use std::rc::Rc;

use {
    libadwaita::{
        glib::Propagation,
        gtk::{
            EventControllerKey, EventSequenceState::Claimed, GestureClick,
            PropagationPhase::Capture, Window,
            gdk::{Key, ModifierType},
        },
        prelude::{Cast, EventControllerExt, GestureExt, GtkWindowExt, IsA, WidgetExt},
    },
    tracing::debug,
};

use crate::platform::{HardwareBack, Subscription, SystemChrome};

/// Mouse button reported for the "back" side button.
pub const MOUSE_BACK_BUTTON: u32 = 8;

/// Whether a key press is a back shortcut.
#[must_use]
pub fn is_back_shortcut(key: Key, modifiers: ModifierType) -> bool {
    let held = modifiers & (ModifierType::CONTROL_MASK | ModifierType::ALT_MASK);

    if key == Key::Escape || key == Key::BackSpace {
        held.is_empty()
    } else if key == Key::Left {
        held == ModifierType::ALT_MASK
    } else {
        false
    }
}

/// Hides the system chrome by making the window fullscreen.
#[derive(Debug, Clone)]
pub struct WindowChrome {
    window: Window,
}

impl WindowChrome {
    #[must_use]
    pub fn new(window: &impl IsA<Window>) -> Self {
        Self {
            window: window.clone().upcast(),
        }
    }
}

impl SystemChrome for WindowChrome {
    fn set_system_bars_hidden(&self, hidden: bool) {
        debug!(hidden, "Setting system chrome visibility");
        if hidden {
            self.window.fullscreen();
        } else {
            self.window.unfullscreen();
        }
    }
}

/// Intercepts back shortcuts on a window.
#[derive(Debug, Clone)]
pub struct WindowBackHandler {
    window: Window,
}

impl WindowBackHandler {
    #[must_use]
    pub fn new(window: &impl IsA<Window>) -> Self {
        Self {
            window: window.clone().upcast(),
        }
    }
}

impl HardwareBack for WindowBackHandler {
    fn on_hardware_back(&self, callback: Box<dyn Fn()>) -> Subscription {
        let callback: Rc<dyn Fn()> = Rc::from(callback);

        let keys = EventControllerKey::new();
        keys.set_propagation_phase(Capture);
        let key_callback = Rc::clone(&callback);
        keys.connect_key_pressed(move |_, key, _, modifiers| {
            if is_back_shortcut(key, modifiers) {
                key_callback();
                Propagation::Stop
            } else {
                Propagation::Proceed
            }
        });

        let mouse = GestureClick::builder().button(MOUSE_BACK_BUTTON).build();
        mouse.set_propagation_phase(Capture);
        mouse.connect_pressed(move |gesture, _, _, _| {
            gesture.set_state(Claimed);
            callback();
        });

        self.window.add_controller(keys.clone());
        self.window.add_controller(mouse.clone());
        debug!("Back interceptor installed");

        let window = self.window.clone();
        Subscription::new(move || {
            window.remove_controller(&keys);
            window.remove_controller(&mouse);
            debug!("Back interceptor removed");
        })
    }
}
