//! The toggle control's input handling.
//!
//! Pointer clicks, Enter and Space all call [`ToggleController::on_activate`]
//! directly. No input path re-dispatches a synthetic click, so one key press
//! can never toggle twice.
//!
//! The controller subscribes to the [`ThemeStateStore`]. Whenever the state
//! changes, for any reason, it first writes the control attributes and then
//! asks the announcer to speak, so the live region never describes a control
//! state that is not yet visible to assistive technology.

use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::announce::AccessibilityAnnouncer;
use crate::messages::Messages;
use crate::store::{Subscription, ThemeStateStore};
use crate::surface::ControlSurface;
use crate::theme::{Origin, Theme, ThemeState};

/// A keyboard key, as far as the toggle cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Other,
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Enter" => Key::Enter,
            " " | "Spacebar" => Key::Space,
            _ => Key::Other,
        }
    }
}

/// Whether the host should suppress the event's default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    PreventDefault,
    Continue,
}

/// Mirrors store notifications onto the control and the live region.
///
/// Attributes are always written before the announcement, so assistive
/// technology reading the control on announcement sees the new state.
struct Reflector {
    control: RefCell<Box<dyn ControlSurface>>,
    messages: Rc<Messages>,
    announcer: Option<AccessibilityAnnouncer>,
    reflected: Cell<Theme>,
}

impl Reflector {
    fn apply(&self, theme: Theme) {
        let attrs = self.messages.describe_control(theme);
        let mut control = self.control.borrow_mut();
        for (name, value) in attrs.pairs() {
            control.set_attribute(name, value);
        }
        self.reflected.set(theme);
    }

    /// Re-syncs the control for `state` and announces a changed theme.
    ///
    /// An origin-only change (same theme, new origin) rewrites the attributes
    /// but is not announced.
    fn on_state(&self, state: ThemeState) {
        let changed = self.reflected.get() != state.theme;
        self.apply(state.theme);
        if !changed {
            debug!("theme-toggle: origin now {:?}, nothing to announce", state.origin);
            return;
        }
        if let Some(announcer) = &self.announcer {
            announcer.announce(state.theme);
        }
    }
}

/// Binds a toggle control to the theme store.
pub struct ToggleController {
    store: Rc<ThemeStateStore>,
    reflector: Rc<Reflector>,
    subscription: Option<Subscription>,
}

impl ToggleController {
    /// Installs the controller on `control`.
    ///
    /// The control is synced to the current state without an announcement.
    /// Returns `None`, after logging a warning, if the host has no control.
    pub fn install<C>(
        control: Option<C>,
        store: Rc<ThemeStateStore>,
        announcer: Option<AccessibilityAnnouncer>,
        messages: Rc<Messages>,
    ) -> Option<Self>
    where
        C: ControlSurface + 'static,
    {
        let Some(control) = control else {
            warn!("theme-toggle: no toggle control, handlers not installed");
            return None;
        };

        let current = store.state().theme;
        let reflector = Rc::new(Reflector {
            control: RefCell::new(Box::new(control)),
            messages,
            announcer,
            reflected: Cell::new(current),
        });
        reflector.apply(current);

        let weak: Weak<Reflector> = Rc::downgrade(&reflector);
        let subscription = store.subscribe(move |state| {
            if let Some(reflector) = weak.upgrade() {
                reflector.on_state(state);
            }
        });

        Some(Self {
            store,
            reflector,
            subscription: Some(subscription),
        })
    }

    /// Switches to the opposite theme as an explicit user choice.
    ///
    /// Returns whether the store accepted the change.
    pub fn on_activate(&self) -> bool {
        let next = self.store.state().theme.opposite();
        self.store.set_theme(next, Origin::UserOverride)
    }

    /// Pointer activation.
    pub fn on_click(&self) -> Propagation {
        self.on_activate();
        Propagation::PreventDefault
    }

    /// Keyboard activation. Enter and Space toggle; other keys pass through.
    pub fn on_key(&self, key: Key) -> Propagation {
        match key {
            Key::Enter | Key::Space => {
                self.on_activate();
                Propagation::PreventDefault
            }
            Key::Other => Propagation::Continue,
        }
    }

    /// The theme the control attributes currently describe.
    pub fn reflected_theme(&self) -> Theme {
        self.reflector.reflected.get()
    }

    pub fn announcer(&self) -> Option<&AccessibilityAnnouncer> {
        self.reflector.announcer.as_ref()
    }

    pub fn store(&self) -> &Rc<ThemeStateStore> {
        &self.store
    }
}

impl Drop for ToggleController {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

impl fmt::Debug for ToggleController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToggleController")
            .field("state", &self.store.state())
            .field("reflected", &self.reflected_theme())
            .field("announcer", &self.reflector.announcer)
            .finish()
    }
}
