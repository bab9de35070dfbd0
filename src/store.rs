//! The single source of truth for the current theme.
//!
//! [`ThemeStateStore`] decides whether a requested change is accepted:
//!
//! | Request | Current origin | Result |
//! |---------|----------------|--------|
//! | `UserOverride` | any | accepted, persisted |
//! | `SystemDefault` | `SystemDefault` | accepted, not persisted |
//! | `SystemDefault` | `UserOverride` | rejected |
//!
//! An accepted request that leaves `(theme, origin)` unchanged is a no-op:
//! nothing is persisted and subscribers are not notified again.
//!
//! Subscribers run synchronously inside [`ThemeStateStore::set_theme`], after
//! the new state is in place and with no internal borrow held, so a listener
//! may read the store or even request another change. A change requested from
//! inside a listener is queued: every listener first sees the current
//! notification, then the queued ones in order, so the last state each
//! listener receives is always [`ThemeStateStore::state`].

use log::{debug, trace};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::preference::PreferencePort;
use crate::theme::{Origin, Theme, ThemeState};

type Listener = Rc<dyn Fn(ThemeState)>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Holds the current [`ThemeState`] and arbitrates between user and OS.
///
/// # Example
///
/// ```rust
/// use theme_toggle::{MemoryStore, Origin, StoredPreference, Theme, ThemeState, ThemeStateStore};
///
/// let store = ThemeStateStore::new(Theme::Light, StoredPreference::new(MemoryStore::new()));
/// assert_eq!(store.state(), ThemeState::system(Theme::Light));
///
/// // The OS may move a system-default theme...
/// assert!(store.set_theme(Theme::Dark, Origin::SystemDefault));
///
/// // ...but not one the user picked.
/// assert!(store.set_theme(Theme::Light, Origin::UserOverride));
/// assert!(!store.set_theme(Theme::Dark, Origin::SystemDefault));
/// assert_eq!(store.state(), ThemeState::user(Theme::Light));
/// ```
pub struct ThemeStateStore {
    state: Cell<ThemeState>,
    preference: RefCell<Box<dyn PreferencePort>>,
    listeners: Rc<RefCell<Listeners>>,
    notifying: Cell<bool>,
    pending: RefCell<VecDeque<ThemeState>>,
}

impl ThemeStateStore {
    /// Creates a store seeded from the bootstrap theme and the persisted preference.
    ///
    /// A persisted preference wins over `initial` and marks the state as a
    /// user override; otherwise `initial` is taken as the system default.
    pub fn new<P>(initial: Theme, preference: P) -> Self
    where
        P: PreferencePort + 'static,
    {
        let state = match preference.get() {
            Some(saved) => {
                if saved != initial {
                    debug!("theme-toggle: persisted {saved} overrides initial {initial}");
                }
                ThemeState::user(saved)
            }
            None => ThemeState::system(initial),
        };

        Self {
            state: Cell::new(state),
            preference: RefCell::new(Box::new(preference)),
            listeners: Rc::new(RefCell::new(Listeners::default())),
            notifying: Cell::new(false),
            pending: RefCell::new(VecDeque::new()),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> ThemeState {
        self.state.get()
    }

    /// Reads the persisted preference through the port.
    pub fn persisted(&self) -> Option<Theme> {
        self.preference.borrow().get()
    }

    /// Requests a theme change, returning whether it was accepted.
    ///
    /// See the module docs for the acceptance rules.
    pub fn set_theme(&self, theme: Theme, origin: Origin) -> bool {
        let current = self.state.get();
        if origin == Origin::SystemDefault && current.is_override() {
            trace!("theme-toggle: system {theme} ignored, user override {current:?} on record");
            return false;
        }

        let next = ThemeState::new(theme, origin);
        if next == current {
            trace!("theme-toggle: {next:?} unchanged");
            return true;
        }

        if origin == Origin::UserOverride {
            self.preference.borrow_mut().set(theme);
        }
        self.state.set(next);
        debug!("theme-toggle: {current:?} -> {next:?}");

        self.notify(next);
        true
    }

    /// Registers a listener called once per accepted, state-changing request.
    ///
    /// The listener stays registered until [`Subscription::unsubscribe`] is
    /// called; dropping the handle leaves it in place.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(ThemeState) + 'static,
    {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Rc::new(listener)));

        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }

    fn notify(&self, state: ThemeState) {
        self.pending.borrow_mut().push_back(state);
        if self.notifying.get() {
            trace!("theme-toggle: {state:?} queued behind running notification");
            return;
        }

        self.notifying.set(true);
        let _reset = ResetOnDrop(&self.notifying);
        loop {
            // Popped in its own statement so the queue is free while listeners run.
            let Some(state) = self.pending.borrow_mut().pop_front() else {
                break;
            };
            let snapshot: Vec<Listener> = self
                .listeners
                .borrow()
                .entries
                .iter()
                .map(|(_, listener)| Rc::clone(listener))
                .collect();

            for listener in snapshot {
                listener(state);
            }
        }
    }
}

/// Clears the notifying flag even if a listener panics.
struct ResetOnDrop<'a>(&'a Cell<bool>);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl fmt::Debug for ThemeStateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeStateStore")
            .field("state", &self.state.get())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Handle returned by [`ThemeStateStore::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl Subscription {
    /// Removes the listener. Does nothing if the store is gone.
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .borrow_mut()
                .entries
                .retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preference::{MemoryStore, StoredPreference};

    /// Port that records every write.
    #[derive(Default)]
    struct RecordingPort {
        value: Option<Theme>,
        writes: Vec<Theme>,
    }

    impl PreferencePort for RecordingPort {
        fn get(&self) -> Option<Theme> {
            self.value
        }

        fn set(&mut self, theme: Theme) {
            self.value = Some(theme);
            self.writes.push(theme);
        }
    }

    fn recording(value: Option<Theme>) -> Rc<RefCell<RecordingPort>> {
        Rc::new(RefCell::new(RecordingPort {
            value,
            writes: Vec::new(),
        }))
    }

    fn counter(store: &ThemeStateStore) -> (Rc<RefCell<Vec<ThemeState>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |state| sink.borrow_mut().push(state));
        (seen, sub)
    }

    #[test]
    fn test_seed_without_preference_is_system_default() {
        let store = ThemeStateStore::new(Theme::Dark, recording(None));
        assert_eq!(store.state(), ThemeState::system(Theme::Dark));
    }

    #[test]
    fn test_seed_with_preference_is_override() {
        let store = ThemeStateStore::new(Theme::Light, recording(Some(Theme::Dark)));
        assert_eq!(store.state(), ThemeState::user(Theme::Dark));
    }

    #[test]
    fn test_user_override_persists() {
        let port = recording(None);
        let store = ThemeStateStore::new(Theme::Light, Rc::clone(&port));

        assert!(store.set_theme(Theme::Dark, Origin::UserOverride));
        assert_eq!(store.state(), ThemeState::user(Theme::Dark));
        assert_eq!(store.persisted(), Some(Theme::Dark));
        assert_eq!(port.borrow().writes, vec![Theme::Dark]);
    }

    #[test]
    fn test_repeated_override_notifies_once() {
        let port = recording(None);
        let store = ThemeStateStore::new(Theme::Light, Rc::clone(&port));
        let (seen, _sub) = counter(&store);

        assert!(store.set_theme(Theme::Dark, Origin::UserOverride));
        assert!(store.set_theme(Theme::Dark, Origin::UserOverride));

        assert_eq!(*seen.borrow(), vec![ThemeState::user(Theme::Dark)]);
        assert_eq!(port.borrow().writes.len(), 1);
    }

    #[test]
    fn test_system_change_without_override() {
        let port = recording(None);
        let store = ThemeStateStore::new(Theme::Light, Rc::clone(&port));
        let (seen, _sub) = counter(&store);

        assert!(store.set_theme(Theme::Dark, Origin::SystemDefault));
        assert_eq!(store.state(), ThemeState::system(Theme::Dark));
        assert_eq!(seen.borrow().len(), 1);
        assert!(port.borrow().writes.is_empty());
    }

    #[test]
    fn test_system_change_rejected_after_override() {
        let store = ThemeStateStore::new(Theme::Light, recording(None));
        store.set_theme(Theme::Dark, Origin::UserOverride);
        let (seen, _sub) = counter(&store);

        assert!(!store.set_theme(Theme::Light, Origin::SystemDefault));
        assert!(!store.set_theme(Theme::Dark, Origin::SystemDefault));
        assert_eq!(store.state(), ThemeState::user(Theme::Dark));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_system_noop_is_accepted_silently() {
        let store = ThemeStateStore::new(Theme::Light, recording(None));
        let (seen, _sub) = counter(&store);

        assert!(store.set_theme(Theme::Light, Origin::SystemDefault));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_origin_only_change_notifies() {
        let store = ThemeStateStore::new(Theme::Dark, recording(None));
        let (seen, _sub) = counter(&store);

        assert!(store.set_theme(Theme::Dark, Origin::UserOverride));
        assert_eq!(*seen.borrow(), vec![ThemeState::user(Theme::Dark)]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = ThemeStateStore::new(Theme::Light, recording(None));
        let (seen, sub) = counter(&store);
        assert_eq!(store.listener_count(), 1);

        sub.unsubscribe();
        assert_eq!(store.listener_count(), 0);

        store.set_theme(Theme::Dark, Origin::UserOverride);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_unsubscribe_after_store_dropped() {
        let store = ThemeStateStore::new(Theme::Light, recording(None));
        let (_seen, sub) = counter(&store);
        drop(store);
        sub.unsubscribe();
    }

    #[test]
    fn test_listener_can_read_store() {
        let store = Rc::new(ThemeStateStore::new(Theme::Light, recording(None)));
        let observed = Rc::new(Cell::new(None));

        let weak = Rc::downgrade(&store);
        let sink = Rc::clone(&observed);
        let _sub = store.subscribe(move |_| {
            if let Some(store) = weak.upgrade() {
                sink.set(Some(store.state()));
            }
        });

        store.set_theme(Theme::Dark, Origin::UserOverride);
        assert_eq!(observed.get(), Some(ThemeState::user(Theme::Dark)));
    }

    #[test]
    fn test_storage_failure_still_toggles_in_memory() {
        let store = ThemeStateStore::new(
            Theme::Light,
            StoredPreference::new(MemoryStore::unavailable()),
        );

        assert!(store.set_theme(Theme::Dark, Origin::UserOverride));
        assert_eq!(store.state(), ThemeState::user(Theme::Dark));
        assert_eq!(store.persisted(), None);

        // The in-session override still outranks the OS.
        assert!(!store.set_theme(Theme::Light, Origin::SystemDefault));
    }

    #[test]
    fn test_change_from_listener_is_delivered_last() {
        let store = Rc::new(ThemeStateStore::new(Theme::Light, recording(None)));

        let weak = Rc::downgrade(&store);
        let _flip = store.subscribe(move |state| {
            if state == ThemeState::system(Theme::Dark) {
                if let Some(store) = weak.upgrade() {
                    assert!(store.set_theme(Theme::Light, Origin::UserOverride));
                }
            }
        });
        let (seen, _sub) = counter(&store);

        store.set_theme(Theme::Dark, Origin::SystemDefault);

        assert_eq!(store.state(), ThemeState::user(Theme::Light));
        assert_eq!(
            *seen.borrow(),
            vec![ThemeState::system(Theme::Dark), ThemeState::user(Theme::Light)]
        );
        assert_eq!(seen.borrow().last().copied(), Some(store.state()));
    }

    #[test]
    fn test_notifications_resume_after_nested_change() {
        let store = Rc::new(ThemeStateStore::new(Theme::Light, recording(None)));

        let weak = Rc::downgrade(&store);
        let _flip = store.subscribe(move |state| {
            if state == ThemeState::system(Theme::Dark) {
                if let Some(store) = weak.upgrade() {
                    store.set_theme(Theme::Light, Origin::UserOverride);
                }
            }
        });
        store.set_theme(Theme::Dark, Origin::SystemDefault);

        let (seen, _sub) = counter(&store);
        store.set_theme(Theme::Dark, Origin::UserOverride);
        assert_eq!(*seen.borrow(), vec![ThemeState::user(Theme::Dark)]);
    }
}
