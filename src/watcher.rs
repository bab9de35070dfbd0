//! Following the OS light/dark preference.
//!
//! - [`SchemeSignal`]: The host's "OS scheme changed" event source
//! - [`SchemeChannel`]: An in-process signal fed with [`SchemeChannel::emit`]
//! - [`OsSchemeMonitor`]: Polls the OS appearance and emits on change
//! - [`SystemPreferenceWatcher`]: Forwards OS changes to the state store
//!
//! The watcher offers every OS change to the store as a system default. The
//! store drops it while a user override is on record, so the OS never
//! clobbers an explicit choice.

use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::store::ThemeStateStore;
use crate::theme::{detect_system_theme, Origin, Theme};

/// A source of OS scheme change events carrying "is dark".
pub trait SchemeSignal {
    fn subscribe(&self, listener: Box<dyn Fn(bool)>) -> SignalSubscription;
}

/// Handle for a [`SchemeSignal`] listener.
pub struct SignalSubscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl SignalSubscription {
    /// Wraps the host's unsubscribe action.
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for SignalSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalSubscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

type SchemeListener = Rc<dyn Fn(bool)>;

#[derive(Default)]
struct ChannelListeners {
    next_id: u64,
    entries: Vec<(u64, SchemeListener)>,
}

/// An in-process [`SchemeSignal`].
#[derive(Default)]
pub struct SchemeChannel {
    listeners: Rc<RefCell<ChannelListeners>>,
}

impl SchemeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers an OS scheme change to every listener.
    pub fn emit(&self, is_dark: bool) {
        let snapshot: Vec<SchemeListener> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(is_dark);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }
}

impl SchemeSignal for SchemeChannel {
    fn subscribe(&self, listener: Box<dyn Fn(bool)>) -> SignalSubscription {
        let id = {
            let mut listeners = self.listeners.borrow_mut();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, Rc::from(listener)));
            id
        };

        let weak: Weak<RefCell<ChannelListeners>> = Rc::downgrade(&self.listeners);
        SignalSubscription::new(move || {
            if let Some(listeners) = weak.upgrade() {
                listeners.borrow_mut().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }
}

impl fmt::Debug for SchemeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemeChannel")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Polls the OS appearance and emits a signal when it changes.
///
/// Detection goes through [`detect_system_theme`], so
/// [`set_scheme_detector`](crate::set_scheme_detector) can stand in for the OS.
///
/// # Example
///
/// ```rust
/// use theme_toggle::{set_scheme_detector, OsSchemeMonitor, Theme};
///
/// set_scheme_detector(|| Theme::Light);
/// let monitor = OsSchemeMonitor::new();
/// assert_eq!(monitor.poll(), None);
///
/// set_scheme_detector(|| Theme::Dark);
/// assert_eq!(monitor.poll(), Some(Theme::Dark));
/// assert_eq!(monitor.poll(), None);
/// ```
#[derive(Debug)]
pub struct OsSchemeMonitor {
    channel: Rc<SchemeChannel>,
    last: Cell<Theme>,
}

impl OsSchemeMonitor {
    pub fn new() -> Self {
        Self {
            channel: Rc::new(SchemeChannel::new()),
            last: Cell::new(detect_system_theme()),
        }
    }

    /// The OS theme as of the last poll.
    pub fn current(&self) -> Theme {
        self.last.get()
    }

    /// Re-reads the OS appearance, emitting and returning it if it changed.
    pub fn poll(&self) -> Option<Theme> {
        let theme = detect_system_theme();
        if theme == self.last.get() {
            return None;
        }
        self.last.set(theme);
        debug!("theme-toggle: OS scheme now {theme}");
        self.channel.emit(theme.is_dark());
        Some(theme)
    }

    /// The signal this monitor emits on.
    pub fn signal(&self) -> Rc<dyn SchemeSignal> {
        self.channel.clone()
    }
}

impl Default for OsSchemeMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards OS scheme changes to a [`ThemeStateStore`].
pub struct SystemPreferenceWatcher {
    store: Rc<ThemeStateStore>,
    signal: Option<Rc<dyn SchemeSignal>>,
    os_theme: Rc<Cell<Option<Theme>>>,
    subscription: Option<SignalSubscription>,
}

impl SystemPreferenceWatcher {
    /// Creates a watcher. `signal` is `None` when the host cannot observe
    /// the OS preference.
    pub fn new(store: Rc<ThemeStateStore>, signal: Option<Rc<dyn SchemeSignal>>) -> Self {
        Self {
            store,
            signal,
            os_theme: Rc::new(Cell::new(None)),
            subscription: None,
        }
    }

    /// Starts listening, with `initial` as the OS theme at startup.
    ///
    /// Returns `false` without error when no signal is available. Starting
    /// an already started watcher does nothing.
    pub fn start(&mut self, initial: Theme) -> bool {
        if self.subscription.is_some() {
            return true;
        }
        let Some(signal) = &self.signal else {
            warn!("theme-toggle: OS scheme signal unavailable, not following system theme");
            return false;
        };

        self.os_theme.set(Some(initial));
        let store = Rc::downgrade(&self.store);
        let os_theme = Rc::clone(&self.os_theme);
        let subscription = signal.subscribe(Box::new(move |is_dark| {
            let theme = Theme::from_is_dark(is_dark);
            os_theme.set(Some(theme));
            let Some(store) = store.upgrade() else {
                return;
            };
            if !store.set_theme(theme, Origin::SystemDefault) {
                debug!("theme-toggle: OS {theme} ignored, user override wins");
            }
        }));

        self.subscription = Some(subscription);
        true
    }

    /// Stops listening. Safe to call when not started.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    pub fn is_running(&self) -> bool {
        self.subscription.is_some()
    }

    /// The last OS theme seen, if started.
    pub fn os_theme(&self) -> Option<Theme> {
        self.os_theme.get()
    }
}

impl Drop for SystemPreferenceWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for SystemPreferenceWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemPreferenceWatcher")
            .field("running", &self.is_running())
            .field("os_theme", &self.os_theme())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preference::{MemoryStore, StoredPreference};
    use crate::theme::{set_scheme_detector, ThemeState};
    use serial_test::serial;

    fn store(initial: Theme) -> Rc<ThemeStateStore> {
        Rc::new(ThemeStateStore::new(
            initial,
            StoredPreference::new(MemoryStore::new()),
        ))
    }

    #[test]
    fn test_follows_os_without_override() {
        let store = store(Theme::Light);
        let channel = Rc::new(SchemeChannel::new());
        let mut watcher = SystemPreferenceWatcher::new(Rc::clone(&store), Some(channel.clone()));

        assert!(watcher.start(Theme::Light));
        channel.emit(true);

        assert_eq!(store.state(), ThemeState::system(Theme::Dark));
        assert_eq!(store.persisted(), None);
        assert_eq!(watcher.os_theme(), Some(Theme::Dark));
    }

    #[test]
    fn test_override_wins() {
        let store = store(Theme::Light);
        store.set_theme(Theme::Dark, Origin::UserOverride);
        let channel = Rc::new(SchemeChannel::new());
        let mut watcher = SystemPreferenceWatcher::new(Rc::clone(&store), Some(channel.clone()));
        watcher.start(Theme::Light);

        channel.emit(false);
        channel.emit(true);

        assert_eq!(store.state(), ThemeState::user(Theme::Dark));
        assert_eq!(watcher.os_theme(), Some(Theme::Dark));
    }

    #[test]
    fn test_missing_signal_degrades() {
        let store = store(Theme::Light);
        let mut watcher = SystemPreferenceWatcher::new(Rc::clone(&store), None);

        assert!(!watcher.start(Theme::Light));
        assert!(!watcher.is_running());
        assert_eq!(watcher.os_theme(), None);
    }

    #[test]
    fn test_stop_and_restart() {
        let store = store(Theme::Light);
        let channel = Rc::new(SchemeChannel::new());
        let mut watcher = SystemPreferenceWatcher::new(Rc::clone(&store), Some(channel.clone()));

        watcher.start(Theme::Light);
        watcher.start(Theme::Light);
        assert_eq!(channel.listener_count(), 1);

        watcher.stop();
        assert_eq!(channel.listener_count(), 0);
        channel.emit(true);
        assert_eq!(store.state().theme, Theme::Light);

        assert!(watcher.start(Theme::Dark));
        assert_eq!(watcher.os_theme(), Some(Theme::Dark));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let store = store(Theme::Light);
        let channel = Rc::new(SchemeChannel::new());
        let mut watcher = SystemPreferenceWatcher::new(store, Some(channel.clone()));
        watcher.start(Theme::Light);

        drop(watcher);
        assert_eq!(channel.listener_count(), 0);
    }

    #[test]
    #[serial(scheme_detector)]
    fn test_monitor_drives_watcher() {
        set_scheme_detector(|| Theme::Light);
        let monitor = OsSchemeMonitor::new();
        let store = store(monitor.current());
        let mut watcher = SystemPreferenceWatcher::new(Rc::clone(&store), Some(monitor.signal()));
        watcher.start(monitor.current());

        assert_eq!(monitor.poll(), None);

        set_scheme_detector(|| Theme::Dark);
        assert_eq!(monitor.poll(), Some(Theme::Dark));
        assert_eq!(store.state(), ThemeState::system(Theme::Dark));

        set_scheme_detector(|| Theme::Light);
    }
}
