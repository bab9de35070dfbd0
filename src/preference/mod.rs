//! Persisted theme preference.
//!
//! The presence of a stored preference is the only signal that the user has
//! overridden the OS theme. This module provides:
//!
//! - [`PreferencePort`]: The narrow read/write interface the state store uses
//! - [`StoredPreference`]: A port backed by any [`KeyValueStore`]
//! - [`MemoryStore`] and [`FileStore`]: Key-value backends
//!
//! Storage failures never propagate: reads degrade to "no preference" and
//! writes are dropped, so the theme still toggles in memory for the session.

mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore};

use log::warn;
use std::cell::RefCell;
use std::rc::Rc;

use crate::theme::Theme;

/// Storage key used for the persisted theme.
pub const DEFAULT_STORAGE_KEY: &str = "pref-theme";

/// Reads and writes the single persisted theme preference.
pub trait PreferencePort {
    /// Returns the persisted theme, or `None` when absent or unreadable.
    fn get(&self) -> Option<Theme>;

    /// Persists `theme`. Failures are absorbed by the implementation.
    fn set(&mut self, theme: Theme);
}

impl<P: PreferencePort + ?Sized> PreferencePort for Box<P> {
    fn get(&self) -> Option<Theme> {
        (**self).get()
    }

    fn set(&mut self, theme: Theme) {
        (**self).set(theme)
    }
}

/// Lets a caller keep a handle on a port it hands to the store.
impl<P: PreferencePort> PreferencePort for Rc<RefCell<P>> {
    fn get(&self) -> Option<Theme> {
        self.borrow().get()
    }

    fn set(&mut self, theme: Theme) {
        self.borrow_mut().set(theme)
    }
}

/// A [`PreferencePort`] over a key-value store.
///
/// The theme is stored under a single key as `"light"` or `"dark"`.
///
/// # Example
///
/// ```rust
/// use theme_toggle::{MemoryStore, PreferencePort, StoredPreference, Theme};
///
/// let mut pref = StoredPreference::new(MemoryStore::new());
/// assert_eq!(pref.get(), None);
///
/// pref.set(Theme::Dark);
/// assert_eq!(pref.get(), Some(Theme::Dark));
/// assert_eq!(pref.store().get("pref-theme"), Some("dark"));
/// ```
#[derive(Debug)]
pub struct StoredPreference<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> StoredPreference<S> {
    /// Creates a preference stored under [`DEFAULT_STORAGE_KEY`].
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Removes the persisted preference.
    ///
    /// The state store is not told about this; hosts that offer a
    /// "follow system" reset rebuild their session afterwards.
    pub fn clear(&mut self) {
        if let Err(e) = self.store.remove(&self.key) {
            warn!("theme-toggle: cannot clear '{}': {e}", self.key);
        }
    }
}

impl<S: KeyValueStore> PreferencePort for StoredPreference<S> {
    fn get(&self) -> Option<Theme> {
        let raw = match self.store.load(&self.key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("theme-toggle: cannot read '{}': {e}", self.key);
                return None;
            }
        };
        match raw.parse() {
            Ok(theme) => Some(theme),
            Err(e) => {
                warn!("theme-toggle: ignoring stored preference: {e}");
                None
            }
        }
    }

    fn set(&mut self, theme: Theme) {
        if let Err(e) = self.store.save(&self.key, theme.as_str()) {
            warn!("theme-toggle: cannot persist '{}': {e}", self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_uses_lowercase_values() {
        let mut pref = StoredPreference::new(MemoryStore::new());
        pref.set(Theme::Light);
        assert_eq!(pref.store().get(DEFAULT_STORAGE_KEY), Some("light"));
        assert_eq!(pref.get(), Some(Theme::Light));
    }

    #[test]
    fn test_custom_key() {
        let mut pref = StoredPreference::with_key(MemoryStore::new(), "site.theme");
        pref.set(Theme::Dark);
        assert_eq!(pref.key(), "site.theme");
        assert_eq!(pref.store().get("site.theme"), Some("dark"));
        assert_eq!(pref.store().get(DEFAULT_STORAGE_KEY), None);
    }

    #[test]
    fn test_unparseable_value_is_absent() {
        let store = MemoryStore::new().with_entry(DEFAULT_STORAGE_KEY, "sepia");
        let pref = StoredPreference::new(store);
        assert_eq!(pref.get(), None);
    }

    #[test]
    fn test_unavailable_storage_degrades_silently() {
        let mut pref = StoredPreference::new(MemoryStore::unavailable());
        pref.set(Theme::Dark);
        assert_eq!(pref.get(), None);
        pref.clear();
    }

    #[test]
    fn test_clear_removes_key() {
        let mut pref = StoredPreference::new(MemoryStore::new());
        pref.set(Theme::Dark);
        pref.clear();
        assert_eq!(pref.get(), None);
    }

    #[test]
    fn test_shared_handle_sees_writes() {
        let shared = Rc::new(RefCell::new(StoredPreference::new(MemoryStore::new())));
        let mut port: Box<dyn PreferencePort> = Box::new(Rc::clone(&shared));
        port.set(Theme::Dark);
        assert_eq!(shared.borrow().get(), Some(Theme::Dark));
    }
}
