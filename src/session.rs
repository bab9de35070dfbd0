//! Page-level wiring.
//!
//! [`ThemeSession`] assembles the store, announcer, toggle controller and
//! OS watcher for one page. Every host-provided part is optional: a missing
//! control, live region, storage or OS signal switches off the matching
//! feature and nothing else.
//!
//! The initial sync is silent. The control attributes are written for the
//! starting theme but nothing is announced, so screen reader users do not
//! hear about the theme on every page load.
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use std::time::Duration;
//! use theme_toggle::{AttributeMap, MemoryStore, SchemeChannel, TextRegion, Theme, ThemeSession};
//!
//! let control = Rc::new(RefCell::new(AttributeMap::new()));
//! let region = Rc::new(RefCell::new(TextRegion::new()));
//! let os = Rc::new(SchemeChannel::new());
//!
//! let session = ThemeSession::builder()
//!     .storage(MemoryStore::new())
//!     .control(Rc::clone(&control))
//!     .live_region(Rc::clone(&region))
//!     .scheme_signal(os.clone())
//!     .build(Theme::Light)
//!     .unwrap();
//!
//! session.on_click();
//! assert_eq!(control.borrow().get("aria-pressed"), Some("true"));
//! assert_eq!(region.borrow().text(), "Switched to dark theme");
//!
//! // The user's choice outranks the OS.
//! os.emit(false);
//! assert_eq!(session.state().theme, Theme::Dark);
//!
//! session.clock().unwrap().advance(Duration::from_millis(1000));
//! assert_eq!(region.borrow().text(), "");
//! ```

use std::fmt;
use std::rc::Rc;

use crate::announce::AccessibilityAnnouncer;
use crate::config::ToggleConfig;
use crate::error::ThemeError;
use crate::preference::{KeyValueStore, MemoryStore, PreferencePort, StoredPreference};
use crate::store::ThemeStateStore;
use crate::surface::{ControlSurface, LiveRegion};
use crate::theme::{Theme, ThemeState};
use crate::timer::{Scheduler, VirtualClock};
use crate::toggle::{Key, Propagation, ToggleController};
use crate::watcher::{SchemeSignal, SystemPreferenceWatcher};

enum PreferenceSource {
    Port(Box<dyn PreferencePort>),
    Storage(Box<dyn KeyValueStore>),
}

/// Builder for [`ThemeSession`].
pub struct ThemeSessionBuilder {
    config: ToggleConfig,
    preference: Option<PreferenceSource>,
    scheduler: Option<Rc<dyn Scheduler>>,
    control: Option<Box<dyn ControlSurface>>,
    live_region: Option<Box<dyn LiveRegion>>,
    signal: Option<Rc<dyn SchemeSignal>>,
    os_theme: Option<Theme>,
}

impl ThemeSessionBuilder {
    fn new() -> Self {
        Self {
            config: ToggleConfig::default(),
            preference: None,
            scheduler: None,
            control: None,
            live_region: None,
            signal: None,
            os_theme: None,
        }
    }

    pub fn config(mut self, config: ToggleConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses `port` for the persisted preference as is.
    pub fn preference<P: PreferencePort + 'static>(mut self, port: P) -> Self {
        self.preference = Some(PreferenceSource::Port(Box::new(port)));
        self
    }

    /// Persists the preference in `store` under the configured key.
    pub fn storage<S: KeyValueStore + 'static>(mut self, store: S) -> Self {
        self.preference = Some(PreferenceSource::Storage(Box::new(store)));
        self
    }

    /// Uses the host's timers. Defaults to a [`VirtualClock`].
    pub fn scheduler(mut self, scheduler: Rc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn control<C: ControlSurface + 'static>(mut self, control: C) -> Self {
        self.control = Some(Box::new(control));
        self
    }

    pub fn live_region<R: LiveRegion + 'static>(mut self, region: R) -> Self {
        self.live_region = Some(Box::new(region));
        self
    }

    pub fn scheme_signal(mut self, signal: Rc<dyn SchemeSignal>) -> Self {
        self.signal = Some(signal);
        self
    }

    /// The OS theme at startup, if it differs from the page's initial theme.
    pub fn os_theme(mut self, theme: Theme) -> Self {
        self.os_theme = Some(theme);
        self
    }

    /// Wires everything up, starting from the bootstrap theme `initial`.
    ///
    /// # Errors
    ///
    /// Returns [`ThemeError::Template`] if the configured messages do not
    /// compile. Missing host parts never cause an error.
    pub fn build(self, initial: Theme) -> Result<ThemeSession, ThemeError> {
        let messages = Rc::new(self.config.compile_messages()?);

        let store = Rc::new(match self.preference {
            Some(PreferenceSource::Port(port)) => ThemeStateStore::new(initial, port),
            Some(PreferenceSource::Storage(storage)) => ThemeStateStore::new(
                initial,
                StoredPreference::with_key(storage, self.config.storage_key.as_str()),
            ),
            None => {
                log::debug!("theme-toggle: no storage given, preference lasts for this session");
                let key = self.config.storage_key.as_str();
                ThemeStateStore::new(initial, StoredPreference::with_key(MemoryStore::new(), key))
            }
        });

        let (scheduler, clock) = match self.scheduler {
            Some(scheduler) => (scheduler, None),
            None => {
                let clock = Rc::new(VirtualClock::new());
                let scheduler: Rc<dyn Scheduler> = clock.clone();
                (scheduler, Some(clock))
            }
        };

        let announcer = AccessibilityAnnouncer::attach(
            self.live_region,
            scheduler,
            Rc::clone(&messages),
            self.config.clear_delay(),
        );
        let controller =
            ToggleController::install(self.control, Rc::clone(&store), announcer, messages);

        let mut watcher = SystemPreferenceWatcher::new(Rc::clone(&store), self.signal);
        watcher.start(self.os_theme.unwrap_or(initial));

        Ok(ThemeSession {
            controller,
            watcher,
            store,
            clock,
        })
    }
}

impl fmt::Debug for ThemeSessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeSessionBuilder")
            .field("config", &self.config)
            .field("control", &self.control.is_some())
            .field("live_region", &self.live_region.is_some())
            .field("signal", &self.signal.is_some())
            .finish_non_exhaustive()
    }
}

/// The theme toggle for one page, alive for the page's lifetime.
#[derive(Debug)]
pub struct ThemeSession {
    controller: Option<ToggleController>,
    watcher: SystemPreferenceWatcher,
    store: Rc<ThemeStateStore>,
    clock: Option<Rc<VirtualClock>>,
}

impl ThemeSession {
    pub fn builder() -> ThemeSessionBuilder {
        ThemeSessionBuilder::new()
    }

    pub fn state(&self) -> ThemeState {
        self.store.state()
    }

    /// The store, for hosts that restyle the page on change.
    pub fn store(&self) -> &Rc<ThemeStateStore> {
        &self.store
    }

    /// The controller, or `None` if the page has no toggle control.
    pub fn controller(&self) -> Option<&ToggleController> {
        self.controller.as_ref()
    }

    pub fn watcher(&self) -> &SystemPreferenceWatcher {
        &self.watcher
    }

    /// The built-in clock, when no scheduler was supplied.
    pub fn clock(&self) -> Option<&Rc<VirtualClock>> {
        self.clock.as_ref()
    }

    /// Pointer activation of the toggle. Does nothing without a control.
    pub fn on_click(&self) -> Propagation {
        match &self.controller {
            Some(controller) => controller.on_click(),
            None => Propagation::Continue,
        }
    }

    /// Key press on the toggle. Does nothing without a control.
    pub fn on_key(&self, key: Key) -> Propagation {
        match &self.controller {
            Some(controller) => controller.on_key(key),
            None => Propagation::Continue,
        }
    }
}
