//! # Theme Toggle - Accessible light/dark switching
//!
//! `theme-toggle` keeps a page's light/dark theme, the toggle control's ARIA
//! attributes and a screen reader live region in agreement, while arbitrating
//! between the user's explicit choice and the operating system's preference.
//!
//! ## Core Concepts
//!
//! - [`ThemeStateStore`]: The current [`Theme`] and its [`Origin`]. A user
//!   override is persisted and outranks OS changes until the user toggles again
//! - [`PreferencePort`]: Reads and writes the persisted choice
//!   (key `"pref-theme"`, values `"light"`/`"dark"`)
//! - [`ToggleController`]: Click, Enter and Space all funnel into one
//!   activation handler; attributes update before anything is announced
//! - [`AccessibilityAnnouncer`]: Writes "Switched to dark theme" into the
//!   live region and clears it after a delay, cancelling stale clears
//! - [`SystemPreferenceWatcher`]: Offers OS scheme changes to the store
//! - [`ThemeSession`]: Wires all of the above for one page
//!
//! ## Quick Start
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use theme_toggle::{AttributeMap, Key, MemoryStore, TextRegion, Theme, ThemeSession};
//!
//! let control = Rc::new(RefCell::new(AttributeMap::new()));
//! let region = Rc::new(RefCell::new(TextRegion::new()));
//!
//! let session = ThemeSession::builder()
//!     .storage(MemoryStore::new())
//!     .control(Rc::clone(&control))
//!     .live_region(Rc::clone(&region))
//!     .build(Theme::Light)
//!     .unwrap();
//!
//! session.on_key(Key::from_dom("Enter"));
//! assert_eq!(
//!     control.borrow().get("aria-label"),
//!     Some("Switch to light theme. Current theme: dark")
//! );
//! ```
//!
//! ## Execution Model
//!
//! Everything runs on one thread, cooperatively: handlers run to completion
//! and the only deferred work is the live region's clear, scheduled through a
//! [`Scheduler`]. Shared state uses `Rc` and `RefCell`; nothing is `Send`.
//!
//! ## Failure Model
//!
//! Runtime operations never fail. Blocked storage, a missing OS signal, a
//! missing control or live region each disable one feature and log a warning
//! through the [`log`] facade. Errors are only returned while parsing theme
//! names, templates and configuration.

pub mod announce;
pub mod config;
pub mod error;
pub mod messages;
pub mod preference;
pub mod session;
pub mod store;
pub mod surface;
pub mod theme;
pub mod timer;
pub mod toggle;
pub mod watcher;

pub use announce::{AccessibilityAnnouncer, DEFAULT_CLEAR_DELAY};
pub use config::ToggleConfig;
pub use error::{StoreError, ThemeError};
pub use messages::{
    announcement_text, describe_control, ControlAttributes, MessageConfig, Messages, ARIA_LABEL,
    ARIA_PRESSED, TITLE,
};
pub use preference::{
    FileStore, KeyValueStore, MemoryStore, PreferencePort, StoredPreference, DEFAULT_STORAGE_KEY,
};
pub use session::{ThemeSession, ThemeSessionBuilder};
pub use store::{Subscription, ThemeStateStore};
pub use surface::{AttributeMap, ControlSurface, LiveRegion, TextRegion};
pub use theme::{detect_system_theme, set_scheme_detector, Origin, Theme, ThemeState};
pub use timer::{Scheduler, Task, Timer, TimerId, VirtualClock};
pub use toggle::{Key, Propagation, ToggleController};
pub use watcher::{
    OsSchemeMonitor, SchemeChannel, SchemeSignal, SignalSubscription, SystemPreferenceWatcher,
};
