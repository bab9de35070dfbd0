//! Screen reader announcements.
//!
//! [`AccessibilityAnnouncer`] writes a message into the live region and
//! clears it after a delay. Every announcement replaces the pending clear of
//! the previous one, so the region is never emptied by a stale timer and
//! always holds the latest message for the full delay.

use log::{debug, warn};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::messages::{ControlAttributes, Messages};
use crate::surface::LiveRegion;
use crate::theme::Theme;
use crate::timer::{Scheduler, Timer};

/// How long an announcement stays in the live region.
pub const DEFAULT_CLEAR_DELAY: Duration = Duration::from_millis(1000);

/// Owns the live region and its auto-clear timer.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use std::time::Duration;
/// use theme_toggle::{AccessibilityAnnouncer, TextRegion, Theme, VirtualClock};
///
/// let clock = Rc::new(VirtualClock::new());
/// let region = Rc::new(RefCell::new(TextRegion::new()));
/// let announcer = AccessibilityAnnouncer::new(Rc::clone(&region), clock.clone());
///
/// announcer.announce(Theme::Dark);
/// assert_eq!(region.borrow().text(), "Switched to dark theme");
///
/// clock.advance(Duration::from_millis(1000));
/// assert_eq!(region.borrow().text(), "");
/// ```
pub struct AccessibilityAnnouncer {
    region: Rc<RefCell<dyn LiveRegion>>,
    messages: Rc<Messages>,
    clear_delay: Duration,
    clear: Timer,
}

impl AccessibilityAnnouncer {
    /// Creates an announcer with the built-in messages and default delay.
    pub fn new<R>(region: R, scheduler: Rc<dyn Scheduler>) -> Self
    where
        R: LiveRegion + 'static,
    {
        Self::with_messages(region, scheduler, Messages::builtin(), DEFAULT_CLEAR_DELAY)
    }

    pub fn with_messages<R>(
        region: R,
        scheduler: Rc<dyn Scheduler>,
        messages: Rc<Messages>,
        clear_delay: Duration,
    ) -> Self
    where
        R: LiveRegion + 'static,
    {
        Self {
            region: Rc::new(RefCell::new(region)),
            messages,
            clear_delay,
            clear: Timer::new(scheduler),
        }
    }

    /// Builds an announcer if the host supplied a live region.
    ///
    /// Without one, announcements are disabled and a warning is logged.
    pub fn attach<R>(
        region: Option<R>,
        scheduler: Rc<dyn Scheduler>,
        messages: Rc<Messages>,
        clear_delay: Duration,
    ) -> Option<Self>
    where
        R: LiveRegion + 'static,
    {
        match region {
            Some(region) => Some(Self::with_messages(region, scheduler, messages, clear_delay)),
            None => {
                warn!("theme-toggle: no live region, announcements disabled");
                None
            }
        }
    }

    /// Announces a switch to `theme` and schedules the region to clear.
    pub fn announce(&self, theme: Theme) {
        let text = self.messages.announcement(theme);
        self.region.borrow_mut().set_text(&text);
        debug!("theme-toggle: announced {text:?}");

        // Replacing cancels the previous announcement's clear.
        let region = Rc::downgrade(&self.region);
        self.clear.replace(self.clear_delay, move || {
            if let Some(region) = region.upgrade() {
                region.borrow_mut().set_text("");
            }
        });
    }

    /// Attributes for a control whose current theme is `theme`.
    pub fn describe_control(&self, theme: Theme) -> ControlAttributes {
        self.messages.describe_control(theme)
    }

    /// Whether an announcement is still waiting to be cleared.
    pub fn is_clear_pending(&self) -> bool {
        self.clear.is_pending()
    }

    pub fn clear_delay(&self) -> Duration {
        self.clear_delay
    }
}

impl fmt::Debug for AccessibilityAnnouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessibilityAnnouncer")
            .field("clear_delay", &self.clear_delay)
            .field("clear", &self.clear)
            .finish_non_exhaustive()
    }
}
