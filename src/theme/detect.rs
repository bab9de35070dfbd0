//! OS appearance detection.

use dark_light::{detect as detect_os_theme, Mode as OsThemeMode};
use once_cell::sync::Lazy;
use std::sync::{Mutex, PoisonError};

use super::theme::Theme;

type SchemeDetector = fn() -> Theme;

static SCHEME_DETECTOR: Lazy<Mutex<SchemeDetector>> = Lazy::new(|| Mutex::new(os_scheme_detector));

/// Overrides the detector used to read the OS light/dark preference.
///
/// Useful for tests and for hosts that learn the preference some other way
/// (for example from a `prefers-color-scheme` media query).
pub fn set_scheme_detector(detector: SchemeDetector) {
    let mut guard = SCHEME_DETECTOR
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    *guard = detector;
}

/// Returns the theme the operating system currently prefers.
pub fn detect_system_theme() -> Theme {
    let detector = SCHEME_DETECTOR
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    (*detector)()
}

fn os_scheme_detector() -> Theme {
    match detect_os_theme() {
        OsThemeMode::Dark => Theme::Dark,
        OsThemeMode::Light => Theme::Light,
    }
}
