//! Theme values and OS appearance detection.
//!
//! This module provides:
//!
//! - [`Theme`]: Light or dark
//! - [`Origin`]: Whether the user or the OS chose the current theme
//! - [`ThemeState`]: A theme paired with its origin
//! - [`detect_system_theme`]: Reads the OS appearance, with a swappable detector

mod detect;
#[allow(clippy::module_inception)]
mod theme;

pub use detect::{detect_system_theme, set_scheme_detector};
pub use theme::{Origin, Theme, ThemeState};
