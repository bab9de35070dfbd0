//! Theme, origin and state values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ThemeError;

/// A visual theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// The theme a toggle switches to from this one.
    pub fn opposite(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    /// Maps an "is dark" flag, as carried by OS scheme signals.
    pub fn from_is_dark(is_dark: bool) -> Self {
        if is_dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    /// The lowercase name used in storage and in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ThemeError;

    /// Parses `light` or `dark`, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("light") {
            Ok(Theme::Light)
        } else if name.eq_ignore_ascii_case("dark") {
            Ok(Theme::Dark)
        } else {
            Err(ThemeError::UnknownTheme(s.to_string()))
        }
    }
}

/// Which actor most recently determined the theme.
///
/// A user override takes precedence over OS scheme changes until the user
/// toggles again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    UserOverride,
    SystemDefault,
}

/// The current theme and why it was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThemeState {
    pub theme: Theme,
    pub origin: Origin,
}

impl ThemeState {
    pub fn new(theme: Theme, origin: Origin) -> Self {
        Self { theme, origin }
    }

    /// A theme chosen explicitly by the user.
    pub fn user(theme: Theme) -> Self {
        Self::new(theme, Origin::UserOverride)
    }

    /// A theme following the OS preference.
    pub fn system(theme: Theme) -> Self {
        Self::new(theme, Origin::SystemDefault)
    }

    pub fn is_override(&self) -> bool {
        self.origin == Origin::UserOverride
    }
}
