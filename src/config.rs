//! Toggle configuration.
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```yaml
//! storage_key: pref-theme
//! clear_delay_ms: 1000
//! messages:
//!   announcement: "Switched to {{ current }} theme"
//!   aria_label: "Switch to {{ target }} theme. Current theme: {{ current }}"
//!   title: "Switch to {{ target }} theme ({{ shortcut }})"
//!   shortcut: "Alt + T"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::announce::DEFAULT_CLEAR_DELAY;
use crate::error::ThemeError;
use crate::messages::{MessageConfig, Messages};
use crate::preference::DEFAULT_STORAGE_KEY;

/// Settings for a theme toggle session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToggleConfig {
    /// Key the user's preference is stored under.
    pub storage_key: String,
    /// How long announcements stay in the live region, in milliseconds.
    pub clear_delay_ms: u64,
    pub messages: MessageConfig,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            clear_delay_ms: DEFAULT_CLEAR_DELAY.as_millis() as u64,
            messages: MessageConfig::default(),
        }
    }
}

impl ToggleConfig {
    /// Parses a YAML document.
    ///
    /// # Example
    ///
    /// ```rust
    /// use theme_toggle::ToggleConfig;
    ///
    /// let config = ToggleConfig::from_yaml("clear_delay_ms: 1500").unwrap();
    /// assert_eq!(config.clear_delay_ms, 1500);
    /// assert_eq!(config.storage_key, "pref-theme");
    /// ```
    pub fn from_yaml(text: &str) -> Result<Self, ThemeError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| ThemeError::Config(e.to_string()))
    }

    /// Parses a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ThemeError> {
        serde_json::from_str(text).map_err(|e| ThemeError::Config(e.to_string()))
    }

    pub fn clear_delay(&self) -> Duration {
        Duration::from_millis(self.clear_delay_ms)
    }

    /// Compiles the configured message templates.
    pub fn compile_messages(&self) -> Result<Messages, ThemeError> {
        Messages::new(self.messages.clone())
    }
}
