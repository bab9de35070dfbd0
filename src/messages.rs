//! Announcement text and control attributes.
//!
//! All user-facing text comes from three minijinja templates, rendered with:
//!
//! | Variable | Value |
//! |----------|-------|
//! | `current` | The theme now in effect (`light` or `dark`) |
//! | `target` | The theme the control switches to |
//! | `shortcut` | The keyboard shortcut hint shown in the title |
//!
//! The shortcut is only mentioned in text. Binding it is up to the host.

use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::error::ThemeError;
use crate::theme::Theme;

pub const ARIA_PRESSED: &str = "aria-pressed";
pub const ARIA_LABEL: &str = "aria-label";
pub const TITLE: &str = "title";

const ANNOUNCEMENT: &str = "announcement";
const LABEL: &str = "aria_label";
const TITLE_TEMPLATE: &str = "title";

/// Template sources for the toggle's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Live region text after a change.
    pub announcement: String,
    /// The control's accessible name.
    pub aria_label: String,
    /// The control's tooltip.
    pub title: String,
    /// Shortcut hint substituted for `{{ shortcut }}`.
    pub shortcut: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            announcement: "Switched to {{ current }} theme".to_string(),
            aria_label: "Switch to {{ target }} theme. Current theme: {{ current }}".to_string(),
            title: "Switch to {{ target }} theme ({{ shortcut }})".to_string(),
            shortcut: "Alt + T".to_string(),
        }
    }
}

/// Attribute values for a toggle control reflecting a theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlAttributes {
    /// `true` when the dark theme is active.
    pub aria_pressed: bool,
    pub aria_label: String,
    pub title: String,
}

impl ControlAttributes {
    /// The `aria-pressed` attribute value.
    pub fn aria_pressed_value(&self) -> &'static str {
        if self.aria_pressed {
            "true"
        } else {
            "false"
        }
    }

    /// Attribute name/value pairs, in the order they are applied.
    pub fn pairs(&self) -> [(&'static str, &str); 3] {
        [
            (ARIA_PRESSED, self.aria_pressed_value()),
            (ARIA_LABEL, &self.aria_label),
            (TITLE, &self.title),
        ]
    }
}

/// Compiled message templates.
///
/// # Example
///
/// ```rust
/// use theme_toggle::{MessageConfig, Messages, Theme};
///
/// let messages = Messages::new(MessageConfig {
///     announcement: "Now using the {{ current }} palette".into(),
///     ..MessageConfig::default()
/// })
/// .unwrap();
///
/// assert_eq!(messages.announcement(Theme::Dark), "Now using the dark palette");
/// ```
pub struct Messages {
    env: Environment<'static>,
    shortcut: String,
}

impl Messages {
    /// Compiles the templates.
    ///
    /// # Errors
    ///
    /// Returns [`ThemeError::Template`] if a template has invalid syntax or
    /// fails to render for either theme.
    pub fn new(config: MessageConfig) -> Result<Self, ThemeError> {
        let MessageConfig {
            announcement,
            aria_label,
            title,
            shortcut,
        } = config;

        let mut env = Environment::new();
        for (name, source) in [
            (ANNOUNCEMENT, announcement),
            (LABEL, aria_label),
            (TITLE_TEMPLATE, title),
        ] {
            env.add_template_owned(name, source)
                .map_err(|source| ThemeError::Template { name, source })?;
        }

        let messages = Self { env, shortcut };
        for name in [ANNOUNCEMENT, LABEL, TITLE_TEMPLATE] {
            for theme in [Theme::Light, Theme::Dark] {
                messages
                    .try_render(name, theme)
                    .map_err(|source| ThemeError::Template { name, source })?;
            }
        }
        Ok(messages)
    }

    /// Text announced after switching to `theme`.
    pub fn announcement(&self, theme: Theme) -> String {
        self.render(ANNOUNCEMENT, theme)
    }

    /// Attributes for a control whose current theme is `theme`.
    pub fn describe_control(&self, theme: Theme) -> ControlAttributes {
        ControlAttributes {
            aria_pressed: theme.is_dark(),
            aria_label: self.render(LABEL, theme),
            title: self.render(TITLE_TEMPLATE, theme),
        }
    }

    fn render(&self, name: &'static str, theme: Theme) -> String {
        self.try_render(name, theme).unwrap_or_else(|e| {
            log::error!("theme-toggle: cannot render {name} for {theme}: {e}");
            String::new()
        })
    }

    fn try_render(&self, name: &str, theme: Theme) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(context! {
            current => theme.as_str(),
            target => theme.opposite().as_str(),
            shortcut => self.shortcut.as_str(),
        })
    }
}

impl fmt::Debug for Messages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messages")
            .field("shortcut", &self.shortcut)
            .finish_non_exhaustive()
    }
}

thread_local! {
    static BUILTIN: Rc<Messages> = Rc::new(
        Messages::new(MessageConfig::default()).expect("built-in message templates compile"),
    );
}

impl Messages {
    /// The built-in English messages, shared per thread.
    pub fn builtin() -> Rc<Messages> {
        BUILTIN.with(Rc::clone)
    }
}

/// Attributes for a control whose current theme is `theme`, using the
/// built-in English text.
///
/// # Example
///
/// ```rust
/// use theme_toggle::{describe_control, Theme};
///
/// let attrs = describe_control(Theme::Dark);
/// assert!(attrs.aria_pressed);
/// assert_eq!(attrs.aria_label, "Switch to light theme. Current theme: dark");
/// assert_eq!(attrs.title, "Switch to light theme (Alt + T)");
/// ```
pub fn describe_control(theme: Theme) -> ControlAttributes {
    BUILTIN.with(|messages| messages.describe_control(theme))
}

/// Built-in announcement text for switching to `theme`.
pub fn announcement_text(theme: Theme) -> String {
    BUILTIN.with(|messages| messages.announcement(theme))
}
