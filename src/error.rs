//! Error types.
//!
//! None of the runtime operations (toggling, announcing, watching) return
//! errors: they degrade and log instead. Errors only surface when parsing
//! input (theme names, templates, configuration) and from storage adapters.

use thiserror::Error;

/// Errors raised while building toggle components.
#[derive(Debug, Error)]
pub enum ThemeError {
    /// A theme name other than `light` or `dark`.
    #[error("unknown theme '{0}' (expected 'light' or 'dark')")]
    UnknownTheme(String),

    /// A message template failed to compile or render.
    #[error("invalid {name} template: {source}")]
    Template {
        name: &'static str,
        #[source]
        source: minijinja::Error,
    },

    /// Configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Errors raised by [`KeyValueStore`](crate::KeyValueStore) adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage refuses access (blocked, disabled, quota).
    #[error("storage unavailable")]
    Unavailable,

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document is not a JSON object of strings.
    #[error("storage contents are malformed: {0}")]
    Format(#[from] serde_json::Error),
}
