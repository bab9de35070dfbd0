//! Host-side elements the toggle writes to.
//!
//! The toggle never creates or styles elements. The host hands it a
//! [`ControlSurface`] for the toggle button and a [`LiveRegion`] for
//! announcements (a persistent, visually hidden element with
//! `aria-live="polite"` and `aria-atomic="true"`).
//!
//! [`AttributeMap`] and [`TextRegion`] are in-memory implementations for
//! headless hosts and tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// The toggle control's attribute surface.
pub trait ControlSurface {
    fn set_attribute(&mut self, name: &str, value: &str);
}

/// The status element screen readers watch for announcements.
pub trait LiveRegion {
    fn set_text(&mut self, text: &str);
}

impl<C: ControlSurface + ?Sized> ControlSurface for Box<C> {
    fn set_attribute(&mut self, name: &str, value: &str) {
        (**self).set_attribute(name, value)
    }
}

impl<C: ControlSurface> ControlSurface for Rc<RefCell<C>> {
    fn set_attribute(&mut self, name: &str, value: &str) {
        self.borrow_mut().set_attribute(name, value)
    }
}

impl<R: LiveRegion + ?Sized> LiveRegion for Box<R> {
    fn set_text(&mut self, text: &str) {
        (**self).set_text(text)
    }
}

impl<R: LiveRegion> LiveRegion for Rc<RefCell<R>> {
    fn set_text(&mut self, text: &str) {
        self.borrow_mut().set_text(text)
    }
}

/// In-memory control attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    attributes: BTreeMap<String, String>,
    writes: usize,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Total number of attribute writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ControlSurface for AttributeMap {
    fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
        self.writes += 1;
    }
}

/// In-memory live region that remembers every text it was given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextRegion {
    text: String,
    history: Vec<String>,
}

impl TextRegion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Every text written, oldest first, including clears.
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl LiveRegion for TextRegion {
    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.history.push(self.text.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_map_overwrites() {
        let mut map = AttributeMap::new();
        map.set_attribute("aria-pressed", "false");
        map.set_attribute("aria-pressed", "true");
        assert_eq!(map.get("aria-pressed"), Some("true"));
        assert_eq!(map.writes(), 2);
    }

    #[test]
    fn test_text_region_history() {
        let mut region = TextRegion::new();
        region.set_text("Switched to dark theme");
        region.set_text("");
        assert_eq!(region.text(), "");
        assert_eq!(region.history(), ["Switched to dark theme", ""]);
    }

    #[test]
    fn test_shared_handles() {
        let region = Rc::new(RefCell::new(TextRegion::new()));
        let mut boxed: Box<dyn LiveRegion> = Box::new(Rc::clone(&region));
        boxed.set_text("hello");
        assert_eq!(region.borrow().text(), "hello");
    }
}
