//! Keyboard Events
//!
//! The `keydown` fields the overlay dispatches on.

/// Keyboard event
#[derive(Debug, Clone, Default)]
pub struct KeyboardEvent {
    /// `KeyboardEvent.key` (e.g. "Tab", "h", "H", "F6", "ArrowRight")
    pub key: String,
    pub shift_key: bool,
    pub alt_key: bool,
    pub ctrl_key: bool,
    pub meta_key: bool,
    default_prevented: bool,
}

impl KeyboardEvent {
    /// Create a keydown with no modifiers
    pub fn new(key: &str) -> Self {
        Self { key: key.to_string(), ..Default::default() }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift_key = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt_key = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl_key = true;
        self
    }

    /// Suppress the browser default (tab order, scrolling)
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Check if default was prevented
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
