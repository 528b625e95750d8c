//! Keyboard Navigation
//!
//! Key bindings of the focus overlay and the F6 navigation mode flag.

use std::collections::HashMap;

use ally_dom::KeyboardEvent;

/// Presentation mode toggled with F6; traversal is the same in both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationMode {
    #[default]
    Elements,
    Landmarks,
}

impl NavigationMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Elements => "Elements",
            Self::Landmarks => "Landmarks",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Elements => Self::Landmarks,
            Self::Landmarks => Self::Elements,
        }
    }
}

/// Keyboard shortcut
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyboardShortcut {
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyboardShortcut {
    pub fn new(key: &str) -> Self {
        Self { key: normalize_key(key), ctrl: false, alt: false, shift: false, meta: false }
    }
    pub fn ctrl(mut self) -> Self { self.ctrl = true; self }
    pub fn alt(mut self) -> Self { self.alt = true; self }
    pub fn shift(mut self) -> Self { self.shift = true; self }

    /// Shortcut of a keydown; an uppercase letter implies Shift
    pub fn from_event(event: &KeyboardEvent) -> Self {
        let uppercase_letter = is_letter(&event.key) && event.key.chars().all(|c| c.is_ascii_uppercase());
        Self {
            key: normalize_key(&event.key),
            ctrl: event.ctrl_key,
            alt: event.alt_key,
            shift: event.shift_key || uppercase_letter,
            meta: event.meta_key,
        }
    }

    pub fn display(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl { parts.push("Ctrl"); }
        if self.alt { parts.push("Alt"); }
        if self.shift { parts.push("Shift"); }
        if self.meta { parts.push("Cmd"); }
        let key = if is_letter(&self.key) { self.key.to_ascii_uppercase() } else { self.key.clone() };
        parts.push(&key);
        parts.join("+")
    }
}

fn is_letter(key: &str) -> bool {
    key.len() == 1 && key.chars().all(|c| c.is_ascii_alphabetic())
}

fn normalize_key(key: &str) -> String {
    if is_letter(key) { key.to_ascii_lowercase() } else { key.to_string() }
}

/// Navigation action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    NextElement,
    PrevElement,
    NextHeading,
    PrevHeading,
    NextList,
    PrevList,
    NextDialog,
    PrevDialog,
    ToggleMode,
    FollowFlow,
    Exit,
}

impl NavAction {
    /// Role searched by role-filtered moves
    pub fn role(&self) -> Option<&'static str> {
        match self {
            Self::NextHeading | Self::PrevHeading => Some("heading"),
            Self::NextList | Self::PrevList => Some("list"),
            Self::NextDialog | Self::PrevDialog => Some("dialog"),
            _ => None,
        }
    }

    /// Whether the action walks backwards
    pub fn is_backward(&self) -> bool {
        matches!(self, Self::PrevElement | Self::PrevHeading | Self::PrevList | Self::PrevDialog)
    }
}

/// Shortcut registry
#[derive(Debug, Default)]
pub struct ShortcutRegistry {
    shortcuts: HashMap<KeyboardShortcut, NavAction>,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register(KeyboardShortcut::new("Tab"), NavAction::NextElement);
        registry.register(KeyboardShortcut::new("Tab").shift(), NavAction::PrevElement);
        registry.register(KeyboardShortcut::new("h"), NavAction::NextHeading);
        registry.register(KeyboardShortcut::new("h").shift(), NavAction::PrevHeading);
        registry.register(KeyboardShortcut::new("l"), NavAction::NextList);
        registry.register(KeyboardShortcut::new("l").shift(), NavAction::PrevList);
        registry.register(KeyboardShortcut::new("d"), NavAction::NextDialog);
        registry.register(KeyboardShortcut::new("d").shift(), NavAction::PrevDialog);
        registry.register(KeyboardShortcut::new("F6"), NavAction::ToggleMode);
        registry.register(KeyboardShortcut::new("F1"), NavAction::FollowFlow);
        registry.register(KeyboardShortcut::new("ArrowRight").alt(), NavAction::FollowFlow);
        registry.register(KeyboardShortcut::new("Escape"), NavAction::Exit);
        registry
    }

    pub fn register(&mut self, shortcut: KeyboardShortcut, action: NavAction) {
        self.shortcuts.insert(shortcut, action);
    }

    pub fn get_action(&self, shortcut: &KeyboardShortcut) -> Option<NavAction> {
        self.shortcuts.get(shortcut).copied()
    }

    /// Action bound to a keydown
    pub fn action_for(&self, event: &KeyboardEvent) -> Option<NavAction> {
        self.get_action(&KeyboardShortcut::from_event(event))
    }

    /// Shortcuts bound to `action`, sorted by display text
    pub fn shortcuts_for(&self, action: NavAction) -> Vec<String> {
        let mut keys: Vec<String> = self.shortcuts.iter()
            .filter(|(_, a)| **a == action)
            .map(|(s, _)| s.display())
            .collect();
        keys.sort();
        keys
    }
}
