//! ARIA Support
//!
//! Role tables and ARIA value parsing. Role-dependent behaviour is kept
//! in lookup tables keyed by role string so every mapping is explicit and
//! can be checked entry by entry.

use serde::Serialize;

/// Implicit roles for tags; unmapped tags use their lowercase tag name
pub const TAG_ROLES: &[(&str, &str)] = &[
    ("a", "link"),
    ("h1", "heading"),
    ("h2", "heading"),
    ("h3", "heading"),
    ("h4", "heading"),
    ("h5", "heading"),
    ("h6", "heading"),
    ("input", "textbox"),
    ("img", "image"),
    ("ul", "list"),
    ("ol", "list"),
    ("li", "listitem"),
    ("nav", "navigation"),
    ("main", "main"),
    ("header", "banner"),
    ("footer", "contentinfo"),
];

/// Roles that make an element interactive on their own
pub const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "link",
    "textbox",
    "checkbox",
    "radio",
    "combobox",
    "listbox",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "option",
    "slider",
    "spinbutton",
    "switch",
    "tab",
];

/// Landmark roles and the name announced for them
pub const LANDMARK_ROLES: &[(&str, &str)] = &[
    ("banner", "banner"),
    ("complementary", "complementary"),
    ("contentinfo", "content info"),
    ("form", "form"),
    ("main", "main"),
    ("navigation", "navigation"),
    ("region", "region"),
    ("search", "search"),
];

/// Roles that report their position among same-role siblings
pub const SET_ROLES: &[&str] = &[
    "listitem",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "option",
    "tab",
];

/// Dialog roles (targets of `d` navigation and the Escape step-out)
pub const DIALOG_ROLES: &[&str] = &["dialog", "alertdialog"];

/// Keyboard hints shown for a role
pub const ROLE_SHORTCUTS: &[(&str, &[&str])] = &[
    ("heading", &["H: next heading", "Shift+H: previous heading"]),
    ("list", &["L: next list", "Shift+L: previous list"]),
    ("dialog", &["D: next dialog", "Shift+D: previous dialog", "Escape: leave dialog"]),
    ("alertdialog", &["Escape: leave dialog"]),
    ("link", &["Enter: follow link"]),
    ("button", &["Enter or Space: activate"]),
    ("textbox", &["Type to enter text"]),
    ("checkbox", &["Space: toggle"]),
    ("switch", &["Space: toggle"]),
    ("radio", &["Arrow keys: choose option"]),
    ("tab", &["Arrow keys: switch tab"]),
];

/// Tags focusable without a `tabindex`
pub const NATIVE_FOCUSABLE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea"];

/// Implicit role of a tag
pub fn tag_role(tag: &str) -> Option<&'static str> {
    TAG_ROLES.iter().find(|(t, _)| *t == tag).map(|(_, r)| *r)
}

pub fn is_interactive_role(role: &str) -> bool {
    INTERACTIVE_ROLES.contains(&role)
}

/// Landmark name of a role
pub fn landmark_name(role: &str) -> Option<&'static str> {
    LANDMARK_ROLES.iter().find(|(r, _)| *r == role).map(|(_, name)| *name)
}

pub fn is_set_role(role: &str) -> bool {
    SET_ROLES.contains(&role)
}

pub fn is_dialog_role(role: &str) -> bool {
    DIALOG_ROLES.contains(&role)
}

/// Keyboard hints for a role (empty when none)
pub fn role_shortcuts(role: &str) -> &'static [&'static str] {
    ROLE_SHORTCUTS.iter().find(|(r, _)| *r == role).map(|(_, s)| *s).unwrap_or(&[])
}

/// Tri-state value (true/false/mixed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    True,
    False,
    Mixed,
}

impl TriState {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.trim().to_ascii_lowercase().as_str() {
            "true" => Self::True,
            "false" => Self::False,
            "mixed" => Self::Mixed,
            _ => return None,
        })
    }
}

/// Parse an ARIA boolean (`"true"` / `"false"`)
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Live region mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveRegionMode {
    #[default]
    Off,
    Polite,
    Assertive,
}

impl LiveRegionMode {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "polite" => Self::Polite,
            "assertive" => Self::Assertive,
            _ => Self::Off,
        }
    }
}

/// Live region relevant values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveRelevant {
    Additions,
    Removals,
    Text,
    All,
}

impl LiveRelevant {
    /// Parse a space-separated `aria-relevant` list
    pub fn parse_list(value: &str) -> Vec<Self> {
        value.split_whitespace()
            .filter_map(|token| Some(match token.to_ascii_lowercase().as_str() {
                "additions" => Self::Additions,
                "removals" => Self::Removals,
                "text" => Self::Text,
                "all" => Self::All,
                _ => return None,
            }))
            .collect()
    }
}

/// Live-region settings of an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveSettings {
    pub politeness: LiveRegionMode,
    pub atomic: bool,
    pub relevant: Vec<LiveRelevant>,
    pub busy: bool,
}

/// Implicit live settings of live-region roles
pub fn implicit_live_settings(role: &str) -> Option<(LiveRegionMode, bool)> {
    match role {
        "alert" => Some((LiveRegionMode::Assertive, true)),
        "status" => Some((LiveRegionMode::Polite, true)),
        "log" => Some((LiveRegionMode::Polite, false)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roles_table() {
        let expected = [
            ("a", "link"), ("h1", "heading"), ("h6", "heading"), ("input", "textbox"),
            ("img", "image"), ("ul", "list"), ("ol", "list"), ("li", "listitem"),
            ("nav", "navigation"), ("main", "main"), ("header", "banner"), ("footer", "contentinfo"),
        ];
        for (tag, role) in expected {
            assert_eq!(tag_role(tag), Some(role), "tag {}", tag);
        }
        assert_eq!(tag_role("section"), None);
        assert_eq!(tag_role("button"), None);
    }

    #[test]
    fn test_interactive_roles_table() {
        for role in INTERACTIVE_ROLES {
            assert!(is_interactive_role(role));
        }
        for role in ["heading", "list", "listitem", "main", "dialog", "div"] {
            assert!(!is_interactive_role(role), "role {}", role);
        }
    }

    #[test]
    fn test_landmark_table() {
        assert_eq!(LANDMARK_ROLES.len(), 8);
        for (role, name) in LANDMARK_ROLES {
            assert_eq!(landmark_name(role), Some(*name));
        }
        assert_eq!(landmark_name("article"), None);
    }

    #[test]
    fn test_shortcut_table() {
        for (role, hints) in ROLE_SHORTCUTS {
            assert!(!hints.is_empty(), "role {} has no hints", role);
            assert_eq!(role_shortcuts(role), *hints);
        }
        assert!(role_shortcuts("paragraph").is_empty());
        assert!(is_dialog_role("alertdialog"));
        assert!(is_set_role("option"));
        assert!(!is_set_role("list"));
    }

    #[test]
    fn test_value_parsing() {
        assert_eq!(TriState::parse("Mixed"), Some(TriState::Mixed));
        assert_eq!(TriState::parse("maybe"), None);
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(LiveRegionMode::parse("assertive"), LiveRegionMode::Assertive);
        assert_eq!(LiveRegionMode::parse("loud"), LiveRegionMode::Off);
        assert_eq!(
            LiveRelevant::parse_list("additions bogus text"),
            vec![LiveRelevant::Additions, LiveRelevant::Text]
        );
        assert_eq!(implicit_live_settings("alert"), Some((LiveRegionMode::Assertive, true)));
    }
}
