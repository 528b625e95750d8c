//! Overlay Configuration

use serde::{Deserialize, Serialize};

use crate::OverlayError;

/// Focus overlay configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Padding around the spotlight rectangle (CSS px)
    pub spotlight_padding: f64,

    /// `id` of the control that toggles the overlay
    pub toggle_id: String,

    /// Tags whose insertion rebuilds the buffer
    pub significant_tags: Vec<String>,

    /// Attributes watched for state changes of the current element
    pub state_attributes: Vec<String>,

    /// Move DOM focus to focusable elements under the cursor
    pub move_focus: bool,

    /// Speak "End of document" / "Start of document" at the tree ends
    pub announce_boundaries: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            spotlight_padding: 8.0,
            toggle_id: "focus-overlay-toggle".to_string(),
            significant_tags: vec!["main".into(), "article".into(), "section".into()],
            state_attributes: vec![
                "aria-pressed".into(),
                "aria-expanded".into(),
                "aria-checked".into(),
                "aria-selected".into(),
            ],
            move_focus: true,
            announce_boundaries: true,
        }
    }
}

impl OverlayConfig {
    /// Parse from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, OverlayError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, OverlayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check whether `tag` triggers a rebuild when inserted
    pub fn is_significant_tag(&self, tag: &str) -> bool {
        self.significant_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
