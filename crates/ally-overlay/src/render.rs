//! Overlay rendering
//!
//! Spotlight geometry and the floating description panel for the node
//! under the cursor.

use ally_a11y::{ElementDetails, NavigationMode};
use ally_dom::{DOMRect, Document, NodeId};
use serde::Serialize;

/// Highlight rectangle around the current element (viewport coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spotlight {
    #[serde(skip)]
    pub element: NodeId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Spotlight {
    /// Bounding client rect of `element` grown by `padding`
    pub fn for_element(doc: &Document, element: NodeId, padding: f64) -> Self {
        let rect = doc.bounding_client_rect(element).inflate(padding);
        Self { element, x: rect.x, y: rect.y, width: rect.width, height: rect.height }
    }

    pub fn rect(&self) -> DOMRect {
        DOMRect::from_xywh(self.x, self.y, self.width, self.height)
    }
}

/// Textual description panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptionPanel {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

impl DescriptionPanel {
    pub fn new(details: &ElementDetails, mode: NavigationMode) -> Self {
        let title = if details.label.is_empty() { details.role.clone() } else { details.label.clone() };
        let mut rows = Vec::new();

        let role = match details.level {
            Some(level) if details.role == "heading" => format!("heading level {}", level),
            _ => details.role.clone(),
        };
        rows.push(("Role".to_string(), role));
        if !details.states.is_empty() {
            rows.push(("States".to_string(), details.states.join(", ")));
        }
        if let Some(description) = &details.description {
            rows.push(("Description".to_string(), description.clone()));
        }
        if let Some(pos) = details.position {
            rows.push(("Position".to_string(), format!("{} of {}", pos.index, pos.total)));
        }
        match mode {
            NavigationMode::Landmarks => {
                let landmark = details.landmark.clone()
                    .or_else(|| details.region.clone())
                    .unwrap_or_else(|| "none".to_string());
                rows.push(("Landmark".to_string(), landmark));
            }
            NavigationMode::Elements => {
                if let Some(region) = &details.region {
                    rows.push(("Region".to_string(), region.clone()));
                }
            }
        }
        if let Some(live) = &details.live {
            rows.push(("Live".to_string(), format!("{:?}", live.politeness).to_lowercase()));
        }
        rows.push(("Tab index".to_string(), details.tab_index.to_string()));
        if !details.shortcuts.is_empty() {
            rows.push(("Shortcuts".to_string(), details.shortcuts.join("; ")));
        }
        rows.push(("Mode".to_string(), mode.label().to_string()));

        Self { title, rows }
    }

    /// Value of a row
    pub fn row(&self, name: &str) -> Option<&str> {
        self.rows.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// Plain-text rendering
    pub fn to_text(&self) -> String {
        let mut out = self.title.clone();
        for (name, value) in &self.rows {
            out.push_str(&format!("\n{}: {}", name, value));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ally_a11y::element_details;

    #[test]
    fn test_spotlight_padding() {
        let mut doc = ally_html::parse(r#"<button id="b">Go</button>"#).unwrap();
        let button = doc.get_element_by_id("b").unwrap();
        doc.set_layout_rect(button, DOMRect::from_xywh(100.0, 300.0, 80.0, 24.0));
        doc.scroll_to(0.0, 200.0);

        let spot = Spotlight::for_element(&doc, button, 8.0);
        assert_eq!(spot.rect(), DOMRect::from_xywh(92.0, 92.0, 96.0, 40.0));
    }

    #[test]
    fn test_panel_rows() {
        let doc = ally_html::parse(
            r#"<nav aria-label="Main"><ul><li><a id="a" href="/x" aria-description="Opens catalog">Catalog</a></li></ul></nav>"#,
        ).unwrap();
        let a = doc.get_element_by_id("a").unwrap();
        let details = element_details(&doc, a);

        let panel = DescriptionPanel::new(&details, NavigationMode::Elements);
        assert_eq!(panel.title, "Catalog");
        assert_eq!(panel.row("Role"), Some("link"));
        assert_eq!(panel.row("Description"), Some("Opens catalog"));
        assert_eq!(panel.row("Region"), Some("navigation \"Main\""));
        assert_eq!(panel.row("Tab index"), Some("0"));
        assert_eq!(panel.row("Mode"), Some("Elements"));

        let landmarks = DescriptionPanel::new(&details, NavigationMode::Landmarks);
        assert_eq!(landmarks.row("Landmark"), Some("navigation \"Main\""));
        assert_eq!(landmarks.row("Region"), None);
        assert!(landmarks.to_text().starts_with("Catalog\nRole: link"));
    }
}
