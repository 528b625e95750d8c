//! Body scroll lock
//!
//! Pins `<body>` with `position:fixed` at the captured offset so the page
//! behind the overlay cannot scroll, and puts everything back on release.

use ally_dom::{DomError, Document, NodeId};

/// Inline properties the lock overrides
const LOCKED_PROPERTIES: [&str; 4] = ["position", "top", "width", "overflow"];

/// Active scroll lock
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollLock {
    body: NodeId,
    scroll_x: f64,
    scroll_y: f64,
    /// Inline values present before the lock
    saved: Vec<(&'static str, Option<String>)>,
}

impl ScrollLock {
    /// Capture the window scroll and pin the body
    pub fn engage(doc: &mut Document) -> Result<Self, DomError> {
        let body = doc.body();
        if doc.tree().element(body).is_none() {
            return Err(DomError::NotAnElement(body));
        }

        let scroll_x = doc.scroll_x();
        let scroll_y = doc.scroll_y();
        let saved = LOCKED_PROPERTIES.iter()
            .map(|&name| (name, doc.style_property(body, name)))
            .collect();

        doc.set_style_property(body, "position", "fixed")?;
        doc.set_style_property(body, "top", &format!("-{}px", scroll_y))?;
        doc.set_style_property(body, "width", "100%")?;
        doc.set_style_property(body, "overflow", "hidden")?;
        // A fixed body leaves nothing to scroll
        doc.scroll_to(0.0, 0.0);

        tracing::debug!(scroll_y, "scroll lock engaged");
        Ok(Self { body, scroll_x, scroll_y, saved })
    }

    /// Restore the body styles and the captured scroll offset
    pub fn release(self, doc: &mut Document) -> Result<(), DomError> {
        for (name, value) in &self.saved {
            match value {
                Some(value) => doc.set_style_property(self.body, name, value)?,
                None => doc.remove_style_property(self.body, name)?,
            }
        }
        doc.scroll_to(self.scroll_x, self.scroll_y);
        tracing::debug!(scroll_y = self.scroll_y, "scroll lock released");
        Ok(())
    }

    /// Captured `scrollY`
    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }
}
