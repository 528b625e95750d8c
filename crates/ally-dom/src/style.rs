//! Computed Style
//!
//! The small slice of CSS the overlay reads: `display`, `visibility` and
//! `color`, resolved from a user-agent sheet plus inline `style` attributes.

/// Unvisited link colour from the user-agent sheet
pub const LINK_COLOR: &str = "rgb(0,0,238)";
/// Visited link colour from the user-agent sheet
pub const VISITED_LINK_COLOR: &str = "rgb(85,26,139)";
/// Initial text colour
pub const TEXT_COLOR: &str = "rgb(0,0,0)";

/// Elements the user-agent sheet never renders
const UA_HIDDEN_TAGS: &[&str] = &[
    "head", "script", "style", "template", "title", "meta", "link", "noscript",
];

const BLOCK_TAGS: &[&str] = &[
    "html", "body", "div", "p", "main", "nav", "header", "footer", "section", "article",
    "aside", "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5", "h6", "form", "dialog",
    "figure", "table", "fieldset", "blockquote", "pre", "address", "details", "summary",
];

/// `display` value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    None,
    Inline,
    Block,
}

impl Display {
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Some(match value.as_str() {
            "none" => Self::None,
            "inline" | "inline-block" | "inline-flex" | "inline-grid" | "contents" => Self::Inline,
            "block" | "flex" | "grid" | "list-item" | "table" | "flow-root" => Self::Block,
            _ => return None,
        })
    }

    fn default_for(tag: &str) -> Self {
        if UA_HIDDEN_TAGS.contains(&tag) {
            Self::None
        } else if BLOCK_TAGS.contains(&tag) {
            Self::Block
        } else {
            Self::Inline
        }
    }
}

/// `visibility` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapse,
}

impl Visibility {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.trim().to_ascii_lowercase().as_str() {
            "visible" => Self::Visible,
            "hidden" => Self::Hidden,
            "collapse" => Self::Collapse,
            _ => return None,
        })
    }
}

/// Resolved style of one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedStyle {
    pub display: Display,
    pub visibility: Visibility,
    /// Normalised colour string (lowercase, no whitespace)
    pub color: String,
}

impl ComputedStyle {
    /// Style of a freshly created, detached element of `tag`
    pub fn initial_for(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        Self {
            display: Display::default_for(&tag),
            visibility: Visibility::Visible,
            color: if tag == "a" { LINK_COLOR.to_string() } else { TEXT_COLOR.to_string() },
        }
    }

    /// Cascade: inherited values from `parent`, tag defaults, then `inline`
    pub(crate) fn cascade(
        tag: &str,
        parent: Option<&ComputedStyle>,
        link_color: Option<&str>,
        inline: Option<&str>,
    ) -> Self {
        let mut style = Self {
            display: Display::default_for(tag),
            visibility: parent.map(|p| p.visibility).unwrap_or_default(),
            color: parent.map(|p| p.color.clone()).unwrap_or_else(|| TEXT_COLOR.to_string()),
        };
        if let Some(color) = link_color {
            style.color = color.to_string();
        }
        if let Some(inline) = inline {
            for (name, value) in parse_inline_style(inline) {
                match name.as_str() {
                    "display" => {
                        if let Some(d) = Display::parse(&value) {
                            style.display = d;
                        }
                    }
                    "visibility" => {
                        if let Some(v) = Visibility::parse(&value) {
                            style.visibility = v;
                        }
                    }
                    "color" => style.color = normalize_color(&value),
                    _ => {}
                }
            }
        }
        style
    }

    /// `display:none` or `visibility:hidden|collapse`
    pub fn is_invisible(&self) -> bool {
        self.display == Display::None || self.visibility != Visibility::Visible
    }
}

/// Parse inline style string into property-value pairs
pub fn parse_inline_style(style: &str) -> Vec<(String, String)> {
    style.split(';')
        .filter_map(|decl| {
            let decl = decl.trim();
            if decl.is_empty() {
                return None;
            }

            let mut parts = decl.splitn(2, ':');
            let name = parts.next()?.trim();
            let value = parts.next()?.trim();

            if name.is_empty() || value.is_empty() {
                return None;
            }

            let value = value.trim_end_matches("!important").trim();
            Some((name.to_ascii_lowercase(), value.to_string()))
        })
        .collect()
}

/// Serialize declarations back into a `style` attribute value
pub(crate) fn serialize_inline_style(decls: &[(String, String)]) -> String {
    decls.iter()
        .map(|(name, value)| format!("{}: {};", name, value))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn normalize_color(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_lowercase()
}
