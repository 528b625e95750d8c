//! Accessible-Role Classifier
//!
//! Maps one DOM element to its role, accessible name, states and the
//! derived screen-reader text. Everything here is a pure read of the
//! document: missing attributes produce empty values, nothing fails.

use ally_dom::{ComputedStyle, Document, NodeId};
use serde::Serialize;

use crate::aria::{
    implicit_live_settings, is_interactive_role, is_set_role, landmark_name, parse_bool,
    role_shortcuts, tag_role, LiveRegionMode, LiveRelevant, LiveSettings, TriState,
    NATIVE_FOCUSABLE_TAGS,
};

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Hint appended for elements declaring `aria-flowto`
pub const FLOW_SHORTCUT: &str = "F1 or Alt+ArrowRight: follow flow";

/// 1-based position among matching siblings (or headings)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionInSet {
    pub index: usize,
    pub total: usize,
}

/// Where the accessible name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameSource {
    AriaLabel,
    LabelledBy,
    Title,
    Placeholder,
    Alt,
    Content,
    None,
}

/// Result of classifying one element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub role: String,
    pub label: String,
    pub states: Vec<String>,
    pub is_interactive: bool,
    pub is_focusable: bool,
    pub is_hidden: bool,
    pub landmark: Option<String>,
    pub region: Option<String>,
    pub shortcuts: Vec<String>,
    pub position: Option<PositionInSet>,
    pub level: Option<u32>,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            role: String::new(),
            label: String::new(),
            states: Vec::new(),
            is_interactive: false,
            is_focusable: false,
            is_hidden: true,
            landmark: None,
            region: None,
            shortcuts: Vec::new(),
            position: None,
            level: None,
        }
    }
}

/// ARIA flags exposed in the description panel
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AriaFlags {
    pub expanded: Option<bool>,
    pub pressed: Option<TriState>,
    pub checked: Option<TriState>,
    pub selected: Option<bool>,
    pub disabled: bool,
    pub required: bool,
    pub invalid: bool,
    pub readonly: bool,
    pub modal: bool,
}

/// Request-scoped projection used for rendering and announcement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementDetails {
    pub role: String,
    pub label: String,
    pub level: Option<u32>,
    pub description: Option<String>,
    pub states: Vec<String>,
    pub aria: AriaFlags,
    pub tab_index: i32,
    pub shortcuts: Vec<String>,
    pub position: Option<PositionInSet>,
    pub landmark: Option<String>,
    pub region: Option<String>,
    pub live: Option<LiveSettings>,
    pub screen_reader_text: String,
}

impl ElementDetails {
    /// First line of the screen-reader text
    pub fn announcement(&self) -> &str {
        announcement(&self.screen_reader_text)
    }
}

/// First line of a screen-reader text
pub fn announcement(screen_reader_text: &str) -> &str {
    screen_reader_text.lines().next().unwrap_or("")
}

/// Trim and collapse internal whitespace
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn attr<'a>(doc: &'a Document, el: NodeId, name: &str) -> Option<&'a str> {
    doc.tree().get_attribute(el, name)
}

fn attr_is_true(doc: &Document, el: NodeId, name: &str) -> bool {
    attr(doc, el, name).and_then(parse_bool).unwrap_or(false)
}

fn tag(doc: &Document, el: NodeId) -> &str {
    doc.tree().tag_name(el).unwrap_or("")
}

/// Role: explicit `role` attribute, else the tag table, else the tag name
pub fn role_of(doc: &Document, el: NodeId) -> String {
    let Some(tag) = doc.tree().tag_name(el) else {
        return String::new();
    };
    if let Some(explicit) = attr(doc, el, "role").and_then(|r| r.split_whitespace().next()) {
        return explicit.to_ascii_lowercase();
    }
    tag_role(tag).map(str::to_string).unwrap_or_else(|| tag.to_string())
}

fn labelledby_text(doc: &Document, el: NodeId, name: &str) -> Option<String> {
    let ids = attr(doc, el, name)?;
    let text = ids.split_whitespace()
        .filter_map(|id| doc.get_element_by_id(id))
        .map(|target| normalize_text(&doc.tree().text_content(target)))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() { None } else { Some(text) }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(normalize_text).filter(|v| !v.is_empty())
}

/// Name from `aria-label` / `aria-labelledby` only
pub fn explicit_name(doc: &Document, el: NodeId) -> Option<String> {
    non_empty(attr(doc, el, "aria-label")).or_else(|| labelledby_text(doc, el, "aria-labelledby"))
}

/// Accessible name and its source
pub fn accessible_name(doc: &Document, el: NodeId) -> (String, NameSource) {
    if let Some(label) = non_empty(attr(doc, el, "aria-label")) {
        return (label, NameSource::AriaLabel);
    }
    if let Some(label) = labelledby_text(doc, el, "aria-labelledby") {
        return (label, NameSource::LabelledBy);
    }
    if let Some(title) = non_empty(attr(doc, el, "title")) {
        return (title, NameSource::Title);
    }
    let tag = tag(doc, el);
    if matches!(tag, "input" | "textarea") {
        if let Some(placeholder) = non_empty(attr(doc, el, "placeholder")) {
            return (placeholder, NameSource::Placeholder);
        }
    }
    if tag == "img" {
        if let Some(alt) = non_empty(attr(doc, el, "alt")) {
            return (alt, NameSource::Alt);
        }
    }
    let content = normalize_text(&doc.tree().text_content(el));
    if content.is_empty() {
        (content, NameSource::None)
    } else {
        (content, NameSource::Content)
    }
}

/// Hidden test for the element itself (ancestors not consulted except
/// through inherited `visibility`)
pub fn is_hidden(doc: &Document, el: NodeId) -> bool {
    let tree = doc.tree();
    if tree.element(el).is_none() {
        return true;
    }
    tree.has_attribute(el, "hidden")
        || attr_is_true(doc, el, "aria-hidden")
        || doc.computed_style(el).map(|s| s.is_invisible()).unwrap_or(true)
}

pub fn is_disabled(doc: &Document, el: NodeId) -> bool {
    doc.tree().has_attribute(el, "disabled") || attr_is_true(doc, el, "aria-disabled")
}

pub fn is_focusable(doc: &Document, el: NodeId) -> bool {
    !is_hidden(doc, el)
        && !is_disabled(doc, el)
        && (doc.tab_index(el) >= 0 || NATIVE_FOCUSABLE_TAGS.contains(&tag(doc, el)))
}

pub fn is_interactive(doc: &Document, el: NodeId, role: &str) -> bool {
    is_interactive_role(role) || doc.tab_index(el) >= 0
}

/// Heading level from the tag suffix, else `aria-level` on role=heading
pub fn heading_level(doc: &Document, el: NodeId, role: &str) -> Option<u32> {
    let tag = tag(doc, el);
    if HEADING_TAGS.contains(&tag) {
        return tag[1..].parse().ok();
    }
    if role == "heading" {
        return attr(doc, el, "aria-level").and_then(|v| v.trim().parse().ok());
    }
    None
}

/// Position among all `h1`-`h6` elements of the document
pub fn heading_position(doc: &Document, el: NodeId) -> Option<PositionInSet> {
    let headings = doc.get_elements_by_tag_names(HEADING_TAGS);
    let index = headings.iter().position(|&h| h == el)?;
    Some(PositionInSet { index: index + 1, total: headings.len() })
}

/// Position among same-role siblings for set roles
pub fn set_position(doc: &Document, el: NodeId, role: &str) -> Option<PositionInSet> {
    if !is_set_role(role) {
        return None;
    }
    let explicit = attr(doc, el, "aria-posinset").and_then(|v| v.trim().parse::<usize>().ok())
        .zip(attr(doc, el, "aria-setsize").and_then(|v| v.trim().parse::<usize>().ok()));
    if let Some((index, total)) = explicit {
        return Some(PositionInSet { index, total });
    }

    let tree = doc.tree();
    let parent = tree.parent_element(el)?;
    let siblings: Vec<NodeId> = tree.child_elements(parent)
        .filter(|&s| role_of(doc, s) == role)
        .collect();
    let index = siblings.iter().position(|&s| s == el)?;
    Some(PositionInSet { index: index + 1, total: siblings.len() })
}

/// `список из N элементов` with the right genitive form
pub fn list_announcement(count: usize) -> String {
    let noun = if count % 10 == 1 && count % 100 != 11 { "элемента" } else { "элементов" };
    format!("список из {} {}", count, noun)
}

fn list_item_count(doc: &Document, list: NodeId) -> usize {
    doc.tree().child_elements(list)
        .filter(|&item| role_of(doc, item) == "listitem")
        .count()
}

/// List whose first item contains `el`, if any
fn first_item_list(doc: &Document, el: NodeId) -> Option<NodeId> {
    let tree = doc.tree();
    let item = tree.ancestors(el).find(|&a| role_of(doc, a) == "listitem")?;
    let list = tree.parent_element(item)?;
    if role_of(doc, list) != "list" {
        return None;
    }
    let first = tree.child_elements(list).find(|&c| role_of(doc, c) == "listitem")?;
    (first == item).then_some(list)
}

fn in_navigation(doc: &Document, el: NodeId) -> bool {
    doc.tree().ancestors(el).any(|a| role_of(doc, a) == "navigation")
}

/// `visited` / `current page` for anchors
fn link_states(doc: &Document, el: NodeId, states: &mut Vec<String>) {
    let Some(href) = attr(doc, el, "href") else {
        return;
    };
    let unvisited = ComputedStyle::initial_for("a");
    if let Some(style) = doc.computed_style(el) {
        if !Document::same_color(&style.color, &unvisited.color) {
            states.push("visited".to_string());
        }
    }
    if in_navigation(doc, el) && doc.resolve_pathname(href).as_deref() == Some(doc.pathname()) {
        states.push("current page".to_string());
    }
}

/// State descriptors in announcement order
pub fn states(doc: &Document, el: NodeId, role: &str) -> Vec<String> {
    let mut states = Vec::new();
    let tree = doc.tree();

    match attr(doc, el, "aria-expanded").and_then(parse_bool) {
        Some(true) => states.push("expanded".to_string()),
        Some(false) => states.push("collapsed".to_string()),
        None => {}
    }
    match attr(doc, el, "aria-pressed").and_then(TriState::parse) {
        Some(TriState::True) => states.push("pressed".to_string()),
        Some(TriState::False) => states.push("not pressed".to_string()),
        Some(TriState::Mixed) => states.push("partially pressed".to_string()),
        None => {}
    }
    match checked_state(doc, el) {
        Some(TriState::True) => states.push("checked".to_string()),
        Some(TriState::False) => states.push("not checked".to_string()),
        Some(TriState::Mixed) => states.push("partially checked".to_string()),
        None => {}
    }
    if attr_is_true(doc, el, "aria-selected") {
        states.push("selected".to_string());
    }
    if attr_is_true(doc, el, "aria-required") || tree.has_attribute(el, "required") {
        states.push("required".to_string());
    }
    if is_disabled(doc, el) {
        states.push("disabled".to_string());
    }
    if attr(doc, el, "aria-invalid").map(|v| !v.trim().eq_ignore_ascii_case("false")).unwrap_or(false) {
        states.push("invalid".to_string());
    }
    if attr_is_true(doc, el, "aria-readonly") || tree.has_attribute(el, "readonly") {
        states.push("read only".to_string());
    }
    if attr(doc, el, "aria-current").map(|v| !v.trim().eq_ignore_ascii_case("false")).unwrap_or(false) {
        states.push("current".to_string());
    }
    if role == "heading" {
        if let Some(pos) = heading_position(doc, el) {
            states.push(format!("heading {} of {}", pos.index, pos.total));
        }
    }
    if tag(doc, el) == "a" {
        link_states(doc, el, &mut states);
    }
    states
}

fn checked_state(doc: &Document, el: NodeId) -> Option<TriState> {
    if let Some(state) = attr(doc, el, "aria-checked").and_then(TriState::parse) {
        return Some(state);
    }
    let is_toggle_input = tag(doc, el) == "input"
        && attr(doc, el, "type")
            .map(|t| matches!(t.trim().to_ascii_lowercase().as_str(), "checkbox" | "radio"))
            .unwrap_or(false);
    if !is_toggle_input {
        return None;
    }
    Some(if doc.tree().has_attribute(el, "checked") { TriState::True } else { TriState::False })
}

/// Outermost-first chain of landmark ancestors, joined with ` > `
pub fn region_chain(doc: &Document, el: NodeId) -> Option<String> {
    let tree = doc.tree();
    let mut chain: Vec<String> = tree.ancestors(el)
        .filter(|&a| tree.element(a).is_some())
        .filter_map(|a| {
            let name = landmark_name(&role_of(doc, a))?;
            Some(match explicit_name(doc, a) {
                Some(label) => format!("{} \"{}\"", name, label),
                None => name.to_string(),
            })
        })
        .collect();
    if chain.is_empty() {
        return None;
    }
    chain.reverse();
    Some(chain.join(" > "))
}

/// Explicit or role-implied live-region settings
pub fn live_settings(doc: &Document, el: NodeId, role: &str) -> Option<LiveSettings> {
    let implicit = implicit_live_settings(role);
    let explicit = attr(doc, el, "aria-live").map(LiveRegionMode::parse);
    let politeness = explicit.or(implicit.map(|(mode, _)| mode))?;
    let atomic = attr(doc, el, "aria-atomic")
        .and_then(parse_bool)
        .or(implicit.map(|(_, atomic)| atomic))
        .unwrap_or(false);
    Some(LiveSettings {
        politeness,
        atomic,
        relevant: attr(doc, el, "aria-relevant").map(LiveRelevant::parse_list).unwrap_or_default(),
        busy: attr_is_true(doc, el, "aria-busy"),
    })
}

/// `aria-modal` on dialog roles
pub fn is_modal(doc: &Document, el: NodeId, role: &str) -> Option<bool> {
    crate::aria::is_dialog_role(role).then(|| attr_is_true(doc, el, "aria-modal"))
}

/// `aria-flowto` targets with their accessible names
pub fn flow_targets(doc: &Document, el: NodeId) -> Vec<(NodeId, String)> {
    let Some(ids) = attr(doc, el, "aria-flowto") else {
        return Vec::new();
    };
    ids.split_whitespace()
        .filter_map(|id| doc.get_element_by_id(id))
        .map(|target| (target, accessible_name(doc, target).0))
        .collect()
}

/// Description: `aria-describedby`, `aria-description`, then an unused `title`
pub fn description(doc: &Document, el: NodeId, name_source: NameSource) -> Option<String> {
    labelledby_text(doc, el, "aria-describedby")
        .or_else(|| non_empty(attr(doc, el, "aria-description")))
        .or_else(|| {
            if name_source == NameSource::Title {
                None
            } else {
                non_empty(attr(doc, el, "title"))
            }
        })
}

/// Keyboard hints for an element
pub fn shortcuts(doc: &Document, el: NodeId, role: &str) -> Vec<String> {
    let mut hints: Vec<String> = role_shortcuts(role).iter().map(|s| s.to_string()).collect();
    if attr(doc, el, "aria-flowto").is_some() {
        hints.push(FLOW_SHORTCUT.to_string());
    }
    hints
}

/// Classify one element
pub fn classify(doc: &Document, el: NodeId) -> Classification {
    if doc.tree().element(el).is_none() {
        return Classification::default();
    }
    let role = role_of(doc, el);
    let (label, _) = accessible_name(doc, el);
    let position = if role == "heading" {
        heading_position(doc, el)
    } else {
        set_position(doc, el, &role)
    };

    Classification {
        states: states(doc, el, &role),
        is_interactive: is_interactive(doc, el, &role),
        is_focusable: is_focusable(doc, el),
        is_hidden: is_hidden(doc, el),
        landmark: landmark_name(&role).map(str::to_string),
        region: region_chain(doc, el),
        shortcuts: shortcuts(doc, el, &role),
        position,
        level: heading_level(doc, el, &role),
        label,
        role,
    }
}

fn role_word(c: &Classification) -> String {
    match (c.role.as_str(), c.level) {
        ("heading", Some(level)) => format!("heading level {}", level),
        (role, _) => role.to_string(),
    }
}

/// Multi-line screen-reader text; the first line is the announcement
pub fn screen_reader_text(
    doc: &Document,
    el: NodeId,
    c: &Classification,
    description: Option<&str>,
) -> String {
    let mut head: Vec<String> = Vec::new();
    if c.role == "list" {
        head.push(list_announcement(list_item_count(doc, el)));
    } else {
        if c.role == "link" {
            if let Some(list) = first_item_list(doc, el) {
                head.push(list_announcement(list_item_count(doc, list)));
            }
        }
        if !c.label.is_empty() {
            head.push(c.label.clone());
        }
        if !c.role.is_empty() {
            head.push(role_word(c));
        }
        head.extend(c.states.iter().cloned());
    }

    let mut lines = vec![head.join(", ")];
    if let Some(description) = description {
        lines.push(description.to_string());
    }
    if c.role != "heading" {
        if let Some(pos) = c.position {
            lines.push(format!("item {} of {}", pos.index, pos.total));
        }
    }
    if let Some(region) = &c.region {
        lines.push(format!("in {}", region));
    }
    if !c.shortcuts.is_empty() {
        lines.push(c.shortcuts.join("; "));
    }
    lines.join("\n")
}

/// Full projection for the current cursor element
pub fn element_details(doc: &Document, el: NodeId) -> ElementDetails {
    let c = classify(doc, el);
    let (_, name_source) = accessible_name(doc, el);
    let description = description(doc, el, name_source);
    let screen_reader_text = screen_reader_text(doc, el, &c, description.as_deref());

    let aria = AriaFlags {
        expanded: attr(doc, el, "aria-expanded").and_then(parse_bool),
        pressed: attr(doc, el, "aria-pressed").and_then(TriState::parse),
        checked: checked_state(doc, el),
        selected: attr(doc, el, "aria-selected").and_then(parse_bool),
        disabled: is_disabled(doc, el),
        required: attr_is_true(doc, el, "aria-required") || doc.tree().has_attribute(el, "required"),
        invalid: attr(doc, el, "aria-invalid").map(|v| !v.trim().eq_ignore_ascii_case("false")).unwrap_or(false),
        readonly: attr_is_true(doc, el, "aria-readonly") || doc.tree().has_attribute(el, "readonly"),
        modal: is_modal(doc, el, &c.role).unwrap_or(false),
    };

    ElementDetails {
        live: live_settings(doc, el, &c.role),
        tab_index: doc.tab_index(el),
        role: c.role,
        label: c.label,
        level: c.level,
        description,
        states: c.states,
        aria,
        shortcuts: c.shortcuts,
        position: c.position,
        landmark: c.landmark,
        region: c.region,
        screen_reader_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Document {
        ally_html::parse_with_url(html, "https://ally.example/catalog").unwrap()
    }

    fn by_id(doc: &Document, id: &str) -> NodeId {
        doc.get_element_by_id(id).unwrap()
    }

    #[test]
    fn test_role_resolution() {
        let d = doc(r#"<div id="a" role="Button Link">x</div><section id="b"></section><a id="c" href="/">c</a>"#);
        assert_eq!(role_of(&d, by_id(&d, "a")), "button");
        assert_eq!(role_of(&d, by_id(&d, "b")), "section");
        assert_eq!(role_of(&d, by_id(&d, "c")), "link");
    }

    #[test]
    fn test_name_resolution_order() {
        let d = doc(r#"
            <span id="l1">Search</span><span id="l2">catalog</span>
            <button id="a" aria-label=" Close  dialog " title="t">X</button>
            <input id="b" aria-labelledby="l1 missing l2" placeholder="p">
            <input id="c" title="Title wins" placeholder="p">
            <input id="d" placeholder="Your email">
            <img id="e" alt="Logo">
            <p id="f">  Some
               text </p>
        "#);
        assert_eq!(accessible_name(&d, by_id(&d, "a")), ("Close dialog".to_string(), NameSource::AriaLabel));
        assert_eq!(accessible_name(&d, by_id(&d, "b")), ("Search catalog".to_string(), NameSource::LabelledBy));
        assert_eq!(accessible_name(&d, by_id(&d, "c")).0, "Title wins");
        assert_eq!(accessible_name(&d, by_id(&d, "d")), ("Your email".to_string(), NameSource::Placeholder));
        assert_eq!(accessible_name(&d, by_id(&d, "e")).1, NameSource::Alt);
        assert_eq!(accessible_name(&d, by_id(&d, "f")).0, "Some text");
    }

    #[test]
    fn test_hidden_test() {
        let d = doc(r#"
            <div id="a" style="display:none"></div>
            <div id="b" style="visibility: hidden"></div>
            <div id="c" hidden></div>
            <div id="d" aria-hidden="true"></div>
            <div id="e" aria-hidden="false"></div>
            <script id="f"></script>
        "#);
        for id in ["a", "b", "c", "d", "f"] {
            assert!(is_hidden(&d, by_id(&d, id)), "{} should be hidden", id);
        }
        assert!(!is_hidden(&d, by_id(&d, "e")));
    }

    #[test]
    fn test_focusability_and_interactivity() {
        let d = doc(r#"
            <button id="a">ok</button>
            <button id="b" disabled>no</button>
            <div id="c" tabindex="0">card</div>
            <div id="d">plain</div>
            <div id="e" role="switch">sw</div>
            <a id="f" href="/" tabindex="-1">skip</a>
        "#);
        assert!(is_focusable(&d, by_id(&d, "a")));
        assert!(!is_focusable(&d, by_id(&d, "b")));
        assert!(is_focusable(&d, by_id(&d, "c")));
        assert!(!is_focusable(&d, by_id(&d, "d")));
        assert!(is_focusable(&d, by_id(&d, "f")));

        let c = classify(&d, by_id(&d, "c"));
        assert!(c.is_interactive);
        assert!(!classify(&d, by_id(&d, "d")).is_interactive);
        assert!(classify(&d, by_id(&d, "e")).is_interactive);
        assert!(!classify(&d, by_id(&d, "e")).is_focusable);
    }

    #[test]
    fn test_heading_level_and_position() {
        let d = doc(r#"<h1 id="a">Catalog</h1><h2 id="b">Guides</h2><h2 id="c">Tools</h2>"#);
        let c = classify(&d, by_id(&d, "c"));
        assert_eq!(c.role, "heading");
        assert_eq!(c.level, Some(2));
        assert!(c.states.contains(&"heading 3 of 3".to_string()));
        assert_eq!(c.position, Some(PositionInSet { index: 3, total: 3 }));

        let first = classify(&d, by_id(&d, "a"));
        assert_eq!(first.states, vec!["heading 1 of 3".to_string()]);
    }

    #[test]
    fn test_list_announcement_for_first_link() {
        let d = doc(r#"<ul id="list"><li><a id="one" href="/x">One</a></li><li><a id="two" href="/y">Two</a></li></ul>"#);
        let two = by_id(&d, "two");
        let c = classify(&d, two);
        assert_eq!(c.role, "link");

        let list = element_details(&d, by_id(&d, "list"));
        assert_eq!(list.announcement(), "список из 2 элементов");

        let first = element_details(&d, by_id(&d, "one"));
        assert!(first.screen_reader_text.starts_with("список из 2 элементов"));
        assert_eq!(first.announcement(), "список из 2 элементов, One, link");

        let second = element_details(&d, two);
        assert_eq!(second.announcement(), "Two, link");
    }

    #[test]
    fn test_list_announcement_plural() {
        assert_eq!(list_announcement(1), "список из 1 элемента");
        assert_eq!(list_announcement(11), "список из 11 элементов");
        assert_eq!(list_announcement(21), "список из 21 элемента");
        assert_eq!(list_announcement(5), "список из 5 элементов");
    }

    #[test]
    fn test_set_position() {
        let d = doc(r#"<ul><li id="a">A</li><li id="b">B</li><li id="c">C</li></ul>
            <div role="tablist"><div role="tab" id="t" aria-posinset="4" aria-setsize="9">T</div></div>"#);
        assert_eq!(classify(&d, by_id(&d, "b")).position, Some(PositionInSet { index: 2, total: 3 }));
        assert_eq!(classify(&d, by_id(&d, "t")).position, Some(PositionInSet { index: 4, total: 9 }));
    }

    #[test]
    fn test_pressed_states() {
        let mut d = doc(r#"<button id="b" aria-pressed="false">Dark mode</button>"#);
        let b = by_id(&d, "b");
        assert_eq!(classify(&d, b).states, vec!["not pressed".to_string()]);
        d.set_attribute(b, "aria-pressed", "true").unwrap();
        assert_eq!(classify(&d, b).states, vec!["pressed".to_string()]);
    }

    #[test]
    fn test_state_order() {
        let d = doc(r#"<input id="i" type="checkbox" checked required aria-expanded="true" aria-invalid="true">"#);
        assert_eq!(
            classify(&d, by_id(&d, "i")).states,
            vec!["expanded", "checked", "required", "invalid"]
        );
    }

    #[test]
    fn test_landmarks_and_region_chain() {
        let d = doc(r#"<header><nav aria-label="Main menu"><a id="a" href="/catalog">Catalog</a>
            <a id="b" href="/about">About</a></nav></header><main id="m"></main>"#);
        let a = classify(&d, by_id(&d, "a"));
        assert_eq!(a.region.as_deref(), Some("banner > navigation \"Main menu\""));
        assert!(a.states.contains(&"current page".to_string()));
        assert!(!classify(&d, by_id(&d, "b")).states.contains(&"current page".to_string()));
        assert_eq!(classify(&d, by_id(&d, "m")).landmark.as_deref(), Some("main"));
    }

    #[test]
    fn test_visited_link() {
        let mut d = doc(r#"<a id="a" href="/guides">Guides</a>"#);
        let a = by_id(&d, "a");
        assert!(!classify(&d, a).states.contains(&"visited".to_string()));
        d.mark_visited("/guides");
        assert!(classify(&d, a).states.contains(&"visited".to_string()));
    }

    #[test]
    fn test_live_settings() {
        let d = doc(r#"<div id="a" role="alert"></div><div id="b" aria-live="polite" aria-relevant="additions removals" aria-busy="true"></div><div id="c"></div>"#);
        let alert = live_settings(&d, by_id(&d, "a"), "alert").unwrap();
        assert_eq!(alert.politeness, LiveRegionMode::Assertive);
        assert!(alert.atomic);

        let b = live_settings(&d, by_id(&d, "b"), "div").unwrap();
        assert_eq!(b.relevant, vec![LiveRelevant::Additions, LiveRelevant::Removals]);
        assert!(b.busy);
        assert!(live_settings(&d, by_id(&d, "c"), "div").is_none());
    }

    #[test]
    fn test_flow_targets_and_shortcuts() {
        let d = doc(r#"<p id="p" aria-flowto="next missing">Intro</p><section id="next" aria-label="Details"></section>"#);
        let p = by_id(&d, "p");
        let targets = flow_targets(&d, p);
        assert_eq!(targets, vec![(by_id(&d, "next"), "Details".to_string())]);
        assert_eq!(shortcuts(&d, p, "p"), vec![FLOW_SHORTCUT.to_string()]);
    }

    #[test]
    fn test_description_and_details() {
        let d = doc(r#"<span id="hint">Opens in a new tab</span>
            <dialog id="dlg" aria-modal="true" aria-label="Suggest"><a id="a" href="/x" title="External" aria-describedby="hint">Go</a></dialog>"#);
        let details = element_details(&d, by_id(&d, "a"));
        assert_eq!(details.description.as_deref(), Some("Opens in a new tab"));
        assert_eq!(details.tab_index, 0);
        assert_eq!(details.shortcuts, vec!["Enter: follow link".to_string()]);

        let dialog = element_details(&d, by_id(&d, "dlg"));
        assert_eq!(dialog.role, "dialog");
        assert!(dialog.aria.modal);
    }

    #[test]
    fn test_missing_attributes_degrade() {
        let d = doc("<div id=\"x\"></div>");
        let details = element_details(&d, by_id(&d, "x"));
        assert_eq!(details.label, "");
        assert!(details.states.is_empty());
        assert_eq!(details.announcement(), "div");

        let detached = Classification::default();
        assert_eq!(classify(&d, NodeId::NONE), detached);
    }
}
