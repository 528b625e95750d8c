//! Document - High-level document API
//!
//! Wraps the arena tree with the browser-side state the overlay touches:
//! location, focus, window scroll, layout rects, visited history and the
//! mutation observer registry. Every mutation made through `Document`
//! is reported to connected observers; `tree_mut` bypasses them and is
//! meant for loaders building a document before anyone observes it.

use std::collections::{HashMap, HashSet};

use url::Url;

use crate::style::{normalize_color, parse_inline_style, serialize_inline_style};
use crate::{
    ComputedStyle, DOMRect, DomError, DomTree, MutationObserverInit, MutationRecord, NodeId,
    ObserverId, ObserverRegistry, VISITED_LINK_COLOR, LINK_COLOR,
};

/// Tags whose DOM `tabIndex` defaults to 0
const NATIVELY_FOCUSABLE: &[&str] = &["a", "button", "input", "select", "textarea"];

/// HTML Document
#[derive(Debug)]
pub struct Document {
    tree: DomTree,
    /// Document URL (None when unparseable)
    url: Option<Url>,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
    active_element: Option<NodeId>,
    scroll_x: f64,
    scroll_y: f64,
    /// Host-assigned layout boxes in document coordinates
    layout: HashMap<NodeId, DOMRect>,
    /// Visited absolute URLs
    history: HashSet<String>,
    observers: ObserverRegistry,
}

impl Document {
    /// Create a new document with `<html><head></head><body></body></html>`
    pub fn new(url: &str) -> Self {
        let mut doc = Self::empty(url);
        let tree = &mut doc.tree;

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Freshly created nodes under a live root cannot fail to attach
        let _ = tree.append_child(tree.root(), html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        doc.html_element = html;
        doc.head_element = head;
        doc.body_element = body;
        doc
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        let parsed = Url::parse(url).ok();
        if parsed.is_none() {
            tracing::warn!("Unparseable document URL {:?}, using about:blank", url);
        }
        Self {
            tree: DomTree::new(),
            url: parsed,
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
            active_element: None,
            scroll_x: 0.0,
            scroll_y: 0.0,
            layout: HashMap::new(),
            history: HashSet::new(),
            observers: ObserverRegistry::new(),
        }
    }

    /// Locate `<html>`, `<head>` and `<body>` after a loader filled the tree
    pub fn finalize(&mut self) {
        let find_child = |tree: &DomTree, parent: NodeId, tag: &str| {
            tree.child_elements(parent).find(|&id| tree.tag_name(id) == Some(tag))
        };
        let html = find_child(&self.tree, self.tree.root(), "html");
        self.html_element = html.unwrap_or(NodeId::NONE);
        if let Some(html) = html {
            self.head_element = find_child(&self.tree, html, "head").unwrap_or(NodeId::NONE);
            self.body_element = find_child(&self.tree, html, "body").unwrap_or(NodeId::NONE);
        }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        self.url.as_ref().map(|u| u.as_str()).unwrap_or("about:blank")
    }

    /// `location.pathname`
    pub fn pathname(&self) -> &str {
        self.url.as_ref().map(|u| u.path()).unwrap_or("blank")
    }

    /// Move to a new location (route change); the new URL becomes visited
    pub fn navigate(&mut self, url: &str) -> Result<(), DomError> {
        let target = match &self.url {
            Some(base) => base.join(url),
            None => Url::parse(url),
        }
        .map_err(|_| DomError::InvalidUrl(url.to_string()))?;
        tracing::debug!("Navigating to {}", target);
        self.history.insert(target.to_string());
        self.url = Some(target);
        Ok(())
    }

    /// Resolve an href against the document URL
    pub fn resolve_url(&self, href: &str) -> Option<Url> {
        match &self.url {
            Some(base) => base.join(href).ok(),
            None => Url::parse(href).ok(),
        }
    }

    /// `pathname` of an href resolved against the document URL
    pub fn resolve_pathname(&self, href: &str) -> Option<String> {
        self.resolve_url(href).map(|u| u.path().to_string())
    }

    /// Record a URL as visited
    pub fn mark_visited(&mut self, href: &str) {
        if let Some(url) = self.resolve_url(href) {
            self.history.insert(url.to_string());
        }
    }

    fn is_visited(&self, href: &str) -> bool {
        self.resolve_url(href)
            .map(|u| self.history.contains(u.as_str()))
            .unwrap_or(false)
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably, without notifying observers
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Get `<html>` element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get `<head>` element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get `<body>` element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.tree.descendants(self.tree.root())
            .find(|&node| self.tree.element(node).and_then(|e| e.id()) == Some(id))
    }

    /// Connected elements with one of `tags`, in document order
    pub fn get_elements_by_tag_names(&self, tags: &[&str]) -> Vec<NodeId> {
        self.tree.descendants(self.tree.root())
            .filter(|&node| self.tree.tag_name(node).map(|t| tags.contains(&t)).unwrap_or(false))
            .collect()
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create_element(tag)
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.tree.create_text(text)
    }

    /// Append a child and notify observers
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert a child before `reference` and notify observers
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        let old_parent = self.tree.parent(child);
        self.tree.insert_before(parent, child, reference)?;

        if let Some(old_parent) = old_parent {
            self.observers.notify(&self.tree, MutationRecord::child_list(old_parent, vec![], vec![child]));
        }
        let node = self.tree.get(child).ok_or(DomError::NotFound(child))?;
        let mut record = MutationRecord::child_list(parent, vec![child], vec![]);
        record.previous_sibling = node.prev_sibling.to_option();
        record.next_sibling = node.next_sibling.to_option();
        self.observers.notify(&self.tree, record);
        Ok(())
    }

    /// Remove a child and notify observers
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let (prev, next) = self.tree.get(child)
            .map(|n| (n.prev_sibling.to_option(), n.next_sibling.to_option()))
            .unwrap_or((None, None));
        self.tree.remove_child(parent, child)?;

        let mut record = MutationRecord::child_list(parent, vec![], vec![child]);
        record.previous_sibling = prev;
        record.next_sibling = next;
        self.observers.notify(&self.tree, record);
        Ok(())
    }

    /// Set an attribute and notify observers
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let data = self.tree.element_mut(element).ok_or(DomError::NotAnElement(element))?;
        let old = data.set_attr(name, value);
        self.observers.notify(&self.tree, MutationRecord::attribute(element, name, old));
        Ok(())
    }

    /// Remove an attribute and notify observers (no record when absent)
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) -> Result<(), DomError> {
        let data = self.tree.element_mut(element).ok_or(DomError::NotAnElement(element))?;
        if let Some(old) = data.remove_attr(name) {
            self.observers.notify(&self.tree, MutationRecord::attribute(element, name, Some(old)));
        }
        Ok(())
    }

    /// Replace the data of a text node and notify observers
    pub fn set_text(&mut self, text_node: NodeId, data: &str) -> Result<(), DomError> {
        let node = self.tree.get_mut(text_node).ok_or(DomError::NotFound(text_node))?;
        let old = match &mut node.data {
            crate::NodeData::Text(content) | crate::NodeData::Comment(content) => {
                std::mem::replace(content, data.to_string())
            }
            _ => return Err(DomError::NotFound(text_node)),
        };
        self.observers.notify(&self.tree, MutationRecord::character_data(text_node, old));
        Ok(())
    }

    /// Resolved style of a connected element
    pub fn computed_style(&self, element: NodeId) -> Option<ComputedStyle> {
        self.tree.element(element)?;
        let mut chain: Vec<NodeId> = self.tree.ancestors(element)
            .filter(|&id| self.tree.element(id).is_some())
            .collect();
        chain.reverse();
        chain.push(element);

        let mut style: Option<ComputedStyle> = None;
        for id in chain {
            let data = self.tree.element(id)?;
            let link_color = match data.get_attr("href") {
                Some(href) if data.tag == "a" => Some(if self.is_visited(href) {
                    VISITED_LINK_COLOR
                } else {
                    LINK_COLOR
                }),
                _ => None,
            };
            style = Some(ComputedStyle::cascade(&data.tag, style.as_ref(), link_color, data.get_attr("style")));
        }
        style
    }

    /// Inline style property of an element
    pub fn style_property(&self, element: NodeId, name: &str) -> Option<String> {
        let inline = self.tree.get_attribute(element, "style")?;
        parse_inline_style(inline).into_iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Set one inline style property, keeping the others
    pub fn set_style_property(&mut self, element: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut decls = self.tree.get_attribute(element, "style")
            .map(parse_inline_style)
            .unwrap_or_default();
        let name = name.to_ascii_lowercase();
        match decls.iter_mut().find(|(n, _)| *n == name) {
            Some(decl) => decl.1 = value.to_string(),
            None => decls.push((name, value.to_string())),
        }
        self.set_attribute(element, "style", &serialize_inline_style(&decls))
    }

    /// Remove one inline style property; drops the attribute when empty
    pub fn remove_style_property(&mut self, element: NodeId, name: &str) -> Result<(), DomError> {
        let Some(inline) = self.tree.get_attribute(element, "style") else {
            return Ok(());
        };
        let mut decls = parse_inline_style(inline);
        let before = decls.len();
        decls.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        if decls.len() == before {
            return Ok(());
        }
        if decls.is_empty() {
            self.remove_attribute(element, "style")
        } else {
            self.set_attribute(element, "style", &serialize_inline_style(&decls))
        }
    }

    /// Assign a layout box (document coordinates)
    pub fn set_layout_rect(&mut self, element: NodeId, rect: DOMRect) {
        self.layout.insert(element, rect);
    }

    /// `getBoundingClientRect`: layout box relative to the viewport
    pub fn bounding_client_rect(&self, element: NodeId) -> DOMRect {
        let Some(rect) = self.layout.get(&element) else {
            return DOMRect::default();
        };
        let (offset_x, offset_y) = self.body_fixed_offset();
        DOMRect::from_xywh(
            rect.x - self.scroll_x + offset_x,
            rect.y - self.scroll_y + offset_y,
            rect.width,
            rect.height,
        )
    }

    /// Offset applied by a `position:fixed` body (scroll lock)
    fn body_fixed_offset(&self) -> (f64, f64) {
        if !self.body_element.is_valid() {
            return (0.0, 0.0);
        }
        let fixed = self.style_property(self.body_element, "position")
            .map(|p| p.eq_ignore_ascii_case("fixed"))
            .unwrap_or(false);
        if !fixed {
            return (0.0, 0.0);
        }
        let px = |name: &str| {
            self.style_property(self.body_element, name)
                .and_then(|v| v.trim_end_matches("px").trim().parse::<f64>().ok())
                .unwrap_or(0.0)
        };
        (px("left"), px("top"))
    }

    /// DOM `tabIndex`
    pub fn tab_index(&self, element: NodeId) -> i32 {
        let Some(data) = self.tree.element(element) else {
            return -1;
        };
        if let Some(value) = data.get_attr("tabindex").and_then(|v| v.trim().parse::<i32>().ok()) {
            return value;
        }
        if NATIVELY_FOCUSABLE.contains(&data.tag.as_str()) { 0 } else { -1 }
    }

    /// Move focus to a connected element
    pub fn focus(&mut self, element: NodeId) -> bool {
        if self.tree.element(element).is_none() || !self.tree.is_connected(element) {
            return false;
        }
        self.active_element = Some(element);
        true
    }

    /// Clear focus
    pub fn blur(&mut self) {
        self.active_element = None;
    }

    /// Focused element, if still connected
    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element.filter(|&id| self.tree.is_connected(id))
    }

    /// `window.scrollX`
    pub fn scroll_x(&self) -> f64 {
        self.scroll_x
    }

    /// `window.scrollY`
    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    /// `window.scrollTo`
    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.scroll_x = x.max(0.0);
        self.scroll_y = y.max(0.0);
    }

    /// Start observing `target`
    pub fn observe(&mut self, target: NodeId, options: MutationObserverInit) -> ObserverId {
        self.observers.observe(target, options)
    }

    /// Disconnect an observer
    pub fn disconnect(&mut self, id: ObserverId) {
        self.observers.disconnect(id);
    }

    /// Take an observer's pending batch
    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.observers.take_records(id)
    }

    /// Number of connected observers
    pub fn observer_count(&self) -> usize {
        self.observers.connected_count()
    }

    /// Normalised colour comparison helper
    pub fn same_color(a: &str, b: &str) -> bool {
        normalize_color(a) == normalize_color(b)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MutationType, Visibility};

    fn doc_with_list() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new("https://ally.example/catalog");
        let body = doc.body();
        let ul = doc.create_element("ul");
        doc.append_child(body, ul).unwrap();
        let li = doc.create_element("li");
        doc.append_child(ul, li).unwrap();
        (doc, ul, li)
    }

    #[test]
    fn test_structure() {
        let doc = Document::new("https://ally.example/");
        assert_eq!(doc.tree().tag_name(doc.document_element()), Some("html"));
        assert_eq!(doc.tree().tag_name(doc.head()), Some("head"));
        assert_eq!(doc.tree().tag_name(doc.body()), Some("body"));
        assert_eq!(doc.pathname(), "/");
    }

    #[test]
    fn test_get_element_by_id() {
        let (mut doc, _, li) = doc_with_list();
        doc.set_attribute(li, "id", "first").unwrap();
        assert_eq!(doc.get_element_by_id("first"), Some(li));
        assert_eq!(doc.get_element_by_id("missing"), None);
    }

    #[test]
    fn test_observer_receives_batch() {
        let (mut doc, ul, li) = doc_with_list();
        let body = doc.body();
        let obs = doc.observe(body, MutationObserverInit {
            child_list: true,
            attributes: true,
            subtree: true,
            ..Default::default()
        });

        let li2 = doc.create_element("li");
        doc.append_child(ul, li2).unwrap();
        doc.set_attribute(li, "aria-current", "true").unwrap();
        doc.remove_child(ul, li).unwrap();

        let records = doc.take_records(obs);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].mutation_type, MutationType::ChildList);
        assert_eq!(records[0].added_nodes, vec![li2]);
        assert_eq!(records[0].previous_sibling, Some(li));
        assert_eq!(records[1].mutation_type, MutationType::Attributes);
        assert_eq!(records[2].removed_nodes, vec![li]);

        doc.disconnect(obs);
        assert_eq!(doc.observer_count(), 0);
    }

    #[test]
    fn test_computed_style_hidden_inheritance() {
        let (mut doc, ul, li) = doc_with_list();
        doc.set_attribute(ul, "style", "visibility: hidden").unwrap();
        assert_eq!(doc.computed_style(li).unwrap().visibility, Visibility::Hidden);
    }

    #[test]
    fn test_visited_link_color() {
        let mut doc = Document::new("https://ally.example/");
        let a = doc.create_element("a");
        doc.append_child(doc.body(), a).unwrap();
        doc.set_attribute(a, "href", "/guides").unwrap();
        assert_eq!(doc.computed_style(a).unwrap().color, LINK_COLOR);

        doc.mark_visited("https://ally.example/guides");
        assert_eq!(doc.computed_style(a).unwrap().color, VISITED_LINK_COLOR);
    }

    #[test]
    fn test_tab_index_defaults() {
        let mut doc = Document::new("https://ally.example/");
        let button = doc.create_element("button");
        let div = doc.create_element("div");
        doc.append_child(doc.body(), button).unwrap();
        doc.append_child(doc.body(), div).unwrap();
        assert_eq!(doc.tab_index(button), 0);
        assert_eq!(doc.tab_index(div), -1);
        doc.set_attribute(div, "tabindex", "2").unwrap();
        assert_eq!(doc.tab_index(div), 2);
    }

    #[test]
    fn test_focus_requires_connection() {
        let (mut doc, ul, li) = doc_with_list();
        assert!(doc.focus(li));
        assert_eq!(doc.active_element(), Some(li));
        doc.remove_child(ul, li).unwrap();
        assert_eq!(doc.active_element(), None);
        assert!(!doc.focus(li));
    }

    #[test]
    fn test_style_property_edit() {
        let mut doc = Document::new("https://ally.example/");
        let body = doc.body();
        doc.set_style_property(body, "position", "fixed").unwrap();
        doc.set_style_property(body, "top", "-120px").unwrap();
        assert_eq!(doc.style_property(body, "top").as_deref(), Some("-120px"));

        let el = doc.create_element("div");
        doc.append_child(body, el).unwrap();
        doc.set_layout_rect(el, DOMRect::from_xywh(0.0, 200.0, 50.0, 10.0));
        assert_eq!(doc.bounding_client_rect(el).y, 80.0);

        doc.remove_style_property(body, "position").unwrap();
        doc.remove_style_property(body, "top").unwrap();
        assert!(!doc.tree().has_attribute(body, "style"));
    }

    #[test]
    fn test_navigate_marks_visited() {
        let mut doc = Document::new("https://ally.example/");
        doc.navigate("/articles/contrast").unwrap();
        assert_eq!(doc.pathname(), "/articles/contrast");
        assert!(doc.is_visited("https://ally.example/articles/contrast"));
    }
}
