//! Virtual Buffer
//!
//! In-memory mirror of the visible DOM subtree with a single cursor.
//! Nodes live in a flat arena; parent, child and sibling links are
//! indices. `next`/`previous` only link siblings, so pre-order
//! traversal composes them with the parent and child links. Moves never
//! wrap past either end of the tree.

use std::collections::HashMap;

use ally_dom::{Document, NodeId};

use crate::aria::{is_dialog_role, LiveSettings};
use crate::classify::{
    accessible_name, classify, description, flow_targets, is_modal, live_settings,
    screen_reader_text,
};
use crate::A11yError;

/// Index of a node in the buffer arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualNodeId(u32);

impl VirtualNodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// `aria-flowto` target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowTarget {
    pub element: NodeId,
    pub label: String,
    /// Buffer node wrapping the target, when it was visible at build time
    pub node: Option<VirtualNodeId>,
}

/// One visible element
#[derive(Debug, Clone)]
pub struct VirtualNode {
    /// Live element (lookup only, owned by the document)
    pub element: NodeId,
    pub role: String,
    pub label: String,
    pub states: Vec<String>,
    pub is_interactive: bool,
    pub is_focusable: bool,
    pub is_hidden: bool,
    pub screen_reader_text: String,
    pub description: Option<String>,
    pub live_settings: Option<LiveSettings>,
    pub is_modal: Option<bool>,
    pub flow_targets: Vec<FlowTarget>,

    pub parent: Option<VirtualNodeId>,
    pub children: Vec<VirtualNodeId>,
    pub first_child: Option<VirtualNodeId>,
    pub last_child: Option<VirtualNodeId>,
    pub next: Option<VirtualNodeId>,
    pub previous: Option<VirtualNodeId>,
}

impl VirtualNode {
    fn from_element(doc: &Document, element: NodeId, parent: Option<VirtualNodeId>) -> Self {
        let c = classify(doc, element);
        let (_, name_source) = accessible_name(doc, element);
        let description = description(doc, element, name_source);
        let screen_reader_text = screen_reader_text(doc, element, &c, description.as_deref());
        let flow_targets = flow_targets(doc, element)
            .into_iter()
            .map(|(target, label)| FlowTarget { element: target, label, node: None })
            .collect();

        Self {
            element,
            live_settings: live_settings(doc, element, &c.role),
            is_modal: is_modal(doc, element, &c.role),
            role: c.role,
            label: c.label,
            states: c.states,
            is_interactive: c.is_interactive,
            is_focusable: c.is_focusable,
            is_hidden: c.is_hidden,
            screen_reader_text,
            description,
            flow_targets,
            parent,
            children: Vec::new(),
            first_child: None,
            last_child: None,
            next: None,
            previous: None,
        }
    }
}

/// Virtual buffer with its cursor
#[derive(Debug, Default)]
pub struct VirtualBuffer {
    nodes: Vec<VirtualNode>,
    root: Option<VirtualNodeId>,
    current: Option<VirtualNodeId>,
    by_element: HashMap<NodeId, VirtualNodeId>,
    generation: u64,
}

impl VirtualBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer rooted at `root`
    pub fn from_root(doc: &Document, root: NodeId) -> Result<Self, A11yError> {
        let mut buffer = Self::new();
        buffer.build(doc, root)?;
        Ok(buffer)
    }

    /// Discard the tree and rebuild it from `root`. The cursor is cleared.
    pub fn build(&mut self, doc: &Document, root: NodeId) -> Result<(), A11yError> {
        let tree = doc.tree();
        if tree.element(root).is_none() {
            return Err(A11yError::InvalidRoot(root));
        }
        if !tree.is_connected(root) {
            return Err(A11yError::DetachedRoot(root));
        }

        self.nodes.clear();
        self.by_element.clear();
        self.current = None;
        self.generation += 1;
        self.root = self.visit(doc, root, None);
        self.link_siblings();
        self.resolve_flow_targets();

        tracing::debug!(
            generation = self.generation,
            nodes = self.nodes.len(),
            "virtual buffer built"
        );
        Ok(())
    }

    /// Add `element` and its visible subtree; hidden elements prune their subtree
    fn visit(&mut self, doc: &Document, element: NodeId, parent: Option<VirtualNodeId>) -> Option<VirtualNodeId> {
        let node = VirtualNode::from_element(doc, element, parent);
        if node.is_hidden {
            return None;
        }

        let id = VirtualNodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.by_element.insert(element, id);

        let children: Vec<NodeId> = doc.tree().child_elements(element).collect();
        for child in children {
            if let Some(child_id) = self.visit(doc, child, Some(id)) {
                self.nodes[id.index()].children.push(child_id);
            }
        }
        Some(id)
    }

    /// Assign first/last child and sibling links from each children list
    pub fn link_siblings(&mut self) {
        for i in 0..self.nodes.len() {
            let children = self.nodes[i].children.clone();
            self.nodes[i].first_child = children.first().copied();
            self.nodes[i].last_child = children.last().copied();
            for (pos, &child) in children.iter().enumerate() {
                let node = &mut self.nodes[child.index()];
                node.previous = pos.checked_sub(1).map(|p| children[p]);
                node.next = children.get(pos + 1).copied();
            }
        }
    }

    fn resolve_flow_targets(&mut self) {
        let by_element = &self.by_element;
        for node in &mut self.nodes {
            for target in &mut node.flow_targets {
                target.node = by_element.get(&target.element).copied();
            }
        }
    }

    /// Pre-order successor of `id`
    fn successor(&self, id: VirtualNodeId) -> Option<VirtualNodeId> {
        let node = self.node(id)?;
        if let Some(child) = node.first_child {
            return Some(child);
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = &self.nodes[current.index()];
            if let Some(next) = node.next {
                return Some(next);
            }
            cursor = node.parent;
        }
        None
    }

    /// Pre-order predecessor of `id`
    fn predecessor(&self, id: VirtualNodeId) -> Option<VirtualNodeId> {
        let node = self.node(id)?;
        match node.previous {
            Some(previous) => {
                let mut deepest = previous;
                while let Some(last) = self.nodes[deepest.index()].last_child {
                    deepest = last;
                }
                Some(deepest)
            }
            None => node.parent,
        }
    }

    /// Advance to the pre-order successor. Without a cursor this lands on
    /// the root. `None` at the end of the tree leaves the cursor as it was.
    pub fn move_next(&mut self) -> Option<VirtualNodeId> {
        let next = match self.current {
            Some(current) => self.successor(current),
            None => self.root,
        }?;
        self.current = Some(next);
        Some(next)
    }

    /// Step back to the pre-order predecessor; `None` at the root
    pub fn move_previous(&mut self) -> Option<VirtualNodeId> {
        let previous = self.predecessor(self.current?)?;
        self.current = Some(previous);
        Some(previous)
    }

    /// Next node with exactly `role`; the cursor only moves on a match
    pub fn move_to_next_by_role(&mut self, role: &str) -> Option<VirtualNodeId> {
        let mut candidate = match self.current {
            Some(current) => self.successor(current),
            None => self.root,
        };
        while let Some(id) = candidate {
            if self.nodes[id.index()].role == role {
                self.current = Some(id);
                return Some(id);
            }
            candidate = self.successor(id);
        }
        None
    }

    /// Previous node with exactly `role`; the cursor only moves on a match
    pub fn move_to_previous_by_role(&mut self, role: &str) -> Option<VirtualNodeId> {
        let mut candidate = self.current.and_then(|current| self.predecessor(current));
        while let Some(id) = candidate {
            if self.nodes[id.index()].role == role {
                self.current = Some(id);
                return Some(id);
            }
            candidate = self.predecessor(id);
        }
        None
    }

    /// Put the cursor on the node wrapping `element`
    pub fn set_current_node(&mut self, element: NodeId) -> Option<VirtualNodeId> {
        let id = self.find(element)?;
        self.current = Some(id);
        Some(id)
    }

    /// Node wrapping `element`, without moving the cursor
    pub fn find(&self, element: NodeId) -> Option<VirtualNodeId> {
        self.by_element.get(&element).copied()
    }

    /// Cursor position
    pub fn current(&self) -> Option<VirtualNodeId> {
        self.current
    }

    /// Node under the cursor
    pub fn current_node(&self) -> Option<&VirtualNode> {
        self.current.and_then(|id| self.node(id))
    }

    /// Nearest dialog node at or above `id`
    pub fn dialog_ancestor(&self, id: VirtualNodeId) -> Option<VirtualNodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current)?;
            if is_dialog_role(&node.role) {
                return Some(current);
            }
            cursor = node.parent;
        }
        None
    }

    /// Check whether `ancestor` is `id` or one of its ancestors
    pub fn is_within(&self, id: VirtualNodeId, ancestor: VirtualNodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.node(current).and_then(|n| n.parent);
        }
        false
    }

    pub fn node(&self, id: VirtualNodeId) -> Option<&VirtualNode> {
        self.nodes.get(id.index())
    }

    pub fn root(&self) -> Option<VirtualNodeId> {
        self.root
    }

    /// Number of builds so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order iterator over the tree
    pub fn iter(&self) -> Iter<'_> {
        Iter { buffer: self, next: self.root }
    }
}

/// Pre-order iterator
pub struct Iter<'a> {
    buffer: &'a VirtualBuffer,
    next: Option<VirtualNodeId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (VirtualNodeId, &'a VirtualNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.buffer.successor(id);
        self.buffer.node(id).map(|node| (id, node))
    }
}
