//! ALLYINFO DOM - Document Object Model
//!
//! Arena-based DOM used as the host document for the focus overlay.
//! Provides the read APIs the overlay needs (attributes, computed style,
//! geometry, text content), focus and window scroll state, and mutation
//! observers that batch change records until taken.

mod node;
mod tree;
mod document;
mod style;
mod geometry;
mod observer;
mod events;

pub use node::{Node, NodeData, ElementData, Attribute};
pub use tree::{DomTree, Children, Ancestors, Descendants};
pub use document::Document;
pub use style::{ComputedStyle, Display, Visibility, parse_inline_style, LINK_COLOR, VISITED_LINK_COLOR};
pub use geometry::DOMRect;
pub use observer::{MutationObserverInit, MutationRecord, MutationType, ObserverId, ObserverRegistry};
pub use events::KeyboardEvent;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Invalid/absent link
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Build an id from a raw arena index
    pub fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }

    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Convert a sentinel-encoded link into an `Option`
    #[inline]
    pub fn to_option(self) -> Option<NodeId> {
        if self.is_valid() { Some(self) } else { None }
    }
}

/// DOM error
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomError {
    #[error("Node {0:?} does not exist")]
    NotFound(NodeId),

    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("Inserting {child:?} under {parent:?} would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
