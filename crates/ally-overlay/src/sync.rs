//! DOM Synchronization
//!
//! Three narrowly scoped observers on the overlay root:
//! - structure: child list changes, rebuild on significant insertions
//! - state: an attribute allowlist, refreshes the current element
//! - live: text and live-region attributes, re-scans live regions
//!
//! Each `take_*` call hands back one batch, the analogue of a single
//! observer callback.

use ally_dom::{Document, MutationObserverInit, MutationRecord, MutationType, NodeId, ObserverId};

use crate::OverlayConfig;

/// Attributes that change live-region behaviour
const LIVE_ATTRIBUTES: &[&str] = &["aria-live", "aria-atomic", "aria-relevant", "aria-busy"];

/// Observer handles of one overlay session
#[derive(Debug)]
pub struct DomSync {
    root: NodeId,
    structure: ObserverId,
    state: ObserverId,
    live: ObserverId,
}

impl DomSync {
    /// Connect the three observers to `root`
    pub fn connect(doc: &mut Document, root: NodeId, config: &OverlayConfig) -> Self {
        let structure = doc.observe(root, MutationObserverInit {
            child_list: true,
            subtree: true,
            ..Default::default()
        });
        let state = doc.observe(root, MutationObserverInit {
            attributes: true,
            subtree: true,
            attribute_filter: Some(config.state_attributes.clone()),
            ..Default::default()
        });
        let live = doc.observe(root, MutationObserverInit {
            child_list: true,
            character_data: true,
            attributes: true,
            subtree: true,
            attribute_filter: Some(LIVE_ATTRIBUTES.iter().map(|a| a.to_string()).collect()),
        });
        tracing::debug!(?root, "dom sync connected");
        Self { root, structure, state, live }
    }

    /// Disconnect every observer
    pub fn disconnect(self, doc: &mut Document) {
        doc.disconnect(self.structure);
        doc.disconnect(self.state);
        doc.disconnect(self.live);
        tracing::debug!(root = ?self.root, "dom sync disconnected");
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn take_structure(&self, doc: &mut Document) -> Vec<MutationRecord> {
        doc.take_records(self.structure)
    }

    pub fn take_state(&self, doc: &mut Document) -> Vec<MutationRecord> {
        doc.take_records(self.state)
    }

    pub fn take_live(&self, doc: &mut Document) -> Vec<MutationRecord> {
        doc.take_records(self.live)
    }

    /// Drop every pending batch
    pub fn discard_pending(&self, doc: &mut Document) {
        self.take_structure(doc);
        self.take_state(doc);
        self.take_live(doc);
    }
}

/// A batch is significant when it added a node that is, or contains,
/// one of the configured tags. Attribute churn and other insertions are
/// ignored, so reordering list items does not rebuild.
pub fn is_significant(doc: &Document, records: &[MutationRecord], config: &OverlayConfig) -> bool {
    let tree = doc.tree();
    records.iter()
        .filter(|r| r.mutation_type == MutationType::ChildList)
        .flat_map(|r| r.added_nodes.iter().copied())
        .any(|added| {
            std::iter::once(added)
                .chain(tree.descendants(added))
                .filter_map(|node| tree.tag_name(node))
                .any(|tag| config.is_significant_tag(tag))
        })
}

/// Distinct attribute-change targets, in batch order
pub fn state_targets(records: &[MutationRecord]) -> Vec<NodeId> {
    let mut targets: Vec<NodeId> = Vec::new();
    for record in records.iter().filter(|r| r.mutation_type == MutationType::Attributes) {
        if !targets.contains(&record.target) {
            targets.push(record.target);
        }
    }
    targets
}
