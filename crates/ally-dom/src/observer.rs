//! Mutation Observers
//!
//! Records queue up per observer until the host takes them, so one
//! `take_records` call hands back a whole batch the way a browser
//! delivers several mutations to a single callback.

use crate::{DomTree, NodeId};

/// Mutation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    CharacterData,
    ChildList,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes: added,
            removed_nodes: removed,
            previous_sibling: None,
            next_sibling: None,
            attribute_name: None,
            old_value: None,
        }
    }

    pub fn attribute(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: Some(name.to_ascii_lowercase()),
            old_value,
        }
    }

    pub fn character_data(target: NodeId, old_value: String) -> Self {
        Self {
            mutation_type: MutationType::CharacterData,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: None,
            old_value: Some(old_value),
        }
    }
}

/// Mutation observer options
#[derive(Debug, Clone, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub character_data: bool,
    pub subtree: bool,
    pub attribute_filter: Option<Vec<String>>,
}

/// Handle to a registered observer. Slots are reused after
/// `disconnect`; the generation keeps stale handles from reaching the
/// observer that took the slot over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct MutationObserver {
    target: NodeId,
    options: MutationObserverInit,
    records: Vec<MutationRecord>,
}

impl MutationObserver {
    fn matches(&self, tree: &DomTree, record: &MutationRecord) -> bool {
        let matches_target = record.target == self.target
            || (self.options.subtree && tree.contains(self.target, record.target));
        let matches_type = match record.mutation_type {
            MutationType::Attributes => self.options.attributes,
            MutationType::CharacterData => self.options.character_data,
            MutationType::ChildList => self.options.child_list,
        };

        // Check attribute filter
        let passes_filter = if record.mutation_type == MutationType::Attributes {
            match (&self.options.attribute_filter, &record.attribute_name) {
                (Some(filter), Some(attr)) => filter.iter().any(|f| f.eq_ignore_ascii_case(attr)),
                _ => true,
            }
        } else {
            true
        };

        matches_target && matches_type && passes_filter
    }
}

/// Observer registry owned by a document
#[derive(Debug, Default)]
pub struct ObserverRegistry {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    observer: Option<MutationObserver>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start observing `target`
    pub fn observe(&mut self, target: NodeId, options: MutationObserverInit) -> ObserverId {
        let observer = MutationObserver { target, options, records: Vec::new() };
        let id = match self.free_list.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.observer = Some(observer);
                ObserverId { index, generation: slot.generation }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot { generation: 0, observer: Some(observer) });
                ObserverId { index, generation: 0 }
            }
        };
        tracing::trace!(?id, ?target, "observer connected");
        id
    }

    /// Stop observing and drop pending records
    pub fn disconnect(&mut self, id: ObserverId) {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return;
        };
        if slot.generation != id.generation || slot.observer.take().is_none() {
            return;
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        tracing::trace!(?id, "observer disconnected");
    }

    fn get(&self, id: ObserverId) -> Option<&MutationObserver> {
        self.slots.get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.observer.as_ref())
    }

    fn get_mut(&mut self, id: ObserverId) -> Option<&mut MutationObserver> {
        self.slots.get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.observer.as_mut())
    }

    /// Take the pending batch
    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.get_mut(id)
            .map(|o| std::mem::take(&mut o.records))
            .unwrap_or_default()
    }

    /// Check for a pending batch
    pub fn has_pending(&self, id: ObserverId) -> bool {
        self.get(id).map(|o| !o.records.is_empty()).unwrap_or(false)
    }

    pub fn is_connected(&self, id: ObserverId) -> bool {
        self.get(id).is_some()
    }

    /// Allocated slots, connected or free
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of connected observers
    pub fn connected_count(&self) -> usize {
        self.slots.iter().filter(|s| s.observer.is_some()).count()
    }

    /// Deliver a record to every matching observer
    pub fn notify(&mut self, tree: &DomTree, record: MutationRecord) {
        for observer in self.slots.iter_mut().filter_map(|s| s.observer.as_mut()) {
            if observer.matches(tree, &record) {
                observer.records.push(record.clone());
            }
        }
    }
}
