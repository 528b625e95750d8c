//! Live Region Support
//!
//! ARIA live regions for dynamic content announcements. Regions are
//! keyed by their live element; content present at registration is the
//! baseline and is never announced.

use std::collections::VecDeque;

use ally_dom::{Document, NodeId};

use crate::aria::{LiveRegionMode, LiveRelevant, LiveSettings};
use crate::classify::{is_hidden, live_settings, normalize_text, role_of};

/// Maximum number of queued announcements
pub const MAX_PENDING: usize = 100;

/// Live region configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LiveRegionConfig {
    /// Politeness level: off, polite, assertive
    pub politeness: LiveRegionMode,
    /// Whether to announce entire region or just changes
    pub atomic: bool,
    /// What types of changes to announce
    pub relevant: RelevantFlags,
    /// Whether content is being updated
    pub busy: bool,
}

impl Default for LiveRegionConfig {
    fn default() -> Self {
        Self {
            politeness: LiveRegionMode::Off,
            atomic: false,
            relevant: RelevantFlags::additions_text(),
            busy: false,
        }
    }
}

impl LiveRegionConfig {
    /// Create polite live region
    pub fn polite() -> Self {
        Self {
            politeness: LiveRegionMode::Polite,
            ..Default::default()
        }
    }

    /// Create assertive live region
    pub fn assertive() -> Self {
        Self {
            politeness: LiveRegionMode::Assertive,
            ..Default::default()
        }
    }

    /// Set atomic mode
    pub fn with_atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    pub fn with_busy(mut self, busy: bool) -> Self {
        self.busy = busy;
        self
    }

    /// Config from resolved element settings
    pub fn from_settings(settings: &LiveSettings) -> Self {
        Self {
            politeness: settings.politeness,
            atomic: settings.atomic,
            relevant: RelevantFlags::from_aria(&settings.relevant),
            busy: settings.busy,
        }
    }
}

/// Relevant change flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelevantFlags {
    pub additions: bool,
    pub removals: bool,
    pub text: bool,
}

impl RelevantFlags {
    pub fn all() -> Self {
        Self { additions: true, removals: true, text: true }
    }

    pub fn additions_text() -> Self {
        Self { additions: true, removals: false, text: true }
    }

    pub fn from_aria(relevant: &[LiveRelevant]) -> Self {
        let mut flags = Self::default();
        for r in relevant {
            match r {
                LiveRelevant::Additions => flags.additions = true,
                LiveRelevant::Removals => flags.removals = true,
                LiveRelevant::Text => flags.text = true,
                LiveRelevant::All => return Self::all(),
            }
        }
        if !flags.additions && !flags.removals && !flags.text {
            // Default is additions text
            Self::additions_text()
        } else {
            flags
        }
    }
}

/// Type of change detected in live region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    /// Node added
    Addition,
    /// Node removed
    Removal,
    /// Text content changed
    TextChange,
}

/// A detected change in a live region
#[derive(Debug, Clone, PartialEq)]
pub struct LiveRegionChange {
    /// Live element
    pub region: NodeId,
    pub change_type: ChangeType,
    /// Text to announce
    pub text: String,
    pub politeness: LiveRegionMode,
    /// Whether to interrupt current announcements
    pub interrupt: bool,
    /// Queue order
    pub sequence: u64,
}

#[derive(Debug)]
struct RegisteredRegion {
    node: NodeId,
    config: LiveRegionConfig,
    /// Last known text content for change detection
    last_content: String,
    /// Last known child count
    last_child_count: usize,
    /// Content changed while busy
    dirty: bool,
}

/// Live region tracker
#[derive(Debug)]
pub struct LiveRegionTracker {
    regions: Vec<RegisteredRegion>,
    pending: VecDeque<LiveRegionChange>,
    max_pending: usize,
    sequence: u64,
}

impl Default for LiveRegionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveRegionTracker {
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            pending: VecDeque::new(),
            max_pending: MAX_PENDING,
            sequence: 0,
        }
    }

    /// Register a live region with its current content as the baseline
    pub fn register(&mut self, node: NodeId, config: LiveRegionConfig, content: &str, child_count: usize) {
        self.regions.retain(|r| r.node != node);

        if config.politeness != LiveRegionMode::Off {
            self.regions.push(RegisteredRegion {
                node,
                config,
                last_content: content.to_string(),
                last_child_count: child_count,
                dirty: false,
            });
        }
    }

    /// Unregister a live region
    pub fn unregister(&mut self, node: NodeId) {
        self.regions.retain(|r| r.node != node);
    }

    /// Check for changes in a region's content
    pub fn update_content(&mut self, node: NodeId, new_content: &str, child_count: usize) {
        let Some(idx) = self.regions.iter().position(|r| r.node == node) else {
            return;
        };

        let change = {
            let region = &mut self.regions[idx];
            if region.config.busy {
                // Held back until the region goes idle
                if new_content != region.last_content || child_count != region.last_child_count {
                    region.dirty = true;
                }
                region.last_content = new_content.to_string();
                region.last_child_count = child_count;
                return;
            }

            let mut change_type = None;
            if child_count > region.last_child_count && region.config.relevant.additions {
                change_type = Some(ChangeType::Addition);
            } else if child_count < region.last_child_count && region.config.relevant.removals {
                change_type = Some(ChangeType::Removal);
            } else if region.config.relevant.text && new_content != region.last_content {
                change_type = Some(ChangeType::TextChange);
            }

            change_type.map(|change_type| {
                let text = if region.config.atomic {
                    new_content.to_string()
                } else {
                    changed_text(&region.last_content, new_content)
                };
                (change_type, text, region.config.politeness)
            })
        };

        self.regions[idx].last_content = new_content.to_string();
        self.regions[idx].last_child_count = child_count;

        if let Some((change_type, text, politeness)) = change {
            if !text.is_empty() {
                self.queue_change(node, change_type, text, politeness);
            }
        }
    }

    /// Set busy state for a region; going idle announces held-back content
    pub fn set_busy(&mut self, node: NodeId, busy: bool) {
        let Some(region) = self.regions.iter_mut().find(|r| r.node == node) else {
            return;
        };
        let was_busy = region.config.busy;
        region.config.busy = busy;

        if was_busy && !busy && region.dirty && !region.last_content.is_empty() {
            region.dirty = false;
            let text = region.last_content.clone();
            let politeness = region.config.politeness;
            self.queue_change(node, ChangeType::TextChange, text, politeness);
        }
    }

    fn queue_change(&mut self, region: NodeId, change_type: ChangeType, text: String, politeness: LiveRegionMode) {
        let interrupt = politeness == LiveRegionMode::Assertive;
        // Assertive interrupts existing queue
        if interrupt {
            self.pending.retain(|c| c.politeness == LiveRegionMode::Assertive);
        }

        self.sequence += 1;
        self.pending.push_back(LiveRegionChange {
            region,
            change_type,
            text,
            politeness,
            interrupt,
            sequence: self.sequence,
        });

        while self.pending.len() > self.max_pending {
            self.pending.pop_front();
        }
    }

    /// Get next change to announce
    pub fn next_change(&mut self) -> Option<LiveRegionChange> {
        // Prioritize assertive announcements
        if let Some(pos) = self.pending.iter().position(|c| c.politeness == LiveRegionMode::Assertive) {
            return self.pending.remove(pos);
        }
        self.pending.pop_front()
    }

    /// Check if there are pending announcements
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Get number of pending announcements
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Clear all pending announcements
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Check if a node is a live region
    pub fn is_live_region(&self, node: NodeId) -> bool {
        self.regions.iter().any(|r| r.node == node)
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Drop every region and pending change
    pub fn clear(&mut self) {
        self.regions.clear();
        self.pending.clear();
    }

    /// Re-scan `root` for live regions: register new ones, drop vanished
    /// ones and push content of known ones. Returns the number of queued
    /// changes.
    pub fn rescan(&mut self, doc: &Document, root: NodeId) -> usize {
        let before = self.sequence;
        let tree = doc.tree();

        let found: Vec<(NodeId, LiveSettings)> = std::iter::once(root)
            .chain(tree.descendants(root))
            .filter(|&el| tree.element(el).is_some() && !hidden_within(doc, el, root))
            .filter_map(|el| {
                let settings = live_settings(doc, el, &role_of(doc, el))?;
                (settings.politeness != LiveRegionMode::Off).then_some((el, settings))
            })
            .collect();

        self.regions.retain(|r| found.iter().any(|(el, _)| *el == r.node));

        for (el, settings) in found {
            let content = normalize_text(&tree.text_content(el));
            let child_count = tree.children(el).count();
            let config = LiveRegionConfig::from_settings(&settings);

            match self.regions.iter_mut().find(|r| r.node == el) {
                None => self.register(el, config, &content, child_count),
                Some(region) => {
                    let busy = config.busy;
                    region.config = LiveRegionConfig { busy: region.config.busy, ..config };
                    if busy {
                        self.set_busy(el, true);
                        self.update_content(el, &content, child_count);
                    } else {
                        self.update_content(el, &content, child_count);
                        self.set_busy(el, false);
                    }
                }
            }
        }

        let queued = (self.sequence - before) as usize;
        if queued > 0 {
            tracing::debug!(queued, regions = self.regions.len(), "live regions rescanned");
        }
        queued
    }
}

/// `el` or any ancestor up to and including `root` is hidden
fn hidden_within(doc: &Document, el: NodeId, root: NodeId) -> bool {
    if is_hidden(doc, el) {
        return true;
    }
    if el == root {
        return false;
    }
    doc.tree().ancestors(el)
        .take_while(|&a| a != root)
        .any(|a| is_hidden(doc, a))
        || is_hidden(doc, root)
}

/// Text added to a region: the appended tail when the old content is a
/// prefix, otherwise the whole new content
fn changed_text(old: &str, new: &str) -> String {
    match new.strip_prefix(old) {
        Some(tail) if !old.is_empty() => tail.trim().to_string(),
        _ => new.to_string(),
    }
}
