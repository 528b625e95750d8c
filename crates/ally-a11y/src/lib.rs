//! ALLYINFO Accessibility
//!
//! Screen-reader model behind the focus overlay.
//!
//! Features:
//! - Data-driven ARIA role tables (tag roles, landmarks, shortcuts)
//! - Accessible-role classifier and screen-reader text
//! - Virtual buffer with no-wrap pre-order traversal
//! - Live region change detection
//! - Keyboard command map
//! - Speech output seam

pub mod aria;
pub mod classify;
pub mod virtual_buffer;
pub mod live_region;
pub mod keyboard_nav;
pub mod speech;

// Core exports
pub use aria::{LiveRegionMode, LiveRelevant, LiveSettings, TriState};
pub use classify::{
    classify, element_details, AriaFlags, Classification, ElementDetails, NameSource,
    PositionInSet,
};
pub use virtual_buffer::{FlowTarget, VirtualBuffer, VirtualNode, VirtualNodeId};
pub use live_region::{ChangeType, LiveRegionChange, LiveRegionConfig, LiveRegionTracker, RelevantFlags};
pub use keyboard_nav::{KeyboardShortcut, NavAction, NavigationMode, ShortcutRegistry};
pub use speech::{Announcer, MemorySpeech, NullSpeech, SpeechError, SpeechEvent, SpeechLog, SpeechOutput};

use ally_dom::NodeId;

/// Accessibility error
#[derive(Debug, thiserror::Error)]
pub enum A11yError {
    #[error("Buffer root {0:?} is not an element")]
    InvalidRoot(NodeId),

    #[error("Buffer root {0:?} is not connected to the document")]
    DetachedRoot(NodeId),
}
