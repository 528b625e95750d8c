//! Overlay errors

use ally_a11y::A11yError;
use ally_dom::{DomError, NodeId};

/// Focus overlay error
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Invalid overlay configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Document has no body")]
    NoBody,

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Accessibility error: {0}")]
    A11y(#[from] A11yError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

/// Failure inside one observer callback
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Observed root {0:?} left the document")]
    RootDetached(NodeId),

    #[error("Current element {0:?} left the document")]
    ElementDetached(NodeId),

    #[error("Rebuild failed: {0}")]
    Rebuild(#[from] A11yError),
}
