//! ALLYINFO Focus Overlay
//!
//! Keyboard-driven screen-reader simulation over a live document: a
//! spotlight on the current node of the virtual buffer, a description
//! panel and spoken announcements.
//!
//! # Example
//! ```rust,ignore
//! use ally_overlay::{FocusOverlay, OverlayConfig};
//! use ally_a11y::NullSpeech;
//!
//! let mut doc = ally_html::parse(html)?;
//! let mut overlay = FocusOverlay::new(OverlayConfig::default(), Box::new(NullSpeech));
//! overlay.activate(&mut doc)?;
//! overlay.handle_key(&mut doc, &mut KeyboardEvent::new("h"));
//! overlay.deactivate(&mut doc)?;
//! ```

mod config;
mod error;
pub mod render;
pub mod scroll_lock;
pub mod session;
pub mod sync;

pub use config::OverlayConfig;
pub use error::{OverlayError, SyncError};
pub use render::{DescriptionPanel, Spotlight};
pub use scroll_lock::ScrollLock;
pub use session::{FocusOverlay, SyncOutcome, END_OF_DOCUMENT, START_OF_DOCUMENT};
pub use sync::DomSync;

// Re-export sub-crates for embedders
pub use ally_a11y as a11y;
pub use ally_dom as dom;
