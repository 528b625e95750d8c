//! Focus Overlay session
//!
//! Owns everything an active overlay needs: the virtual buffer and its
//! cursor, the three DOM observers, the scroll lock and live-region
//! state. Deactivation undoes all of it synchronously, so nothing
//! outlives the session.

use ally_a11y::classify::is_focusable;
use ally_a11y::{
    element_details, Announcer, ElementDetails, LiveRegionTracker, NavAction, NavigationMode,
    ShortcutRegistry, SpeechOutput, VirtualBuffer, VirtualNodeId,
};
use ally_dom::{Document, KeyboardEvent, NodeId};

use crate::render::{DescriptionPanel, Spotlight};
use crate::scroll_lock::ScrollLock;
use crate::sync::{is_significant, state_targets, DomSync};
use crate::{OverlayConfig, OverlayError, SyncError};

/// Spoken when `move_next` runs off the end of the tree
pub const END_OF_DOCUMENT: &str = "End of document";
/// Spoken when `move_previous` runs off the start of the tree
pub const START_OF_DOCUMENT: &str = "Start of document";

/// What one `process_mutations` flush did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// The buffer was rebuilt after a significant structural change
    pub rebuilt: bool,
    /// The current element changed state and was re-announced
    pub state_refreshed: bool,
    /// Live-region changes announced
    pub live_announcements: usize,
}

/// Dialog entered through navigation
#[derive(Debug, Clone, Copy)]
struct DialogContext {
    dialog: NodeId,
    /// Element under the cursor before entering
    return_to: Option<NodeId>,
}

struct Session {
    buffer: VirtualBuffer,
    sync: DomSync,
    scroll_lock: Option<ScrollLock>,
    live: LiveRegionTracker,
    mode: NavigationMode,
    dialog: Option<DialogContext>,
    details: Option<ElementDetails>,
    spotlight: Option<Spotlight>,
    panel: Option<DescriptionPanel>,
}

impl Session {
    fn clear_view(&mut self) {
        self.details = None;
        self.spotlight = None;
        self.panel = None;
    }

    /// Recompute details, spotlight and panel for the cursor and announce
    fn render(&mut self, doc: &mut Document, config: &OverlayConfig, announcer: &mut Announcer, move_focus: bool) {
        let Some(element) = self.buffer.current_node().map(|n| n.element) else {
            self.clear_view();
            return;
        };

        let details = element_details(doc, element);
        self.spotlight = Some(Spotlight::for_element(doc, element, config.spotlight_padding));
        self.panel = Some(DescriptionPanel::new(&details, self.mode));
        if move_focus && config.move_focus && is_focusable(doc, element) {
            doc.focus(element);
        }
        announcer.announce(details.announcement());
        self.details = Some(details);
    }

    /// Track entering and leaving dialogs after a cursor move from `from`
    fn update_dialog_context(&mut self, from: Option<NodeId>) {
        let Some(current) = self.buffer.current() else {
            return;
        };
        let dialog = self.buffer.dialog_ancestor(current)
            .and_then(|id| self.buffer.node(id))
            .map(|n| n.element);

        match (self.dialog, dialog) {
            (None, Some(dialog)) => {
                tracing::debug!(?dialog, "entered dialog");
                self.dialog = Some(DialogContext { dialog, return_to: from });
            }
            (Some(ctx), Some(dialog)) if ctx.dialog != dialog => {
                self.dialog = Some(DialogContext { dialog, return_to: ctx.return_to });
            }
            (Some(_), None) => self.dialog = None,
            _ => {}
        }
    }
}

/// Put the cursor on the focused element, else on the toggle control.
/// Either one only counts when it made it into the buffer.
fn anchor_cursor(buffer: &mut VirtualBuffer, doc: &Document, config: &OverlayConfig) -> Option<VirtualNodeId> {
    doc.active_element()
        .and_then(|el| buffer.set_current_node(el))
        .or_else(|| {
            doc.get_element_by_id(&config.toggle_id)
                .and_then(|el| buffer.set_current_node(el))
        })
}

/// Focus overlay
pub struct FocusOverlay {
    config: OverlayConfig,
    announcer: Announcer,
    shortcuts: ShortcutRegistry,
    session: Option<Session>,
}

impl std::fmt::Debug for FocusOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusOverlay")
            .field("config", &self.config)
            .field("announcer", &self.announcer)
            .field("active", &self.is_active())
            .finish()
    }
}

impl FocusOverlay {
    pub fn new(config: OverlayConfig, speech: Box<dyn SpeechOutput>) -> Self {
        Self {
            config,
            announcer: Announcer::new(speech),
            shortcuts: ShortcutRegistry::new(),
            session: None,
        }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Build the buffer, lock scrolling, connect observers and anchor
    /// the cursor at the focused element (or the toggle control)
    pub fn activate(&mut self, doc: &mut Document) -> Result<(), OverlayError> {
        if self.session.is_some() {
            return Ok(());
        }
        let root = doc.body();
        if !root.is_valid() {
            return Err(OverlayError::NoBody);
        }

        let buffer = VirtualBuffer::from_root(doc, root)?;
        let scroll_lock = ScrollLock::engage(doc)?;
        let sync = DomSync::connect(doc, root, &self.config);
        let mut live = LiveRegionTracker::new();
        live.rescan(doc, root);

        let mut session = Session {
            buffer,
            sync,
            scroll_lock: Some(scroll_lock),
            live,
            mode: NavigationMode::default(),
            dialog: None,
            details: None,
            spotlight: None,
            panel: None,
        };

        match anchor_cursor(&mut session.buffer, doc, &self.config) {
            Some(_) => {
                session.update_dialog_context(None);
                session.render(doc, &self.config, &mut self.announcer, true);
            }
            None => tracing::debug!("no start node, overlay active without spotlight"),
        }

        tracing::info!(nodes = session.buffer.len(), "Focus overlay activated");
        self.session = Some(session);
        Ok(())
    }

    /// Undo every side effect of activation and return focus to the toggle
    pub fn deactivate(&mut self, doc: &mut Document) -> Result<(), OverlayError> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        session.sync.disconnect(doc);
        self.announcer.stop();
        let released = match session.scroll_lock.take() {
            Some(lock) => lock.release(doc),
            None => Ok(()),
        };
        if let Some(toggle) = doc.get_element_by_id(&self.config.toggle_id) {
            doc.focus(toggle);
        }

        tracing::info!("Focus overlay deactivated");
        released.map_err(OverlayError::from)
    }

    /// Flip the overlay; returns whether it is now active
    pub fn toggle(&mut self, doc: &mut Document) -> Result<bool, OverlayError> {
        if self.is_active() {
            self.deactivate(doc)?;
        } else {
            self.activate(doc)?;
        }
        Ok(self.is_active())
    }

    /// Dispatch a keydown. Returns true (and prevents the default) when
    /// the key is an overlay command.
    pub fn handle_key(&mut self, doc: &mut Document, event: &mut KeyboardEvent) -> bool {
        if self.session.is_none() {
            return false;
        }
        let Some(action) = self.shortcuts.action_for(event) else {
            return false;
        };
        event.prevent_default();
        tracing::debug!(?action, key = %event.key, "overlay key");

        match action {
            NavAction::ToggleMode => self.toggle_mode(),
            NavAction::FollowFlow => self.follow_flow(doc),
            NavAction::Exit => self.escape(doc),
            _ => self.navigate(doc, action),
        }
        true
    }

    fn navigate(&mut self, doc: &mut Document, action: NavAction) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let from = session.buffer.current_node().map(|n| n.element);

        let moved: Option<VirtualNodeId> = match (action.role(), action.is_backward()) {
            (Some(role), false) => session.buffer.move_to_next_by_role(role),
            (Some(role), true) => session.buffer.move_to_previous_by_role(role),
            (None, false) => session.buffer.move_next(),
            (None, true) => session.buffer.move_previous(),
        };

        match moved {
            Some(_) => {
                session.update_dialog_context(from);
                session.render(doc, &self.config, &mut self.announcer, true);
            }
            None => {
                tracing::debug!(?action, "traversal boundary");
                if self.config.announce_boundaries {
                    let phrase = if action.is_backward() { START_OF_DOCUMENT } else { END_OF_DOCUMENT };
                    self.announcer.announce(phrase);
                }
            }
        }
    }

    fn toggle_mode(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.mode = session.mode.toggle();
        if let Some(details) = &session.details {
            session.panel = Some(DescriptionPanel::new(details, session.mode));
        }
        self.announcer.announce(&format!("{} mode", session.mode.label()));
    }

    fn follow_flow(&mut self, doc: &mut Document) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let from = session.buffer.current_node().map(|n| n.element);
        let target = session.buffer.current_node()
            .and_then(|n| n.flow_targets.iter().find(|t| t.node.is_some()))
            .map(|t| t.element);

        let Some(target) = target else {
            tracing::debug!("no flow target");
            return;
        };
        if session.buffer.set_current_node(target).is_some() {
            session.update_dialog_context(from);
            session.render(doc, &self.config, &mut self.announcer, true);
        }
    }

    /// Escape: leave the dialog context first, otherwise deactivate
    fn escape(&mut self, doc: &mut Document) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(ctx) = session.dialog.take() {
            let landed = ctx.return_to
                .and_then(|el| session.buffer.set_current_node(el))
                .or_else(|| {
                    let dialog = session.buffer.find(ctx.dialog)?;
                    let parent = session.buffer.node(dialog)?.parent?;
                    let element = session.buffer.node(parent)?.element;
                    session.buffer.set_current_node(element)
                });
            tracing::debug!(dialog = ?ctx.dialog, "left dialog");
            if landed.is_some() {
                session.render(doc, &self.config, &mut self.announcer, true);
            }
            return;
        }

        if let Err(e) = self.deactivate(doc) {
            tracing::warn!("Deactivation failed: {}", e);
        }
    }

    /// Flush the three observers, each in its own error boundary
    pub fn process_mutations(&mut self, doc: &mut Document) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();
        let Some(session) = self.session.as_mut() else {
            return outcome;
        };

        match Self::sync_structure(session, doc, &self.config, &mut self.announcer) {
            Ok(rebuilt) => outcome.rebuilt = rebuilt,
            Err(e) => tracing::warn!("Structure sync failed: {}", e),
        }
        match Self::sync_state(session, doc, &self.config, &mut self.announcer) {
            Ok(refreshed) => outcome.state_refreshed = refreshed,
            Err(e) => tracing::warn!("State sync failed: {}", e),
        }
        match Self::sync_live(session, doc, &mut self.announcer) {
            Ok(count) => outcome.live_announcements = count,
            Err(e) => tracing::warn!("Live region sync failed: {}", e),
        }
        outcome
    }

    fn sync_structure(
        session: &mut Session,
        doc: &mut Document,
        config: &OverlayConfig,
        announcer: &mut Announcer,
    ) -> Result<bool, SyncError> {
        let records = session.sync.take_structure(doc);
        if records.is_empty() || !is_significant(doc, &records, config) {
            return Ok(false);
        }
        tracing::debug!(records = records.len(), "significant structure change");
        Self::rebuild(session, doc, config, announcer)?;
        Ok(true)
    }

    fn sync_state(
        session: &mut Session,
        doc: &mut Document,
        config: &OverlayConfig,
        announcer: &mut Announcer,
    ) -> Result<bool, SyncError> {
        let records = session.sync.take_state(doc);
        let Some(current) = session.buffer.current_node().map(|n| n.element) else {
            return Ok(false);
        };
        if !state_targets(&records).contains(&current) {
            return Ok(false);
        }
        if !doc.tree().is_connected(current) {
            return Err(SyncError::ElementDetached(current));
        }
        // State changes never restructure the tree
        session.render(doc, config, announcer, false);
        Ok(true)
    }

    fn sync_live(session: &mut Session, doc: &mut Document, announcer: &mut Announcer) -> Result<usize, SyncError> {
        let records = session.sync.take_live(doc);
        if records.is_empty() {
            return Ok(0);
        }
        let root = session.sync.root();
        if !doc.tree().is_connected(root) {
            return Err(SyncError::RootDetached(root));
        }
        session.live.rescan(doc, root);
        Ok(Self::drain_live(session, announcer))
    }

    fn drain_live(session: &mut Session, announcer: &mut Announcer) -> usize {
        let mut count = 0;
        while let Some(change) = session.live.next_change() {
            announcer.announce(&change.text);
            count += 1;
        }
        count
    }

    /// Rebuild from the observed root and re-anchor the cursor
    fn rebuild(
        session: &mut Session,
        doc: &mut Document,
        config: &OverlayConfig,
        announcer: &mut Announcer,
    ) -> Result<(), SyncError> {
        let root = session.sync.root();
        if !doc.tree().is_connected(root) {
            return Err(SyncError::RootDetached(root));
        }
        let previous = session.buffer.current_node().map(|n| n.element);
        session.buffer.build(doc, root)?;

        if let Some(ctx) = session.dialog {
            if session.buffer.find(ctx.dialog).is_none() {
                session.dialog = None;
            }
        }

        match anchor_cursor(&mut session.buffer, doc, config) {
            Some(_) => {
                session.update_dialog_context(previous);
                session.render(doc, config, announcer, false);
            }
            None => {
                tracing::debug!("rebuild found no anchor");
                session.clear_view();
            }
        }
        Ok(())
    }

    /// Route change: rebuild, re-anchor and re-scan live regions even
    /// without a significant mutation
    pub fn on_route_change(&mut self, doc: &mut Document) -> Result<(), OverlayError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        tracing::debug!(path = doc.pathname(), "route change");

        let body = doc.body();
        if body.is_valid() && body != session.sync.root() {
            let old = std::mem::replace(&mut session.sync, DomSync::connect(doc, body, &self.config));
            old.disconnect(doc);
        } else {
            session.sync.discard_pending(doc);
        }

        Self::rebuild(session, doc, &self.config, &mut self.announcer)?;
        let root = session.sync.root();
        session.live.clear();
        session.live.rescan(doc, root);
        Ok(())
    }

    /// Element under the cursor
    pub fn current_element(&self) -> Option<NodeId> {
        self.session.as_ref()?.buffer.current_node().map(|n| n.element)
    }

    /// Details of the element under the cursor
    pub fn details(&self) -> Option<&ElementDetails> {
        self.session.as_ref()?.details.as_ref()
    }

    pub fn spotlight(&self) -> Option<&Spotlight> {
        self.session.as_ref()?.spotlight.as_ref()
    }

    pub fn panel(&self) -> Option<&DescriptionPanel> {
        self.session.as_ref()?.panel.as_ref()
    }

    pub fn navigation_mode(&self) -> NavigationMode {
        self.session.as_ref().map(|s| s.mode).unwrap_or_default()
    }

    pub fn buffer(&self) -> Option<&VirtualBuffer> {
        self.session.as_ref().map(|s| &s.buffer)
    }

    /// Whether the cursor is inside a dialog entered by navigation
    pub fn in_dialog(&self) -> bool {
        self.session.as_ref().map(|s| s.dialog.is_some()).unwrap_or(false)
    }

    pub fn last_announcement(&self) -> Option<&str> {
        self.announcer.last_announcement()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ally_a11y::{MemorySpeech, SpeechEvent, SpeechLog};
    use ally_dom::DOMRect;

    const PAGE: &str = r#"
        <header>
            <button id="focus-overlay-toggle">Focus mode</button>
            <nav aria-label="Main"><a id="home" href="/">Home</a><a id="catalog" href="/catalog">Catalog</a></nav>
        </header>
        <main id="main">
            <h1 id="title">Catalog</h1>
            <p id="intro" aria-flowto="tools">Intro</p>
            <button id="dark" aria-pressed="false">Dark mode</button>
            <h2 id="guides">Guides</h2>
            <ul id="list"><li><a id="g1" href="/g/1">One</a></li><li><a id="g2" href="/g/2">Two</a></li></ul>
            <div role="dialog" id="dlg" aria-label="Suggest"><input id="url" placeholder="Link"><button id="send">Send</button></div>
            <h2 id="tools">Tools</h2>
            <div id="status" role="status"></div>
        </main>
        <footer><p id="last">Footer</p></footer>
    "#;

    fn setup() -> (Document, FocusOverlay, SpeechLog) {
        let doc = ally_html::parse_with_url(PAGE, "https://ally.example/catalog").unwrap();
        let speech = MemorySpeech::new();
        let log = speech.log();
        let overlay = FocusOverlay::new(OverlayConfig::default(), Box::new(speech));
        (doc, overlay, log)
    }

    fn by_id(doc: &Document, id: &str) -> NodeId {
        doc.get_element_by_id(id).unwrap()
    }

    fn press(overlay: &mut FocusOverlay, doc: &mut Document, event: KeyboardEvent) -> bool {
        let mut event = event;
        let handled = overlay.handle_key(doc, &mut event);
        assert_eq!(handled, event.default_prevented());
        handled
    }

    #[test]
    fn test_activation_anchors_at_toggle() {
        let (mut doc, mut overlay, log) = setup();
        overlay.activate(&mut doc).unwrap();

        assert!(overlay.is_active());
        assert_eq!(overlay.current_element(), Some(by_id(&doc, "focus-overlay-toggle")));
        assert_eq!(log.last_spoken().as_deref(), Some("Focus mode, button"));
        assert_eq!(doc.active_element(), Some(by_id(&doc, "focus-overlay-toggle")));
        assert_eq!(doc.observer_count(), 3);
    }

    #[test]
    fn test_activation_prefers_focused_element() {
        let (mut doc, mut overlay, _) = setup();
        let g2 = by_id(&doc, "g2");
        doc.focus(g2);
        overlay.activate(&mut doc).unwrap();
        assert_eq!(overlay.current_element(), Some(g2));
        assert_eq!(overlay.last_announcement(), Some("Two, link"));
    }

    #[test]
    fn test_activation_falls_back_when_focus_is_hidden() {
        let mut doc = ally_html::parse(
            r#"<button id="focus-overlay-toggle">Focus mode</button>
               <div aria-hidden="true"><button id="muted">Muted</button></div>"#,
        ).unwrap();
        let muted = doc.get_element_by_id("muted").unwrap();
        let toggle = doc.get_element_by_id("focus-overlay-toggle").unwrap();
        doc.focus(muted);

        let mut overlay = FocusOverlay::new(OverlayConfig::default(), Box::new(MemorySpeech::new()));
        overlay.activate(&mut doc).unwrap();
        assert!(overlay.buffer().unwrap().find(muted).is_none());
        assert_eq!(overlay.current_element(), Some(toggle));
        assert!(overlay.spotlight().is_some());
        assert_eq!(overlay.last_announcement(), Some("Focus mode, button"));
    }

    #[test]
    fn test_activation_without_anchor_has_no_spotlight() {
        let mut doc = ally_html::parse("<main><p>Text</p></main>").unwrap();
        let mut overlay = FocusOverlay::new(OverlayConfig::default(), Box::new(MemorySpeech::new()));
        overlay.activate(&mut doc).unwrap();
        assert!(overlay.is_active());
        assert!(overlay.spotlight().is_none());
        assert!(overlay.current_element().is_none());

        // First Tab lands on the root
        assert!(press(&mut overlay, &mut doc, KeyboardEvent::new("Tab")));
        assert_eq!(overlay.current_element(), Some(doc.body()));
    }

    #[test]
    fn test_tab_moves_and_spotlight() {
        let (mut doc, mut overlay, log) = setup();
        let home = by_id(&doc, "home");
        doc.set_layout_rect(home, DOMRect::from_xywh(20.0, 10.0, 60.0, 20.0));
        overlay.activate(&mut doc).unwrap();

        let nav = doc.tree().parent(home);
        assert!(press(&mut overlay, &mut doc, KeyboardEvent::new("Tab")));
        assert_eq!(overlay.current_element(), nav);
        assert!(press(&mut overlay, &mut doc, KeyboardEvent::new("Tab")));
        assert_eq!(overlay.current_element(), Some(home));
        assert_eq!(doc.active_element(), Some(home));
        assert_eq!(overlay.spotlight().unwrap().rect(), DOMRect::from_xywh(12.0, 2.0, 76.0, 36.0));
        assert_eq!(log.last_spoken().as_deref(), Some("Home, link"));

        assert!(press(&mut overlay, &mut doc, KeyboardEvent::new("Tab").with_shift()));
        assert_eq!(overlay.current_element(), nav);
    }

    #[test]
    fn test_unbound_keys_pass_through() {
        let (mut doc, mut overlay, _) = setup();
        let mut event = KeyboardEvent::new("Tab");
        assert!(!overlay.handle_key(&mut doc, &mut event));
        assert!(!event.default_prevented());

        overlay.activate(&mut doc).unwrap();
        assert!(!press(&mut overlay, &mut doc, KeyboardEvent::new("x")));
    }

    #[test]
    fn test_heading_navigation_and_boundary() {
        let (mut doc, mut overlay, log) = setup();
        overlay.activate(&mut doc).unwrap();

        press(&mut overlay, &mut doc, KeyboardEvent::new("h"));
        assert_eq!(overlay.current_element(), Some(by_id(&doc, "title")));
        assert_eq!(log.last_spoken().as_deref(), Some("Catalog, heading level 1, heading 1 of 3"));

        press(&mut overlay, &mut doc, KeyboardEvent::new("h"));
        press(&mut overlay, &mut doc, KeyboardEvent::new("h"));
        let tools = by_id(&doc, "tools");
        assert_eq!(overlay.current_element(), Some(tools));

        let generation = overlay.buffer().unwrap().generation();
        assert!(press(&mut overlay, &mut doc, KeyboardEvent::new("h")));
        assert_eq!(overlay.current_element(), Some(tools));
        assert_eq!(log.last_spoken().as_deref(), Some(END_OF_DOCUMENT));
        assert_eq!(overlay.buffer().unwrap().generation(), generation);

        press(&mut overlay, &mut doc, KeyboardEvent::new("H").with_shift());
        assert_eq!(overlay.current_element(), Some(by_id(&doc, "guides")));
    }

    #[test]
    fn test_end_of_document_keeps_cursor() {
        let (mut doc, mut overlay, log) = setup();
        let last = by_id(&doc, "last");
        doc.set_attribute(last, "tabindex", "-1").unwrap();
        doc.focus(last);
        overlay.activate(&mut doc).unwrap();
        assert_eq!(overlay.current_element(), Some(last));

        let details = overlay.details().cloned();
        press(&mut overlay, &mut doc, KeyboardEvent::new("Tab"));
        assert_eq!(overlay.current_element(), Some(last));
        assert_eq!(overlay.details().cloned(), details);
        assert_eq!(log.last_spoken().as_deref(), Some(END_OF_DOCUMENT));
    }

    #[test]
    fn test_list_navigation() {
        let (mut doc, mut overlay, log) = setup();
        overlay.activate(&mut doc).unwrap();
        press(&mut overlay, &mut doc, KeyboardEvent::new("l"));
        assert_eq!(overlay.current_element(), Some(by_id(&doc, "list")));
        assert_eq!(log.last_spoken().as_deref(), Some("список из 2 элементов"));

        press(&mut overlay, &mut doc, KeyboardEvent::new("Tab"));
        press(&mut overlay, &mut doc, KeyboardEvent::new("Tab"));
        assert_eq!(log.last_spoken().as_deref(), Some("список из 2 элементов, One, link"));
    }

    #[test]
    fn test_state_change_refreshes_without_rebuild() {
        let (mut doc, mut overlay, log) = setup();
        let dark = by_id(&doc, "dark");
        doc.focus(dark);
        overlay.activate(&mut doc).unwrap();
        assert!(overlay.details().unwrap().states.contains(&"not pressed".to_string()));
        let generation = overlay.buffer().unwrap().generation();

        doc.set_attribute(dark, "aria-pressed", "true").unwrap();
        let outcome = overlay.process_mutations(&mut doc);

        assert!(outcome.state_refreshed);
        assert!(!outcome.rebuilt);
        assert_eq!(overlay.buffer().unwrap().generation(), generation);
        assert_eq!(overlay.details().unwrap().states, vec!["pressed".to_string()]);
        assert_eq!(log.last_spoken().as_deref(), Some("Dark mode, button, pressed"));
    }

    #[test]
    fn test_state_change_elsewhere_is_ignored() {
        let (mut doc, mut overlay, log) = setup();
        overlay.activate(&mut doc).unwrap();
        let spoken = log.spoken().len();

        let dark = by_id(&doc, "dark");
        doc.set_attribute(dark, "aria-pressed", "true").unwrap();
        let outcome = overlay.process_mutations(&mut doc);
        assert_eq!(outcome, SyncOutcome::default());
        assert_eq!(log.spoken().len(), spoken);
    }

    #[test]
    fn test_significant_mutation_rebuilds() {
        let (mut doc, mut overlay, _) = setup();
        overlay.activate(&mut doc).unwrap();
        let generation = overlay.buffer().unwrap().generation();

        let main = by_id(&doc, "main");
        let item = doc.create_element("li");
        let list = by_id(&doc, "list");
        doc.append_child(list, item).unwrap();
        assert!(!overlay.process_mutations(&mut doc).rebuilt);

        let section = doc.create_element("section");
        let heading = doc.create_element("h2");
        let text = doc.create_text("News");
        doc.append_child(heading, text).unwrap();
        doc.append_child(section, heading).unwrap();
        doc.append_child(main, section).unwrap();

        let outcome = overlay.process_mutations(&mut doc);
        assert!(outcome.rebuilt);
        let buffer = overlay.buffer().unwrap();
        assert_eq!(buffer.generation(), generation + 1);
        assert!(buffer.find(heading).is_some());
        assert_eq!(overlay.current_element(), Some(by_id(&doc, "focus-overlay-toggle")));
    }

    #[test]
    fn test_rebuild_reanchors_at_toggle_when_focus_vanished() {
        let (mut doc, mut overlay, _) = setup();
        let g1 = by_id(&doc, "g1");
        doc.focus(g1);
        overlay.activate(&mut doc).unwrap();

        let list = by_id(&doc, "list");
        let main = by_id(&doc, "main");
        doc.remove_child(main, list).unwrap();
        let article = doc.create_element("article");
        doc.append_child(main, article).unwrap();

        assert!(overlay.process_mutations(&mut doc).rebuilt);
        assert_eq!(overlay.current_element(), Some(by_id(&doc, "focus-overlay-toggle")));
    }

    #[test]
    fn test_live_region_announcement() {
        let (mut doc, mut overlay, log) = setup();
        overlay.activate(&mut doc).unwrap();

        let status = by_id(&doc, "status");
        let text = doc.create_text("Resource saved");
        doc.append_child(status, text).unwrap();

        let outcome = overlay.process_mutations(&mut doc);
        assert_eq!(outcome.live_announcements, 1);
        assert!(!outcome.rebuilt);
        assert_eq!(log.last_spoken().as_deref(), Some("Resource saved"));
    }

    #[test]
    fn test_failing_state_sync_keeps_live_sync() {
        let (mut doc, mut overlay, log) = setup();
        let dark = by_id(&doc, "dark");
        doc.focus(dark);
        overlay.activate(&mut doc).unwrap();

        // Toggled, then removed before the flush
        doc.set_attribute(dark, "aria-pressed", "true").unwrap();
        let main = by_id(&doc, "main");
        doc.remove_child(main, dark).unwrap();
        let status = by_id(&doc, "status");
        let text = doc.create_text("Saved");
        doc.append_child(status, text).unwrap();

        let outcome = overlay.process_mutations(&mut doc);
        assert!(!outcome.state_refreshed);
        assert!(!outcome.rebuilt);
        assert_eq!(outcome.live_announcements, 1);
        assert_eq!(log.last_spoken().as_deref(), Some("Saved"));
        assert!(overlay.is_active());
    }

    #[test]
    fn test_detached_root_is_survivable() {
        let (mut doc, mut overlay, _) = setup();
        overlay.activate(&mut doc).unwrap();
        let generation = overlay.buffer().unwrap().generation();
        let current = overlay.current_element();

        let body = doc.body();
        let html = doc.tree().parent(body).unwrap();
        let main = by_id(&doc, "main");
        let section = doc.create_element("section");
        doc.append_child(main, section).unwrap();
        doc.remove_child(html, body).unwrap();

        assert_eq!(overlay.process_mutations(&mut doc), SyncOutcome::default());
        assert!(overlay.is_active());
        assert_eq!(overlay.buffer().unwrap().generation(), generation);
        assert_eq!(overlay.current_element(), current);

        // Observers keep working once the root is back
        doc.append_child(html, body).unwrap();
        let article = doc.create_element("article");
        doc.append_child(main, article).unwrap();
        let outcome = overlay.process_mutations(&mut doc);
        assert!(outcome.rebuilt);
        assert_eq!(overlay.buffer().unwrap().generation(), generation + 1);
    }

    #[test]
    fn test_dialog_escape_returns_to_entry_point() {
        let (mut doc, mut overlay, _) = setup();
        let g2 = by_id(&doc, "g2");
        doc.focus(g2);
        overlay.activate(&mut doc).unwrap();

        press(&mut overlay, &mut doc, KeyboardEvent::new("d"));
        assert_eq!(overlay.current_element(), Some(by_id(&doc, "dlg")));
        assert!(overlay.in_dialog());

        press(&mut overlay, &mut doc, KeyboardEvent::new("Tab"));
        assert_eq!(overlay.current_element(), Some(by_id(&doc, "url")));
        assert!(overlay.in_dialog());

        assert!(press(&mut overlay, &mut doc, KeyboardEvent::new("Escape")));
        assert!(overlay.is_active());
        assert!(!overlay.in_dialog());
        assert_eq!(overlay.current_element(), Some(g2));

        assert!(press(&mut overlay, &mut doc, KeyboardEvent::new("Escape")));
        assert!(!overlay.is_active());
    }

    #[test]
    fn test_leaving_dialog_by_tab_clears_context() {
        let (mut doc, mut overlay, _) = setup();
        let send = by_id(&doc, "send");
        doc.focus(send);
        overlay.activate(&mut doc).unwrap();
        assert!(overlay.in_dialog());

        press(&mut overlay, &mut doc, KeyboardEvent::new("Tab"));
        assert_eq!(overlay.current_element(), Some(by_id(&doc, "tools")));
        assert!(!overlay.in_dialog());
    }

    #[test]
    fn test_flow_target() {
        let (mut doc, mut overlay, _) = setup();
        overlay.activate(&mut doc).unwrap();
        press(&mut overlay, &mut doc, KeyboardEvent::new("h"));
        press(&mut overlay, &mut doc, KeyboardEvent::new("Tab"));
        assert_eq!(overlay.current_element(), Some(by_id(&doc, "intro")));
        assert!(overlay.details().unwrap().shortcuts.iter().any(|s| s.starts_with("F1")));

        press(&mut overlay, &mut doc, KeyboardEvent::new("F1"));
        assert_eq!(overlay.current_element(), Some(by_id(&doc, "tools")));

        // No flow target: key consumed, cursor stays
        assert!(press(&mut overlay, &mut doc, KeyboardEvent::new("ArrowRight").with_alt()));
        assert_eq!(overlay.current_element(), Some(by_id(&doc, "tools")));
    }

    #[test]
    fn test_f6_toggles_mode_only() {
        let (mut doc, mut overlay, log) = setup();
        overlay.activate(&mut doc).unwrap();
        let current = overlay.current_element();

        press(&mut overlay, &mut doc, KeyboardEvent::new("F6"));
        assert_eq!(overlay.navigation_mode(), NavigationMode::Landmarks);
        assert_eq!(overlay.current_element(), current);
        assert_eq!(overlay.panel().unwrap().row("Mode"), Some("Landmarks"));
        assert_eq!(log.last_spoken().as_deref(), Some("Landmarks mode"));

        press(&mut overlay, &mut doc, KeyboardEvent::new("F6"));
        assert_eq!(overlay.navigation_mode(), NavigationMode::Elements);
    }

    #[test]
    fn test_scroll_lock_round_trip() {
        let (mut doc, mut overlay, _) = setup();
        doc.scroll_to(0.0, 640.0);
        let body = doc.body();

        overlay.activate(&mut doc).unwrap();
        assert_eq!(doc.style_property(body, "position").as_deref(), Some("fixed"));
        assert_eq!(doc.style_property(body, "top").as_deref(), Some("-640px"));

        overlay.deactivate(&mut doc).unwrap();
        assert_eq!(doc.scroll_y(), 640.0);
        assert_eq!(doc.style_property(body, "position"), None);
    }

    #[test]
    fn test_deactivation_undoes_everything() {
        let (mut doc, mut overlay, log) = setup();
        let g1 = by_id(&doc, "g1");
        doc.focus(g1);
        overlay.activate(&mut doc).unwrap();
        assert_eq!(doc.observer_count(), 3);

        overlay.deactivate(&mut doc).unwrap();
        assert!(!overlay.is_active());
        assert_eq!(doc.observer_count(), 0);
        assert_eq!(log.events().last(), Some(&SpeechEvent::Stop));
        assert_eq!(doc.active_element(), Some(by_id(&doc, "focus-overlay-toggle")));
        assert!(overlay.buffer().is_none());
        assert!(overlay.spotlight().is_none());

        // Idempotent
        overlay.deactivate(&mut doc).unwrap();
    }

    #[test]
    fn test_toggle() {
        let (mut doc, mut overlay, _) = setup();
        assert!(overlay.toggle(&mut doc).unwrap());
        assert!(!overlay.toggle(&mut doc).unwrap());
        assert_eq!(doc.observer_count(), 0);
    }

    #[test]
    fn test_speech_failure_keeps_visuals() {
        let (mut doc, mut overlay, log) = setup();
        log.set_failing(true);
        overlay.activate(&mut doc).unwrap();
        press(&mut overlay, &mut doc, KeyboardEvent::new("h"));
        assert_eq!(overlay.current_element(), Some(by_id(&doc, "title")));
        assert!(overlay.spotlight().is_some());
        assert!(log.spoken().is_empty());
    }

    #[test]
    fn test_route_change_rebuilds() {
        let (mut doc, mut overlay, _) = setup();
        overlay.activate(&mut doc).unwrap();
        let generation = overlay.buffer().unwrap().generation();

        let main = by_id(&doc, "main");
        let title = by_id(&doc, "title");
        doc.remove_child(main, title).unwrap();
        doc.navigate("/articles").unwrap();
        overlay.on_route_change(&mut doc).unwrap();

        let buffer = overlay.buffer().unwrap();
        assert_eq!(buffer.generation(), generation + 1);
        assert!(buffer.find(title).is_none());
        assert_eq!(overlay.current_element(), Some(by_id(&doc, "focus-overlay-toggle")));
        assert_eq!(overlay.process_mutations(&mut doc), SyncOutcome::default());
    }
}
