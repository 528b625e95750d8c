//! Speech Output
//!
//! Seam between the overlay and a speech engine. The overlay speaks one
//! utterance at a time: every announcement stops whatever is playing
//! before the new text starts.

use std::cell::RefCell;
use std::rc::Rc;

/// Speech engine error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("Speech engine unavailable")]
    Unavailable,
}

/// Speech engine
pub trait SpeechOutput {
    /// Start speaking `text`
    fn speak(&mut self, text: &str) -> Result<(), SpeechError>;

    /// Cancel the active utterance, if any
    fn stop(&mut self);

    /// Engine name for diagnostics
    fn name(&self) -> &'static str;
}

/// Engine that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSpeech;

impl SpeechOutput for NullSpeech {
    fn speak(&mut self, _text: &str) -> Result<(), SpeechError> {
        Ok(())
    }

    fn stop(&mut self) {}

    fn name(&self) -> &'static str {
        "null"
    }
}

/// Call recorded by [`MemorySpeech`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Speak(String),
    Stop,
}

#[derive(Debug, Default)]
struct SpeechLogInner {
    events: Vec<SpeechEvent>,
    failing: bool,
}

/// Shared view of a [`MemorySpeech`] log
#[derive(Debug, Clone, Default)]
pub struct SpeechLog(Rc<RefCell<SpeechLogInner>>);

impl SpeechLog {
    /// Every call in order
    pub fn events(&self) -> Vec<SpeechEvent> {
        self.0.borrow().events.clone()
    }

    /// Spoken texts in order
    pub fn spoken(&self) -> Vec<String> {
        self.0.borrow().events.iter()
            .filter_map(|e| match e {
                SpeechEvent::Speak(text) => Some(text.clone()),
                SpeechEvent::Stop => None,
            })
            .collect()
    }

    pub fn last_spoken(&self) -> Option<String> {
        self.spoken().pop()
    }

    pub fn stop_count(&self) -> usize {
        self.0.borrow().events.iter().filter(|e| **e == SpeechEvent::Stop).count()
    }

    /// Make `speak` fail with [`SpeechError::Unavailable`]
    pub fn set_failing(&self, failing: bool) {
        self.0.borrow_mut().failing = failing;
    }

    pub fn clear(&self) {
        self.0.borrow_mut().events.clear();
    }
}

/// In-memory engine for tests and headless hosts
#[derive(Debug, Clone, Default)]
pub struct MemorySpeech {
    log: SpeechLog,
}

impl MemorySpeech {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that stays readable after the engine is boxed away
    pub fn log(&self) -> SpeechLog {
        self.log.clone()
    }
}

impl SpeechOutput for MemorySpeech {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        let mut inner = self.log.0.borrow_mut();
        if inner.failing {
            return Err(SpeechError::Unavailable);
        }
        inner.events.push(SpeechEvent::Speak(text.to_string()));
        Ok(())
    }

    fn stop(&mut self) {
        self.log.0.borrow_mut().events.push(SpeechEvent::Stop);
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Stop-then-speak wrapper; failures are logged, never returned
pub struct Announcer {
    output: Box<dyn SpeechOutput>,
    last: Option<String>,
}

impl std::fmt::Debug for Announcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Announcer")
            .field("output", &self.output.name())
            .field("last", &self.last)
            .finish()
    }
}

impl Announcer {
    pub fn new(output: Box<dyn SpeechOutput>) -> Self {
        Self { output, last: None }
    }

    /// Pre-empt the active utterance and speak `text`. Returns whether
    /// the engine accepted it.
    pub fn announce(&mut self, text: &str) -> bool {
        self.output.stop();
        self.last = Some(text.to_string());
        match self.output.speak(text) {
            Ok(()) => {
                tracing::debug!(engine = self.output.name(), "announce: {}", text);
                true
            }
            Err(e) => {
                tracing::warn!(engine = self.output.name(), "Speech failed: {}", e);
                false
            }
        }
    }

    /// Cancel the active utterance
    pub fn stop(&mut self) {
        self.output.stop();
    }

    /// Last text handed to the engine
    pub fn last_announcement(&self) -> Option<&str> {
        self.last.as_deref()
    }
}
