//! EventDispatcher: synchronous fan-out to registered handlers.

use std::sync::Arc;

use super::handler::QuinielaEventHandler;
use super::types::*;

/// Synchronous event dispatcher wrapping a list of handlers.
///
/// A panicking handler is logged and does not stop later handlers.
#[derive(Default, Clone)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn QuinielaEventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn QuinielaEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    fn emit<F: Fn(&dyn QuinielaEventHandler)>(&self, event_name: &'static str, f: F) {
        for handler in &self.handlers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(handler.as_ref());
            }));
            if result.is_err() {
                tracing::error!(event = event_name, "event handler panicked");
            }
        }
    }

    pub fn emit_draw_saved(&self, event: &DrawSavedEvent) {
        self.emit("draw_saved", |h| h.on_draw_saved(event));
    }

    pub fn emit_batch_started(&self, event: &BatchStartedEvent) {
        self.emit("batch_started", |h| h.on_batch_started(event));
    }

    pub fn emit_detector_finished(&self, event: &DetectorFinishedEvent) {
        self.emit("detector_finished", |h| h.on_detector_finished(event));
    }

    pub fn emit_pattern_persist_failed(&self, event: &PatternPersistFailedEvent) {
        self.emit("pattern_persist_failed", |h| h.on_pattern_persist_failed(event));
    }

    pub fn emit_batch_complete(&self, event: &BatchCompleteEvent) {
        self.emit("batch_complete", |h| h.on_batch_complete(event));
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
