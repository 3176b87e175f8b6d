//! Event handler trait. Every method defaults to a no-op.

use super::types::*;

/// Receives engine and storage lifecycle events.
pub trait QuinielaEventHandler: Send + Sync {
    fn on_draw_saved(&self, _event: &DrawSavedEvent) {}
    fn on_batch_started(&self, _event: &BatchStartedEvent) {}
    fn on_detector_finished(&self, _event: &DetectorFinishedEvent) {}
    fn on_pattern_persist_failed(&self, _event: &PatternPersistFailedEvent) {}
    fn on_batch_complete(&self, _event: &BatchCompleteEvent) {}
}
