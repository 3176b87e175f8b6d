//! Event payloads.

use chrono::NaiveDate;

use crate::types::PatternKind;

/// Payload for `on_draw_saved`. Emitted only for new rows, after commit.
#[derive(Debug, Clone)]
pub struct DrawSavedEvent {
    pub date: NaiveDate,
    pub number: u8,
    pub position: u8,
}

/// Payload for `on_batch_started`.
#[derive(Debug, Clone)]
pub struct BatchStartedEvent {
    pub batch_id: String,
    pub window_days: u32,
    pub stale_deactivated: usize,
}

/// How a detector run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorRunStatus {
    Detected,
    InsufficientData,
    Failed,
}

/// Payload for `on_detector_finished`.
#[derive(Debug, Clone)]
pub struct DetectorFinishedEvent {
    pub batch_id: String,
    pub kind: PatternKind,
    pub status: DetectorRunStatus,
    pub patterns: usize,
    pub duration_ms: u64,
}

/// Payload for `on_pattern_persist_failed`.
#[derive(Debug, Clone)]
pub struct PatternPersistFailedEvent {
    pub batch_id: String,
    pub kind: PatternKind,
    pub signature: String,
    pub message: String,
}

/// Payload for `on_batch_complete`.
#[derive(Debug, Clone)]
pub struct BatchCompleteEvent {
    pub batch_id: String,
    pub window_days: u32,
    pub persisted: usize,
    pub failed: usize,
    pub duration_ms: u64,
}
