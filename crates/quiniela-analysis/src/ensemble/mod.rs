//! Ensemble policy: strategy weights, data-quality adjustment, validation,
//! weighted combination, and the fallback chain.

pub mod combiner;
pub mod fallback;
pub mod quality;
pub mod report;
pub mod service;
pub mod strategy;

pub use combiner::{Candidate, ComponentScore};
pub use quality::{adjust_weights, DataQuality, WindowProfile};
pub use report::{
    ComponentReport, ConfidenceLevel, OutcomeStatus, Prediction, PredictionOutcome,
    PredictionStatistics,
};
pub use service::PredictionService;
pub use strategy::{ComponentWeights, Strategy};
