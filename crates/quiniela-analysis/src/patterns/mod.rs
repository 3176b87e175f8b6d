//! Typed pattern payloads and their storage encoding.
//!
//! Each detector kind has its own signature, parameter and per-number detail
//! variant. All three enums carry a `type` discriminator so the stored JSON
//! can be decoded back without knowing the producing detector.

pub mod detected;
pub mod details;
pub mod signature;

pub use detected::{DetectedPattern, DetectedScore};
pub use details::{PatternParams, ScoreDetails, WeekdayDeviation};
pub use signature::PatternSignature;
