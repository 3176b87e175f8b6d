//! Draw records and frequency rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;

/// Numbers are drawn from `0..NUMBER_COUNT`.
pub const NUMBER_COUNT: usize = 100;

/// Positions run from 1 to `MAX_POSITION` inclusive.
pub const MAX_POSITION: u8 = 3;

/// One recorded result for a date and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Draw {
    pub date: NaiveDate,
    pub number: u8,
    pub position: u8,
}

impl Draw {
    /// Build a validated draw.
    pub fn new(date: NaiveDate, number: u8, position: u8) -> Result<Self, StorageError> {
        if usize::from(number) >= NUMBER_COUNT {
            return Err(StorageError::InvalidRecord {
                message: format!("number {number} outside 0..{NUMBER_COUNT}"),
            });
        }
        if position == 0 || position > MAX_POSITION {
            return Err(StorageError::InvalidRecord {
                message: format!("position {position} outside 1..={MAX_POSITION}"),
            });
        }
        Ok(Self {
            date,
            number,
            position,
        })
    }
}

/// Result of an idempotent draw write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveOutcome {
    Inserted,
    Duplicate,
}

/// Appearance count of one number over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumberFrequency {
    pub number: u8,
    /// Absolute appearances in the window.
    pub count: u32,
    /// Appearances divided by distinct draw dates in the window.
    pub relative: f64,
}
