use thiserror::Error;
use uuid::Uuid;

use crate::models::ReviewRecord;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid review {record_id}: {reason}")]
    InvalidInput { record_id: Uuid, reason: String },
    #[error("conflicting trend configuration: {0}")]
    ConfigConflict(String),
}

impl EngineError {
    pub fn invalid(record: &ReviewRecord, reason: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            record_id: record.id,
            reason: reason.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Division that never leaks NaN or infinity: zero denominators and
/// non-finite quotients collapse to 0.
pub fn guarded_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Ratings may sit outside 0..=5, but must be real numbers.
pub(crate) fn checked_rating(record: &ReviewRecord) -> EngineResult<f64> {
    if record.rating.is_finite() {
        Ok(record.rating)
    } else {
        Err(EngineError::invalid(record, "rating is not a finite number"))
    }
}
