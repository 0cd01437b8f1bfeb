//! Reschedule validation.
//!
//! A reschedule may move a booking anywhere in the calendar, but the new span
//! must cover exactly as many days as the one that was paid for.

use crate::error::{AppError, Result};
use crate::pricing::calculators::compute_duration;
use crate::pricing::models::DateRange;

#[derive(Debug, Clone, Copy, Default)]
pub struct RescheduleValidator;

impl RescheduleValidator {
    /// Check `proposed` against `original`.
    ///
    /// Fails with `InvalidRange` when the proposed end precedes its start, and
    /// with `DurationMismatch` when the day counts differ.
    pub fn validate(original: DateRange, proposed: DateRange) -> Result<()> {
        let actual = compute_duration(proposed)?;
        let expected = compute_duration(original)?;
        if actual != expected {
            return Err(AppError::DurationMismatch { expected, actual });
        }
        Ok(())
    }
}
