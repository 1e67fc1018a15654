//! Forcing data errors.

use chrono::NaiveDate;
use thiserror::Error;

use crate::quantity::{ForcingKind, QuantityKind, Unit};

/// Result type for forcing data operations.
pub type ForcingResult<T> = Result<T, ForcingError>;

/// Errors in the shape of the forcing data itself.
///
/// Unfillable gaps are not errors; they are reported through
/// [`crate::FillOutcome::Aborted`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForcingError {
    /// Two observations of one quantity share a date.
    #[error("Duplicate {kind} observation for {date}")]
    DuplicateDate { kind: QuantityKind, date: NaiveDate },

    /// Observation unit does not match the quantity.
    #[error("Unit mismatch for {kind}: expected {expected}, found {found}")]
    UnitMismatch {
        kind: QuantityKind,
        expected: Unit,
        found: Unit,
    },

    /// Observation does not belong to the series being built.
    #[error("{found} observation cannot be part of a {kind} series")]
    WrongQuantity {
        kind: ForcingKind,
        found: QuantityKind,
    },

    /// Value type does not match the series kind.
    #[error("Value shape does not match a {kind} series at {date}")]
    ValueShape { kind: ForcingKind, date: NaiveDate },

    /// Series date range is empty or reversed.
    #[error("Empty date range for {kind}: {start} to {end}")]
    EmptyRange {
        kind: ForcingKind,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// Non-finite observation value.
    #[error("Non-finite {kind} value at {date}")]
    NonFinite { kind: QuantityKind, date: NaiveDate },

    /// Filled series could not be written.
    #[error("Failed to write {kind} forcing file: {message}")]
    Write { kind: ForcingKind, message: String },
}
