use crate::field::FieldKind;
use thiserror::Error;

/// Crate specific Errors implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CronError {
    /// Schedule string is empty or contains whitespaces only.
    #[error("empty schedule pattern")]
    EmptyInput,
    /// Schedule has a number of fields other than five.
    #[error("schedule should have exactly 5 fields, but {0} provided")]
    FieldCount(usize),
    /// Field has no valid values after expansion.
    #[error("{field} pattern '{input}' has no valid values")]
    EmptyExpansion {
        /// Field the pattern belongs to.
        field: FieldKind,
        /// Raw field pattern.
        input: String,
    },
    /// Field contains something which is neither a number nor a known name.
    #[error("invalid {field} value: '{input}'")]
    InvalidCharacter {
        /// Field the pattern belongs to.
        field: FieldKind,
        /// Offending part of the pattern.
        input: String,
    },
    /// Range bounds are in descending order.
    #[error("invalid {field} range: '{input}'")]
    InvalidRange {
        /// Field the pattern belongs to.
        field: FieldKind,
        /// Offending part of the pattern.
        input: String,
    },
    /// Step value is missing, zero or not a number.
    #[error("invalid {field} step: '{input}'")]
    InvalidStep {
        /// Field the pattern belongs to.
        field: FieldKind,
        /// Offending part of the pattern.
        input: String,
    },
    /// No matching time was found before the end of the search window.
    #[error("no matching time up to the end of year {limit}")]
    SearchRangeExceeded {
        /// Last year of the search window.
        limit: i32,
    },
    /// Week day was not found within seven consecutive days.
    #[error("unable to find day of week {0} within a week")]
    WeekdaySearchExhausted(u16),
}
