//! Core error types.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while converting times or materializing slots.
///
/// Rule shape problems are not represented here: a rule reaching the engine
/// is assumed valid, and violations are treated as programming errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The zone identifier is not a known IANA timezone.
    #[error("unknown timezone: {zone}")]
    UnknownZone { zone: String },

    /// A local date-time could not be mapped to an instant in its zone.
    #[error("local time {local} cannot be resolved in {zone}")]
    UnresolvableLocalTime { local: NaiveDateTime, zone: String },

    /// Date arithmetic left chrono's supported range.
    #[error("date out of range: {what}")]
    DateOutOfRange { what: String },

    /// A time window whose start is after its end once both are in UTC.
    #[error("window start {start} is after its end {end}")]
    ReversedWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl CoreError {
    /// Creates an unknown zone error.
    pub fn unknown_zone(zone: impl Into<String>) -> Self {
        Self::UnknownZone { zone: zone.into() }
    }

    /// Creates a date out of range error.
    pub fn date_out_of_range(what: impl Into<String>) -> Self {
        Self::DateOutOfRange { what: what.into() }
    }

    /// Returns true if this error comes from zone configuration rather than
    /// from the date values themselves.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::UnknownZone { .. })
    }
}
