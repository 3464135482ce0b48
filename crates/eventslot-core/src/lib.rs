//! Core types: calendar math, recurrence rules, occurrence expansion, slots

pub mod error;
pub mod occurrence;
pub mod recurrence;
pub mod slot;
pub mod time;
pub mod tracing;

pub use error::{CoreError, CoreResult};
pub use occurrence::Occurrences;
pub use recurrence::{
    FOREVER_HORIZON_YEARS, MonthlyRecurrenceType, RecurrenceDuration, RecurrenceFrequency,
    RecurrenceRule, WeekdaySet,
};
pub use slot::{
    AnchorSpan, DaySpan, Event, EventDetails, Slot, SlotIter, SlotSpan, TimedSpan, expand, slots,
};
pub use time::{DurationUnit, TimeWindow, YearMonth};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
