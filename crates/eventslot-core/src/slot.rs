//! Events and the slots they expand into.
//!
//! An [`Event`] carries an anchor span (its first occurrence), a
//! [`RecurrenceRule`] and the [`EventDetails`] shared by every occurrence.
//! [`slots`] walks the rule's occurrence dates and materializes one [`Slot`]
//! per date:
//! - timed events keep the anchor's local wall time in the start zone and the
//!   anchor's length in minutes, so a 09:00 meeting stays at 09:00 across DST
//! - day events keep the anchor's length in days

use std::collections::BTreeSet;
use std::iter::FusedIterator;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::occurrence::Occurrences;
use crate::recurrence::RecurrenceRule;
use crate::time::{DurationUnit, TimeWindow, from_utc, parse_zone, to_utc, zone_aware_duration};

/// Fields shared verbatim by every slot of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    pub title: String,
    pub location: Option<String>,
    pub description: Option<String>,
    /// Guest e-mail addresses, kept sorted and unique.
    #[serde(default)]
    pub guest_emails: BTreeSet<String>,
}

impl EventDetails {
    /// Creates details with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_guest(mut self, email: impl Into<String>) -> Self {
        self.guest_emails.insert(email.into());
        self
    }
}

/// A whole-day anchor, `end` inclusive of the last day's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DaySpan {
    /// Number of days between start and end.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// A timed anchor whose endpoints are wall-clock times in their own zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedSpan {
    pub start: NaiveDateTime,
    pub start_zone: Tz,
    pub end: NaiveDateTime,
    pub end_zone: Tz,
}

impl TimedSpan {
    /// Creates a timed span from IANA zone identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownZone`] if either zone is unknown.
    pub fn new(
        start: NaiveDateTime,
        start_zone: &str,
        end: NaiveDateTime,
        end_zone: &str,
    ) -> CoreResult<Self> {
        Ok(Self {
            start,
            start_zone: parse_zone(start_zone)?,
            end,
            end_zone: parse_zone(end_zone)?,
        })
    }

    /// Creates a timed span with both endpoints in the same zone.
    pub fn in_zone(start: NaiveDateTime, end: NaiveDateTime, zone: Tz) -> Self {
        Self {
            start,
            start_zone: zone,
            end,
            end_zone: zone,
        }
    }

    /// Length of the span in whole minutes, measured between UTC instants.
    pub fn minutes(&self) -> CoreResult<i64> {
        zone_aware_duration(
            self.start,
            self.start_zone,
            self.end,
            self.end_zone,
            DurationUnit::Minutes,
        )
    }
}

/// The first occurrence of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnchorSpan {
    Day(DaySpan),
    Timed(TimedSpan),
}

impl AnchorSpan {
    /// The date recurrence is anchored on, local to the start zone for
    /// timed spans.
    pub fn start_date(&self) -> NaiveDate {
        match self {
            Self::Day(span) => span.start,
            Self::Timed(span) => span.start.date(),
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Day(_))
    }
}

/// A recurring event definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub span: AnchorSpan,
    pub rule: RecurrenceRule,
    pub details: EventDetails,
}

impl Event {
    /// Creates an event with a fresh random id.
    pub fn new(span: AnchorSpan, rule: RecurrenceRule, details: EventDetails) -> Self {
        Self {
            id: Uuid::new_v4(),
            span,
            rule,
            details,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Returns true if `other` expands to the same dates and times, ignoring
    /// details.
    pub fn same_schedule(&self, other: &Event) -> bool {
        self.span == other.span && self.rule == other.rule
    }

    /// Lazily materializes this event's slots.
    pub fn slots(&self) -> SlotIter<'_> {
        slots(self)
    }
}

/// Where a single slot sits in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotSpan {
    Day {
        start: NaiveDate,
        end: NaiveDate,
    },
    Timed {
        start: DateTime<Utc>,
        start_zone: Tz,
        end: DateTime<Utc>,
        end_zone: Tz,
    },
}

impl SlotSpan {
    /// The instant slots are ordered and range-queried by.
    ///
    /// Day slots start at midnight UTC of their start date.
    pub fn start_instant(&self) -> DateTime<Utc> {
        match self {
            Self::Day { start, .. } => start.and_time(NaiveTime::MIN).and_utc(),
            Self::Timed { start, .. } => *start,
        }
    }

    /// Start as wall-clock time in the slot's start zone.
    pub fn local_start(&self) -> NaiveDateTime {
        match self {
            Self::Day { start, .. } => start.and_time(NaiveTime::MIN),
            Self::Timed {
                start, start_zone, ..
            } => from_utc(*start, *start_zone),
        }
    }

    /// End as wall-clock time in the slot's end zone.
    pub fn local_end(&self) -> NaiveDateTime {
        match self {
            Self::Day { end, .. } => end.and_time(NaiveTime::MIN),
            Self::Timed { end, end_zone, .. } => from_utc(*end, *end_zone),
        }
    }

    /// Length of the slot: whole days for day slots, exact for timed ones.
    pub fn duration(&self) -> Duration {
        match self {
            Self::Day { start, end } => *end - *start,
            Self::Timed { start, end, .. } => *end - *start,
        }
    }

    /// Checks whether the slot starts inside `window`.
    pub fn starts_within(&self, window: &TimeWindow) -> bool {
        window.contains(self.start_instant())
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Day { .. })
    }
}

/// One materialized occurrence of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub event_id: Uuid,
    pub span: SlotSpan,
    pub details: EventDetails,
}

/// How each occurrence date becomes a span, fixed once per event.
#[derive(Debug, Clone, Copy)]
enum Template {
    Day {
        days: Duration,
    },
    Timed {
        time: NaiveTime,
        start_zone: Tz,
        end_zone: Tz,
        length: Duration,
    },
}

impl Template {
    fn of(span: &AnchorSpan) -> CoreResult<Self> {
        Ok(match span {
            AnchorSpan::Day(day) => Self::Day {
                days: Duration::days(day.days()),
            },
            AnchorSpan::Timed(timed) => Self::Timed {
                time: timed.start.time(),
                start_zone: timed.start_zone,
                end_zone: timed.end_zone,
                length: Duration::minutes(timed.minutes()?),
            },
        })
    }

    fn span_on(self, date: NaiveDate) -> CoreResult<SlotSpan> {
        match self {
            Self::Day { days } => {
                let end = date.checked_add_signed(days).ok_or_else(|| {
                    CoreError::date_out_of_range(format!("{date} + {} days", days.num_days()))
                })?;
                Ok(SlotSpan::Day { start: date, end })
            }
            Self::Timed {
                time,
                start_zone,
                end_zone,
                length,
            } => {
                let start = to_utc(date.and_time(time), start_zone)?;
                let end = start.checked_add_signed(length).ok_or_else(|| {
                    CoreError::date_out_of_range(format!(
                        "{start} + {} minutes",
                        length.num_minutes()
                    ))
                })?;
                Ok(SlotSpan::Timed {
                    start,
                    start_zone,
                    end,
                    end_zone,
                })
            }
        }
    }
}

/// Lazy iterator over an event's slots.
///
/// Yields at most one error, after which it is exhausted.
#[derive(Debug, Clone)]
pub struct SlotIter<'a> {
    event: &'a Event,
    occurrences: Occurrences,
    template: Result<Template, CoreError>,
    failed: bool,
}

impl Iterator for SlotIter<'_> {
    type Item = CoreResult<Slot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let template = match &self.template {
            Ok(template) => *template,
            Err(err) => {
                self.failed = true;
                return Some(Err(err.clone()));
            }
        };

        let date = self.occurrences.next()?;
        match template.span_on(date) {
            Ok(span) => Some(Ok(Slot {
                event_id: self.event.id,
                span,
                details: self.event.details.clone(),
            })),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for SlotIter<'_> {}

/// Lazily materializes the slots of `event`, in chronological order.
///
/// # Panics
///
/// The first call panics if the event's rule is weekly and its day set does
/// not contain the anchor's weekday.
pub fn slots(event: &Event) -> SlotIter<'_> {
    let anchor = event.span.start_date();
    debug!(
        event_id = %event.id,
        frequency = %event.rule.frequency(),
        %anchor,
        weekday = %anchor.weekday(),
        "expanding event"
    );
    SlotIter {
        event,
        occurrences: Occurrences::new(anchor, &event.rule),
        template: Template::of(&event.span),
        failed: false,
    }
}

/// Materializes every slot of `event`.
///
/// # Errors
///
/// Fails if any occurrence cannot be converted to UTC or leaves chrono's
/// date range. No partial result is returned.
pub fn expand(event: &Event) -> CoreResult<Vec<Slot>> {
    let slots = slots(event).collect::<CoreResult<Vec<_>>>()?;
    debug!(event_id = %event.id, count = slots.len(), "expanded event");
    Ok(slots)
}
