//! Event definition files.
//!
//! An event file is a TOML document describing one recurring event. Dates
//! and times are quoted strings; a bare date makes a whole-day event:
//!
//! ```toml
//! title = "Standup"
//! location = "Room 4"
//! guests = ["ana@example.com"]
//! start = "2024-09-02T09:00:00"
//! end = "2024-09-02T09:15:00"
//! zone = "America/New_York"
//!
//! [recurrence]
//! frequency = "weekly"
//! days = ["Mon", "Wed"]
//! duration = { n_occurrences = 3 }
//! ```
//!
//! `end_zone` defaults to `zone`. Without a `[recurrence]` table the event
//! happens once.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use eventslot_core::{
    AnchorSpan, DaySpan, Event, EventDetails, RecurrenceDuration, RecurrenceRule, TimedSpan,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};

/// A start or end value: a date-time for timed events, a date for day
/// events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Moment {
    Timed(NaiveDateTime),
    Day(NaiveDate),
}

fn never() -> RecurrenceRule {
    RecurrenceRule::Never
}

/// The on-disk shape of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventFile {
    /// Fixed id; a random one is generated when absent.
    pub id: Option<Uuid>,
    pub title: String,
    pub location: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub guests: BTreeSet<String>,
    pub start: Moment,
    pub end: Moment,
    /// IANA zone of `start`; required for timed events.
    pub zone: Option<String>,
    pub end_zone: Option<String>,
    #[serde(default = "never")]
    pub recurrence: RecurrenceRule,
}

impl EventFile {
    /// Reads and parses an event file.
    pub fn load(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ClientError::io(path, e))?;
        Self::parse(&content, path)
    }

    /// Parses event file text; `origin` is only used in error messages.
    pub fn parse(content: &str, origin: &Path) -> ClientResult<Self> {
        toml::from_str(content).map_err(|e| ClientError::parse(origin, e.message()))
    }

    /// Validates the file and builds the event it describes.
    pub fn into_event(self, origin: &Path) -> ClientResult<Event> {
        let invalid = |message: String| ClientError::parse(origin, message);

        let span = match (self.start, self.end) {
            (Moment::Day(start), Moment::Day(end)) => {
                if end < start {
                    return Err(invalid(format!("end {end} is before start {start}")));
                }
                AnchorSpan::Day(DaySpan { start, end })
            }
            (Moment::Timed(start), Moment::Timed(end)) => {
                let zone = self
                    .zone
                    .as_deref()
                    .ok_or_else(|| invalid("timed events need a zone".to_string()))?;
                let end_zone = self.end_zone.as_deref().unwrap_or(zone);
                let span = TimedSpan::new(start, zone, end, end_zone)?;
                if span.minutes()? < 0 {
                    return Err(invalid(format!(
                        "end {end} ({end_zone}) is before start {start} ({zone})"
                    )));
                }
                AnchorSpan::Timed(span)
            }
            _ => {
                return Err(invalid(
                    "start and end must both be dates or both be date-times".to_string(),
                ));
            }
        };
        // a zone on a day event would be silently ignored
        if span.is_all_day() && (self.zone.is_some() || self.end_zone.is_some()) {
            return Err(invalid("day events do not take a zone".to_string()));
        }

        check_rule(&self.recurrence, span.start_date()).map_err(invalid)?;

        let details = EventDetails {
            title: self.title,
            location: self.location,
            description: self.description,
            guest_emails: self.guests,
        };
        let event = Event::new(span, self.recurrence, details);
        Ok(match self.id {
            Some(id) => event.with_id(id),
            None => event,
        })
    }
}

/// Rejects rules the occurrence generator would not accept.
fn check_rule(rule: &RecurrenceRule, anchor: NaiveDate) -> Result<(), String> {
    if let RecurrenceRule::Weekly { days, .. } = rule {
        if !days.contains(anchor.weekday()) {
            return Err(format!(
                "weekly days {days:?} must include the start weekday {}",
                anchor.weekday()
            ));
        }
    }
    if let Some(RecurrenceDuration::UntilDate(until)) = rule.duration() {
        if until < anchor {
            return Err(format!("recurrence ends on {until}, before the start {anchor}"));
        }
    }
    Ok(())
}
