//! Recurrence rules.
//!
//! A [`RecurrenceRule`] is an already-validated description of how an event
//! repeats. Each frequency carries only the fields meaningful to it: weekly
//! rules have a [`WeekdaySet`], monthly rules a [`MonthlyRecurrenceType`],
//! and [`RecurrenceRule::Never`] carries nothing at all.

use std::fmt;
use std::num::NonZeroU32;

use chrono::{Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Number of years a [`RecurrenceDuration::Forever`] rule is expanded for.
pub const FOREVER_HORIZON_YEARS: u32 = 100;

/// The plain frequency of a rule, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    Never,
    Daily,
    Weekly,
    Monthly,
    Annually,
}

impl fmt::Display for RecurrenceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Never => "never",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Annually => "annually",
        };
        f.write_str(name)
    }
}

/// How long a repeating event keeps producing occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceDuration {
    /// Repeats for [`FOREVER_HORIZON_YEARS`] years after the anchor.
    Forever,
    /// Repeats while the occurrence date is on or before this date.
    UntilDate(NaiveDate),
    /// Repeats this many times after the anchor occurrence.
    NOccurrences(u32),
}

impl RecurrenceDuration {
    /// Rewrites `Forever` into an inclusive end date relative to `anchor`.
    ///
    /// The horizon is month-length clamped, so a Feb 29 anchor ends on
    /// Feb 28 when the horizon year is not a leap year. `UntilDate` and
    /// `NOccurrences` are returned unchanged.
    pub fn resolve(self, anchor: NaiveDate) -> Self {
        match self {
            Self::Forever => Self::UntilDate(
                anchor
                    .checked_add_months(Months::new(FOREVER_HORIZON_YEARS * 12))
                    .unwrap_or(NaiveDate::MAX),
            ),
            other => other,
        }
    }
}

/// How a monthly rule picks its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthlyRecurrenceType {
    /// Same day of month, clamped to the month's last day.
    SameDay,
    /// Same ordinal weekday, e.g. the 2nd Tuesday.
    SameWeekday,
}

/// A set of weekdays, iterated Monday first.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct WeekdaySet(u8);

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl WeekdaySet {
    /// Returns an empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns a copy of this set with `day` added.
    #[must_use]
    pub fn with(mut self, day: Weekday) -> Self {
        self.insert(day);
        self
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the days in calendar order, Monday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.into_iter().filter(|day| self.contains(*day))
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl From<Vec<Weekday>> for WeekdaySet {
    fn from(days: Vec<Weekday>) -> Self {
        days.into_iter().collect()
    }
}

impl From<WeekdaySet> for Vec<Weekday> {
    fn from(set: WeekdaySet) -> Self {
        set.iter().collect()
    }
}

fn default_step() -> NonZeroU32 {
    NonZeroU32::MIN
}

/// How an event repeats.
///
/// `step` multiplies the frequency's natural unit: a weekly rule with step 2
/// repeats every other week. It defaults to 1 when deserialized without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "frequency", rename_all = "snake_case")]
pub enum RecurrenceRule {
    /// A single occurrence at the anchor.
    Never,
    Daily {
        #[serde(default = "default_step")]
        step: NonZeroU32,
        duration: RecurrenceDuration,
    },
    /// Repeats on the given weekdays. The set must contain the anchor's
    /// weekday.
    Weekly {
        #[serde(default = "default_step")]
        step: NonZeroU32,
        days: WeekdaySet,
        duration: RecurrenceDuration,
    },
    Monthly {
        #[serde(default = "default_step")]
        step: NonZeroU32,
        on: MonthlyRecurrenceType,
        duration: RecurrenceDuration,
    },
    /// Repeats on the anchor's month and day, clamped like
    /// [`MonthlyRecurrenceType::SameDay`].
    Annually {
        #[serde(default = "default_step")]
        step: NonZeroU32,
        duration: RecurrenceDuration,
    },
}

impl RecurrenceRule {
    /// Returns the plain frequency of this rule.
    pub fn frequency(&self) -> RecurrenceFrequency {
        match self {
            Self::Never => RecurrenceFrequency::Never,
            Self::Daily { .. } => RecurrenceFrequency::Daily,
            Self::Weekly { .. } => RecurrenceFrequency::Weekly,
            Self::Monthly { .. } => RecurrenceFrequency::Monthly,
            Self::Annually { .. } => RecurrenceFrequency::Annually,
        }
    }

    /// Returns the step, or `None` for a non-repeating rule.
    pub fn step(&self) -> Option<NonZeroU32> {
        match self {
            Self::Never => None,
            Self::Daily { step, .. }
            | Self::Weekly { step, .. }
            | Self::Monthly { step, .. }
            | Self::Annually { step, .. } => Some(*step),
        }
    }

    /// Returns the duration policy, or `None` for a non-repeating rule.
    pub fn duration(&self) -> Option<RecurrenceDuration> {
        match self {
            Self::Never => None,
            Self::Daily { duration, .. }
            | Self::Weekly { duration, .. }
            | Self::Monthly { duration, .. }
            | Self::Annually { duration, .. } => Some(*duration),
        }
    }

    /// Returns true if this rule produces more than the anchor occurrence
    /// under some duration.
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Self::Never)
    }
}
