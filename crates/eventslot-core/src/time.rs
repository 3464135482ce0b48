//! Calendar arithmetic and timezone conversion.
//!
//! This module holds the pure date functions the occurrence generator is
//! built from:
//! - [`to_utc`] / [`from_utc`]: zone-local naive date-times to and from UTC
//! - [`zone_aware_duration`]: the length of a span whose endpoints may have
//!   been authored in different zones
//! - [`nth_weekday_occurrence_index`] / [`nth_weekday_of_month`]: "2nd
//!   Tuesday" style resolution with clamp-down
//! - [`clamp_day_of_month`] and [`YearMonth`]: month-length aware day
//!   selection
//!
//! [`TimeWindow`] describes UTC query ranges over stored slots.

use chrono::{
    DateTime, Datelike, Days, Duration, MappedLocalTime, Months, NaiveDate, NaiveDateTime, Offset,
    TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Parses an IANA zone identifier such as `Europe/Athens`.
///
/// # Errors
///
/// Returns [`CoreError::UnknownZone`] if the identifier is not in the tz
/// database.
pub fn parse_zone(id: &str) -> CoreResult<Tz> {
    id.parse::<Tz>().map_err(|_| CoreError::unknown_zone(id))
}

/// Converts a zone-local date-time to UTC using the offset in effect at that
/// instant.
///
/// Local times repeated by a backward transition resolve to the earlier
/// offset. Local times skipped by a forward transition are read with the
/// offset in effect before the gap, which moves them later by the gap length
/// (02:30 on a spring-forward night in New York becomes 03:30 EDT).
pub fn to_utc(local: NaiveDateTime, zone: Tz) -> CoreResult<DateTime<Utc>> {
    match zone.from_local_datetime(&local) {
        MappedLocalTime::Single(dt) => Ok(dt.with_timezone(&Utc)),
        MappedLocalTime::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        MappedLocalTime::None => {
            let unresolvable = || CoreError::UnresolvableLocalTime {
                local,
                zone: zone.name().to_string(),
            };
            let before = local
                .checked_sub_signed(Duration::days(1))
                .ok_or_else(unresolvable)?;
            let offset = zone
                .offset_from_local_datetime(&before)
                .earliest()
                .ok_or_else(unresolvable)?;
            let seconds = i64::from(offset.fix().local_minus_utc());
            local
                .checked_sub_signed(Duration::seconds(seconds))
                .map(|naive| naive.and_utc())
                .ok_or_else(unresolvable)
        }
    }
}

/// Converts a UTC instant to the naive wall-clock time of `zone`.
pub fn from_utc(utc: DateTime<Utc>, zone: Tz) -> NaiveDateTime {
    utc.with_timezone(&zone).naive_local()
}

/// Units [`zone_aware_duration`] can measure in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl DurationUnit {
    /// Counts whole units in `delta`, truncating toward zero.
    pub fn count(self, delta: Duration) -> i64 {
        match self {
            Self::Seconds => delta.num_seconds(),
            Self::Minutes => delta.num_minutes(),
            Self::Hours => delta.num_hours(),
            Self::Days => delta.num_days(),
        }
    }
}

/// Measures the span between two zoned wall-clock times.
///
/// Both endpoints are converted to UTC first, so 10:00 in New York and 16:00
/// in Paris on the same summer day are zero minutes apart.
pub fn zone_aware_duration(
    start: NaiveDateTime,
    start_zone: Tz,
    end: NaiveDateTime,
    end_zone: Tz,
    unit: DurationUnit,
) -> CoreResult<i64> {
    let start = to_utc(start, start_zone)?;
    let end = to_utc(end, end_zone)?;
    Ok(unit.count(end - start))
}

/// Returns which occurrence of its weekday `date` is within its month
/// (1 for the first Monday, 5 for a fifth Monday).
pub fn nth_weekday_occurrence_index(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

/// Returns the `ordinal`-th `weekday` of `month`.
///
/// When the month has fewer occurrences than requested, the last occurrence
/// in the month is returned. Ordinals outside `1..=5` are clamped into that
/// range.
pub fn nth_weekday_of_month(month: YearMonth, weekday: Weekday, ordinal: u32) -> NaiveDate {
    let first = month.first_day();
    let offset = (7 + weekday.num_days_from_monday() - first.weekday().num_days_from_monday()) % 7;
    let mut day = 1 + offset + 7 * (ordinal.clamp(1, 5) - 1);
    while day > month.length() {
        day -= 7;
    }
    month.at_day(day)
}

/// Returns `reference`'s month with the day-of-month set to `day`, clamped to
/// the last day of that month.
pub fn clamp_day_of_month(day: u32, reference: NaiveDate) -> NaiveDate {
    YearMonth::of(reference).at_day_clamped(day)
}

/// A calendar month of a specific year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    first: NaiveDate,
}

impl YearMonth {
    /// Returns the month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            first: date - Days::new(u64::from(date.day0())),
        }
    }

    /// Creates a year-month, or `None` if it is outside chrono's range or
    /// `month` is not in `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    /// Number of days in this month, leap years included.
    pub fn length(&self) -> u32 {
        match self.month() {
            4 | 6 | 9 | 11 => 30,
            2 if is_leap_year(self.year()) => 29,
            2 => 28,
            _ => 31,
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.at_day(self.length())
    }

    /// Returns the month `months` after this one.
    pub fn plus_months(&self, months: u32) -> Option<Self> {
        self.first
            .checked_add_months(Months::new(months))
            .map(|first| Self { first })
    }

    /// Returns the same month `years` later.
    pub fn plus_years(&self, years: u32) -> Option<Self> {
        self.plus_months(years.checked_mul(12)?)
    }

    /// Returns the given day of this month, clamped to `1..=length()`.
    pub fn at_day_clamped(&self, day: u32) -> NaiveDate {
        self.at_day(day.clamp(1, self.length()))
    }

    // `day` must already be within the month.
    fn at_day(&self, day: u32) -> NaiveDate {
        self.first + Days::new(u64::from(day - 1))
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// A UTC time range used to query stored slots.
///
/// Represents a half-open interval `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a window, or [`CoreError::ReversedWindow`] if `start` is
    /// after `end`.
    pub fn try_new(start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::ReversedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a window from two wall-clock times, each in its own zone.
    ///
    /// Bounds in different zones may cross once converted; that is reported
    /// as [`CoreError::ReversedWindow`] like any other reversed range.
    pub fn from_zoned(
        start: NaiveDateTime,
        start_zone: Tz,
        end: NaiveDateTime,
        end_zone: Tz,
    ) -> CoreResult<Self> {
        Self::try_new(to_utc(start, start_zone)?, to_utc(end, end_zone)?)
    }

    /// Creates a window covering whole days `[first, last]` in UTC.
    pub fn for_dates(first: NaiveDate, last: NaiveDate) -> CoreResult<Self> {
        let end = last
            .succ_opt()
            .ok_or_else(|| CoreError::date_out_of_range(format!("day after {last}")))?;
        Self::try_new(
            first.and_time(chrono::NaiveTime::MIN).and_utc(),
            end.and_time(chrono::NaiveTime::MIN).and_utc(),
        )
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a datetime falls within this window.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }
}
