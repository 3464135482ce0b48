//! Occurrence generation.
//!
//! [`Occurrences`] turns an anchor date and a [`RecurrenceRule`] into the
//! ordered dates the event occurs on. The rule is dispatched once into a
//! [`Cadence`], a closed set of step functions, and the duration policy into
//! a [`Bound`]. Every period is computed from the anchor (`anchor + k * step`
//! units) rather than from the previous occurrence, so month-end clamping
//! never drifts: a Jan 31 monthly event lands on Feb 28 and then Mar 31.
//!
//! The iterator is lazy, finite and `Clone`; cloning it before the first
//! `next()` gives an independent restart.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use tracing::trace;

use crate::recurrence::{MonthlyRecurrenceType, RecurrenceDuration, RecurrenceRule, WeekdaySet};
use crate::time::{YearMonth, nth_weekday_occurrence_index, nth_weekday_of_month};

/// How the date of period `k` is derived from the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cadence {
    Once,
    Days {
        step: u32,
    },
    Weeks {
        step: u32,
        days: WeekdaySet,
        /// Monday of the anchor's week.
        monday: NaiveDate,
    },
    MonthsSameDay {
        step: u32,
        month: YearMonth,
        day: u32,
    },
    MonthsSameWeekday {
        step: u32,
        month: YearMonth,
        weekday: Weekday,
        ordinal: u32,
    },
    Years {
        step: u32,
        month: YearMonth,
        day: u32,
    },
}

/// When generation stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    /// Inclusive last date.
    Until(NaiveDate),
    /// Total number of occurrences, anchor included.
    Count(u64),
}

/// Lazy, ordered sequence of occurrence dates.
#[derive(Debug, Clone)]
pub struct Occurrences {
    anchor: NaiveDate,
    cadence: Cadence,
    bound: Bound,
    /// Index of the next period to open.
    period: u64,
    pending: VecDeque<NaiveDate>,
    emitted: u64,
    finished: bool,
}

impl Occurrences {
    /// Creates the occurrence sequence of `rule` anchored at `anchor`.
    ///
    /// # Panics
    ///
    /// Panics if a weekly rule's day set does not contain the anchor's
    /// weekday. Rules are validated before they reach the engine.
    pub fn new(anchor: NaiveDate, rule: &RecurrenceRule) -> Self {
        let (cadence, bound) = match *rule {
            RecurrenceRule::Never => (Cadence::Once, Bound::Count(1)),
            RecurrenceRule::Daily { step, duration } => (
                Cadence::Days { step: step.get() },
                Self::bound(anchor, duration),
            ),
            RecurrenceRule::Weekly {
                step,
                days,
                duration,
            } => {
                assert!(
                    days.contains(anchor.weekday()),
                    "weekly recurrence days {days:?} must include the anchor weekday {}",
                    anchor.weekday()
                );
                let monday = anchor - Days::new(u64::from(anchor.weekday().num_days_from_monday()));
                (
                    Cadence::Weeks {
                        step: step.get(),
                        days,
                        monday,
                    },
                    Self::bound(anchor, duration),
                )
            }
            RecurrenceRule::Monthly {
                step,
                on: MonthlyRecurrenceType::SameDay,
                duration,
            } => (
                Cadence::MonthsSameDay {
                    step: step.get(),
                    month: YearMonth::of(anchor),
                    day: anchor.day(),
                },
                Self::bound(anchor, duration),
            ),
            RecurrenceRule::Monthly {
                step,
                on: MonthlyRecurrenceType::SameWeekday,
                duration,
            } => (
                Cadence::MonthsSameWeekday {
                    step: step.get(),
                    month: YearMonth::of(anchor),
                    weekday: anchor.weekday(),
                    ordinal: nth_weekday_occurrence_index(anchor),
                },
                Self::bound(anchor, duration),
            ),
            RecurrenceRule::Annually { step, duration } => (
                Cadence::Years {
                    step: step.get(),
                    month: YearMonth::of(anchor),
                    day: anchor.day(),
                },
                Self::bound(anchor, duration),
            ),
        };

        Self {
            anchor,
            cadence,
            bound,
            period: 0,
            pending: VecDeque::new(),
            emitted: 0,
            finished: false,
        }
    }

    fn bound(anchor: NaiveDate, duration: RecurrenceDuration) -> Bound {
        match duration.resolve(anchor) {
            RecurrenceDuration::UntilDate(until) => Bound::Until(until),
            RecurrenceDuration::NOccurrences(additional) => {
                Bound::Count(u64::from(additional) + 1)
            }
            // resolve() never returns Forever
            RecurrenceDuration::Forever => Bound::Until(NaiveDate::MAX),
        }
    }

    /// Returns the anchor date.
    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// Returns the inclusive last date, if the sequence is bounded by date.
    ///
    /// A `Forever` rule reports its resolved horizon here.
    pub fn until(&self) -> Option<NaiveDate> {
        match self.bound {
            Bound::Until(until) => Some(until),
            Bound::Count(_) => None,
        }
    }

    /// Returns the total number of occurrences, if the sequence is bounded
    /// by count.
    pub fn count_limit(&self) -> Option<u64> {
        match self.bound {
            Bound::Count(total) => Some(total),
            Bound::Until(_) => None,
        }
    }

    /// Queues the candidate dates of the next period.
    ///
    /// Returns `false` once no further period exists, either because the
    /// cadence is exhausted or because date arithmetic left chrono's range.
    fn open_period(&mut self) -> bool {
        let k = self.period;
        self.period += 1;

        match self.cadence {
            Cadence::Once => {
                if k > 0 {
                    return false;
                }
                self.pending.push_back(self.anchor);
            }
            Cadence::Days { step } => {
                let Some(date) = self
                    .anchor
                    .checked_add_days(Days::new(k * u64::from(step)))
                else {
                    return false;
                };
                self.pending.push_back(date);
            }
            Cadence::Weeks { step, days, monday } => {
                let Some(week) = monday.checked_add_days(Days::new(7 * k * u64::from(step))) else {
                    return false;
                };
                for day in days.iter() {
                    let Some(candidate) =
                        week.checked_add_days(Days::new(u64::from(day.num_days_from_monday())))
                    else {
                        return !self.pending.is_empty();
                    };
                    // the anchor week may hold configured days before the anchor
                    if candidate >= self.anchor {
                        self.pending.push_back(candidate);
                    }
                }
            }
            Cadence::MonthsSameDay { step, month, day } => {
                let Some(month) = months_after(month, k, step) else {
                    return false;
                };
                self.pending.push_back(month.at_day_clamped(day));
            }
            Cadence::MonthsSameWeekday {
                step,
                month,
                weekday,
                ordinal,
            } => {
                let Some(month) = months_after(month, k, step) else {
                    return false;
                };
                self.pending
                    .push_back(nth_weekday_of_month(month, weekday, ordinal));
            }
            Cadence::Years { step, month, day } => {
                let Some(month) = u32::try_from(k * u64::from(step))
                    .ok()
                    .and_then(|years| month.plus_years(years))
                else {
                    return false;
                };
                self.pending.push_back(month.at_day_clamped(day));
            }
        }
        true
    }
}

fn months_after(month: YearMonth, k: u64, step: u32) -> Option<YearMonth> {
    let months = u32::try_from(k * u64::from(step)).ok()?;
    month.plus_months(months)
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.finished {
            return None;
        }
        if let Bound::Count(total) = self.bound {
            if self.emitted >= total {
                self.finished = true;
                return None;
            }
        }

        let date = loop {
            if let Some(date) = self.pending.pop_front() {
                break date;
            }
            if !self.open_period() {
                self.finished = true;
                return None;
            }
        };

        // dates only grow, so the first one past the bound ends the sequence
        if let Bound::Until(until) = self.bound {
            if date > until {
                self.finished = true;
                self.pending.clear();
                return None;
            }
        }

        self.emitted += 1;
        trace!(%date, index = self.emitted, "occurrence");
        Some(date)
    }
}

impl FusedIterator for Occurrences {}

impl RecurrenceRule {
    /// Returns the occurrence dates of this rule anchored at `anchor`.
    pub fn occurrences(&self, anchor: NaiveDate) -> Occurrences {
        Occurrences::new(anchor, self)
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use crate::recurrence::RecurrenceDuration::{Forever, NOccurrences, UntilDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dates(list: &[(i32, u32, u32)]) -> Vec<NaiveDate> {
        list.iter().map(|&(y, m, d)| date(y, m, d)).collect()
    }

    fn step(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    fn days(list: &[Weekday]) -> WeekdaySet {
        list.iter().copied().collect()
    }

    fn expand(anchor: NaiveDate, rule: RecurrenceRule) -> Vec<NaiveDate> {
        rule.occurrences(anchor).collect()
    }

    fn render(dates: &[NaiveDate]) -> String {
        dates
            .iter()
            .map(|d| d.format("%Y-%m-%d %a").to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn assert_strictly_increasing(dates: &[NaiveDate]) {
        for pair in dates.windows(2) {
            assert!(pair[0] < pair[1], "{} is not before {}", pair[0], pair[1]);
        }
    }

    mod never {
        use super::*;

        #[test]
        fn yields_anchor_once() {
            let result = expand(date(2024, 8, 12), RecurrenceRule::Never);
            assert_eq!(result, vec![date(2024, 8, 12)]);
        }

        #[test]
        fn is_fused() {
            let mut occurrences = RecurrenceRule::Never.occurrences(date(2024, 8, 12));
            assert!(occurrences.next().is_some());
            assert!(occurrences.next().is_none());
            assert!(occurrences.next().is_none());
        }
    }

    mod daily {
        use super::*;

        #[test]
        fn until_date_every_ten_days() {
            let rule = RecurrenceRule::Daily {
                step: step(10),
                duration: UntilDate(date(2024, 9, 12)),
            };
            assert_eq!(
                expand(date(2024, 8, 12), rule),
                dates(&[(2024, 8, 12), (2024, 8, 22), (2024, 9, 1), (2024, 9, 11)])
            );
        }

        #[test]
        fn until_date_is_inclusive() {
            let rule = RecurrenceRule::Daily {
                step: step(1),
                duration: UntilDate(date(2024, 8, 14)),
            };
            assert_eq!(
                expand(date(2024, 8, 12), rule),
                dates(&[(2024, 8, 12), (2024, 8, 13), (2024, 8, 14)])
            );
        }

        #[test]
        fn n_occurrences_counts_anchor() {
            let rule = RecurrenceRule::Daily {
                step: step(5),
                duration: NOccurrences(3),
            };
            assert_eq!(
                expand(date(2024, 9, 4), rule),
                dates(&[(2024, 9, 4), (2024, 9, 9), (2024, 9, 14), (2024, 9, 19)])
            );
        }

        #[test]
        fn zero_occurrences_is_anchor_only() {
            let rule = RecurrenceRule::Daily {
                step: step(1),
                duration: NOccurrences(0),
            };
            assert_eq!(expand(date(2024, 9, 4), rule), vec![date(2024, 9, 4)]);
        }

        #[test]
        fn until_before_anchor_yields_nothing() {
            let rule = RecurrenceRule::Daily {
                step: step(1),
                duration: UntilDate(date(2024, 9, 3)),
            };
            assert!(expand(date(2024, 9, 4), rule).is_empty());
        }

        #[test]
        fn forever_stops_after_hundred_years() {
            let anchor = date(2024, 8, 12);
            let rule = RecurrenceRule::Daily {
                step: step(1),
                duration: Forever,
            };
            let occurrences = rule.occurrences(anchor);
            assert_eq!(occurrences.until(), Some(date(2124, 8, 12)));

            let all: Vec<_> = occurrences.collect();
            let expected_len = (date(2124, 8, 12) - anchor).num_days() + 1;
            assert_eq!(all.len() as i64, expected_len);
            assert_eq!(all.first(), Some(&anchor));
            assert_eq!(all.last(), Some(&date(2124, 8, 12)));
        }
    }

    mod weekly {
        use super::*;

        #[test]
        fn until_date_every_two_weeks() {
            // 2024-08-12 is a Monday; the Saturday of the third week is past the end
            let rule = RecurrenceRule::Weekly {
                step: step(2),
                days: days(&[Weekday::Mon, Weekday::Sat]),
                duration: UntilDate(date(2024, 8, 28)),
            };
            assert_eq!(
                expand(date(2024, 8, 12), rule),
                dates(&[(2024, 8, 12), (2024, 8, 17), (2024, 8, 26)])
            );
        }

        #[test]
        fn discards_days_before_anchor_in_first_week() {
            // 2024-09-04 is a Wednesday; Tuesday 2024-09-03 must not appear
            let rule = RecurrenceRule::Weekly {
                step: step(1),
                days: days(&[Weekday::Tue, Weekday::Wed]),
                duration: UntilDate(date(2024, 9, 11)),
            };
            assert_eq!(
                expand(date(2024, 9, 4), rule),
                dates(&[(2024, 9, 4), (2024, 9, 10), (2024, 9, 11)])
            );
        }

        #[test]
        fn n_occurrences_truncates_mid_week() {
            let rule = RecurrenceRule::Weekly {
                step: step(1),
                days: days(&[Weekday::Tue, Weekday::Wed]),
                duration: NOccurrences(4),
            };
            assert_eq!(
                expand(date(2024, 9, 4), rule),
                dates(&[
                    (2024, 9, 4),
                    (2024, 9, 10),
                    (2024, 9, 11),
                    (2024, 9, 17),
                    (2024, 9, 18),
                ])
            );
        }

        #[test]
        fn n_occurrences_boundary_table() {
            let all = dates(&[
                (2024, 9, 4),
                (2024, 9, 10),
                (2024, 9, 11),
                (2024, 9, 17),
                (2024, 9, 18),
                (2024, 9, 24),
                (2024, 9, 25),
            ]);
            for n in 0..=6u32 {
                let rule = RecurrenceRule::Weekly {
                    step: step(1),
                    days: days(&[Weekday::Wed, Weekday::Tue]),
                    duration: NOccurrences(n),
                };
                let result = expand(date(2024, 9, 4), rule);
                assert_eq!(result.len(), n as usize + 1, "n = {n}");
                assert_eq!(result, all[..=n as usize], "n = {n}");
            }
        }

        #[test]
        fn n_occurrences_with_step_and_days_around_anchor() {
            // Thursday anchor, Monday and Friday around it, every third week
            let rule = RecurrenceRule::Weekly {
                step: step(3),
                days: days(&[Weekday::Mon, Weekday::Thu, Weekday::Fri]),
                duration: NOccurrences(4),
            };
            assert_eq!(
                expand(date(2024, 9, 12), rule),
                dates(&[
                    (2024, 9, 12),
                    (2024, 9, 13),
                    (2024, 9, 30),
                    (2024, 10, 3),
                    (2024, 10, 4),
                ])
            );
        }

        #[test]
        fn until_inside_week_keeps_earlier_days() {
            // the end date falls on the Tuesday of the second week
            let rule = RecurrenceRule::Weekly {
                step: step(1),
                days: days(&[Weekday::Mon, Weekday::Wed]),
                duration: UntilDate(date(2024, 9, 10)),
            };
            assert_eq!(
                expand(date(2024, 9, 4), rule),
                dates(&[(2024, 9, 4), (2024, 9, 9)])
            );
        }

        #[test]
        #[should_panic(expected = "must include the anchor weekday")]
        fn anchor_weekday_missing_is_a_contract_violation() {
            let rule = RecurrenceRule::Weekly {
                step: step(1),
                days: days(&[Weekday::Mon]),
                duration: NOccurrences(1),
            };
            let _ = rule.occurrences(date(2024, 9, 4));
        }
    }

    mod monthly {
        use super::*;

        #[test]
        fn same_day_clamps_to_month_end() {
            let rule = RecurrenceRule::Monthly {
                step: step(1),
                on: MonthlyRecurrenceType::SameDay,
                duration: UntilDate(date(2023, 6, 30)),
            };
            assert_eq!(
                expand(date(2023, 1, 31), rule),
                dates(&[
                    (2023, 1, 31),
                    (2023, 2, 28),
                    (2023, 3, 31),
                    (2023, 4, 30),
                    (2023, 5, 31),
                    (2023, 6, 30),
                ])
            );
        }

        #[test]
        fn same_day_n_occurrences() {
            let rule = RecurrenceRule::Monthly {
                step: step(1),
                on: MonthlyRecurrenceType::SameDay,
                duration: NOccurrences(2),
            };
            assert_eq!(
                expand(date(2023, 1, 29), rule),
                dates(&[(2023, 1, 29), (2023, 2, 28), (2023, 3, 29)])
            );
        }

        #[test]
        fn same_day_until_checks_the_clamped_date() {
            // March 31 is after the end date even though March 28 would not be
            let rule = RecurrenceRule::Monthly {
                step: step(1),
                on: MonthlyRecurrenceType::SameDay,
                duration: UntilDate(date(2023, 3, 29)),
            };
            assert_eq!(
                expand(date(2023, 1, 31), rule),
                dates(&[(2023, 1, 31), (2023, 2, 28)])
            );
        }

        #[test]
        fn same_day_every_other_month_crosses_year() {
            let rule = RecurrenceRule::Monthly {
                step: step(2),
                on: MonthlyRecurrenceType::SameDay,
                duration: NOccurrences(3),
            };
            assert_eq!(
                expand(date(2023, 10, 30), rule),
                dates(&[(2023, 10, 30), (2023, 12, 30), (2024, 2, 29), (2024, 4, 30)])
            );
        }

        #[test]
        fn same_weekday_fifth_occurrence_clamps_down() {
            let rule = RecurrenceRule::Monthly {
                step: step(1),
                on: MonthlyRecurrenceType::SameWeekday,
                duration: UntilDate(date(2024, 12, 31)),
            };
            let result = expand(date(2024, 9, 30), rule);
            insta::assert_snapshot!(render(&result), @r"
            2024-09-30 Mon
            2024-10-28 Mon
            2024-11-25 Mon
            2024-12-30 Mon
            ");
        }

        #[test]
        fn same_weekday_n_occurrences_with_step() {
            let rule = RecurrenceRule::Monthly {
                step: step(2),
                on: MonthlyRecurrenceType::SameWeekday,
                duration: NOccurrences(2),
            };
            assert_eq!(
                expand(date(2024, 9, 4), rule),
                dates(&[(2024, 9, 4), (2024, 11, 6), (2025, 1, 1)])
            );
        }

        #[test]
        fn same_weekday_second_tuesday() {
            let rule = RecurrenceRule::Monthly {
                step: step(1),
                on: MonthlyRecurrenceType::SameWeekday,
                duration: NOccurrences(2),
            };
            assert_eq!(
                expand(date(2024, 9, 10), rule),
                dates(&[(2024, 9, 10), (2024, 10, 8), (2024, 11, 12)])
            );
        }
    }

    mod annually {
        use super::*;

        #[test]
        fn leap_day_round_trip() {
            let rule = RecurrenceRule::Annually {
                step: step(1),
                duration: UntilDate(date(2028, 12, 4)),
            };
            let result = expand(date(2024, 2, 29), rule);
            insta::assert_snapshot!(render(&result), @r"
            2024-02-29 Thu
            2025-02-28 Fri
            2026-02-28 Sat
            2027-02-28 Sun
            2028-02-29 Tue
            ");
        }

        #[test]
        fn n_occurrences() {
            let rule = RecurrenceRule::Annually {
                step: step(1),
                duration: NOccurrences(2),
            };
            assert_eq!(
                expand(date(2024, 5, 18), rule),
                dates(&[(2024, 5, 18), (2025, 5, 18), (2026, 5, 18)])
            );
        }

        #[test]
        fn every_four_years_from_leap_day() {
            let rule = RecurrenceRule::Annually {
                step: step(4),
                duration: NOccurrences(2),
            };
            assert_eq!(
                expand(date(2096, 2, 29), rule),
                dates(&[(2096, 2, 29), (2100, 2, 28), (2104, 2, 29)])
            );
        }
    }

    mod properties {
        use super::*;

        fn sample_rules() -> Vec<(NaiveDate, RecurrenceRule)> {
            let durations = [
                UntilDate(date(2026, 3, 15)),
                NOccurrences(0),
                NOccurrences(1),
                NOccurrences(17),
                Forever,
            ];
            let anchors = [date(2024, 1, 31), date(2024, 2, 29), date(2024, 9, 30)];

            let mut rules = vec![];
            for anchor in anchors {
                rules.push((anchor, RecurrenceRule::Never));
                for duration in durations {
                    for n in [1, 2, 7] {
                        rules.push((anchor, RecurrenceRule::Daily { step: step(n), duration }));
                        rules.push((
                            anchor,
                            RecurrenceRule::Weekly {
                                step: step(n),
                                days: days(&[anchor.weekday(), Weekday::Mon, Weekday::Sun]),
                                duration,
                            },
                        ));
                        for on in [MonthlyRecurrenceType::SameDay, MonthlyRecurrenceType::SameWeekday] {
                            rules.push((anchor, RecurrenceRule::Monthly { step: step(n), on, duration }));
                        }
                        rules.push((anchor, RecurrenceRule::Annually { step: step(n), duration }));
                    }
                }
            }
            rules
        }

        #[test]
        fn every_rule_respects_its_bound() {
            for (anchor, rule) in sample_rules() {
                let result = expand(anchor, rule);
                assert_strictly_increasing(&result);
                assert_eq!(result.first(), Some(&anchor), "{rule:?}");

                match rule.duration().map(|d| d.resolve(anchor)) {
                    None => assert_eq!(result.len(), 1),
                    Some(NOccurrences(n)) => assert_eq!(result.len(), n as usize + 1, "{rule:?}"),
                    Some(UntilDate(until)) => {
                        assert!(result.iter().all(|d| *d <= until), "{rule:?}");
                    }
                    Some(Forever) => unreachable!("resolved"),
                }
            }
        }

        #[test]
        fn expansion_is_restartable() {
            let rule = RecurrenceRule::Weekly {
                step: step(2),
                days: days(&[Weekday::Mon, Weekday::Sat]),
                duration: NOccurrences(9),
            };
            let occurrences = rule.occurrences(date(2024, 8, 12));
            let first: Vec<_> = occurrences.clone().collect();
            let second: Vec<_> = occurrences.collect();
            assert_eq!(first, second);
            assert_eq!(first.len(), 10);
        }

        #[test]
        fn count_limit_reported() {
            let rule = RecurrenceRule::Annually {
                step: step(1),
                duration: NOccurrences(3),
            };
            let occurrences = rule.occurrences(date(2024, 5, 18));
            assert_eq!(occurrences.count_limit(), Some(4));
            assert_eq!(occurrences.until(), None);
            assert_eq!(occurrences.anchor(), date(2024, 5, 18));
        }
    }
}
