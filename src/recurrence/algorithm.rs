//! Next/previous occurrence calculation for recurrence rules
//!
//! All results are start-of-day values. Weekly and monthly rules select the
//! smallest configured value strictly later in the current period, otherwise
//! wrap to the smallest value `interval` periods ahead (mirrored for previous
//! occurrences).

use std::collections::BTreeSet;

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime};

use super::models::{CalendarContext, RecurrenceRule};

/// Months searched before a monthly rule gives up finding a valid day.
/// Eight years covers skipped leap years such as 2100.
const MAX_MONTH_STEPS: u32 = 96;

/// Midnight of the given instant's calendar day
pub fn start_of_day(at: NaiveDateTime) -> NaiveDateTime {
    at.date().and_time(NaiveTime::MIN)
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

impl RecurrenceRule {
    /// Earliest occurrence strictly after `after`.
    ///
    /// Returns `None` for an invalid rule or when the calendar cannot
    /// produce a matching date; callers keep their previous due date then.
    pub fn next_occurrence(
        &self,
        after: NaiveDateTime,
        calendar: &CalendarContext,
    ) -> Option<NaiveDateTime> {
        if let Err(err) = self.validate() {
            log::warn!("Cannot advance invalid recurrence rule {:?}: {}", self, err);
            return None;
        }

        let date = after.date();
        let next = match self {
            Self::Daily { interval } => date.checked_add_days(Days::new(*interval as u64)),
            Self::Weekly {
                interval,
                days_of_week,
            } => next_weekly(date, *interval, days_of_week, calendar),
            Self::Monthly {
                interval,
                days_of_month,
            } => next_monthly(date, *interval, days_of_month),
        };
        next.map(midnight)
    }

    /// Latest occurrence strictly before `before`
    pub fn previous_occurrence(
        &self,
        before: NaiveDateTime,
        calendar: &CalendarContext,
    ) -> Option<NaiveDateTime> {
        if let Err(err) = self.validate() {
            log::warn!("Cannot rewind invalid recurrence rule {:?}: {}", self, err);
            return None;
        }

        let date = before.date();
        let previous = match self {
            Self::Daily { interval } => date.checked_sub_days(Days::new(*interval as u64)),
            Self::Weekly {
                interval,
                days_of_week,
            } => previous_weekly(date, *interval, days_of_week, calendar),
            Self::Monthly {
                interval,
                days_of_month,
            } => previous_monthly(date, *interval, days_of_month),
        };
        previous.map(midnight)
    }

    /// Whether the rule's day pattern includes `date`.
    ///
    /// Daily rules match every date; their interval is measured from the
    /// reference date passed to `next_occurrence`.
    pub fn matches(&self, date: NaiveDate, calendar: &CalendarContext) -> bool {
        match self {
            Self::Daily { .. } => true,
            Self::Weekly { days_of_week, .. } => {
                days_of_week.contains(&calendar.weekday_ordinal(date))
            }
            Self::Monthly { days_of_month, .. } => days_of_month.contains(&(date.day() as u8)),
        }
    }

    /// First occurrence on or after the day of `from`
    pub fn first_occurrence_from(
        &self,
        from: NaiveDateTime,
        calendar: &CalendarContext,
    ) -> Option<NaiveDateTime> {
        if self.is_valid() && self.matches(from.date(), calendar) {
            Some(start_of_day(from))
        } else {
            self.next_occurrence(from, calendar)
        }
    }

    /// Successive occurrences from the day of `from` on, ending if the rule
    /// cannot advance
    pub fn occurrences_from<'a>(
        &'a self,
        from: NaiveDateTime,
        calendar: &'a CalendarContext,
    ) -> impl Iterator<Item = NaiveDateTime> + 'a {
        std::iter::successors(self.first_occurrence_from(from, calendar), move |current| {
            self.next_occurrence(*current, calendar)
        })
    }
}

fn next_weekly(
    date: NaiveDate,
    interval: u32,
    days: &BTreeSet<u8>,
    calendar: &CalendarContext,
) -> Option<NaiveDate> {
    let today = calendar.weekday_ordinal(date);
    if let Some(&later) = days.range(today + 1..).next() {
        return date.checked_add_days(Days::new((later - today) as u64));
    }

    let first = *days.iter().next()?;
    let week_start = date.checked_sub_days(Days::new((today - 1) as u64))?;
    week_start.checked_add_days(Days::new(7 * interval as u64 + (first - 1) as u64))
}

fn previous_weekly(
    date: NaiveDate,
    interval: u32,
    days: &BTreeSet<u8>,
    calendar: &CalendarContext,
) -> Option<NaiveDate> {
    let today = calendar.weekday_ordinal(date);
    if let Some(&earlier) = days.range(..today).next_back() {
        return date.checked_sub_days(Days::new((today - earlier) as u64));
    }

    let last = *days.iter().next_back()?;
    let week_start = date.checked_sub_days(Days::new((today - 1) as u64))?;
    week_start
        .checked_sub_days(Days::new(7 * interval as u64))?
        .checked_add_days(Days::new((last - 1) as u64))
}

fn next_monthly(date: NaiveDate, interval: u32, days: &BTreeSet<u8>) -> Option<NaiveDate> {
    let today = date.day() as u8;
    if let Some(found) = days
        .range(today + 1..)
        .find_map(|&day| date.with_day(day as u32))
    {
        return Some(found);
    }

    // Wrap into a later month; days that don't exist there are skipped.
    let month_start = date.with_day(1)?;
    let mut step = interval;
    for _ in 0..MAX_MONTH_STEPS {
        let month = month_start.checked_add_months(Months::new(step))?;
        if let Some(found) = days.iter().find_map(|&day| month.with_day(day as u32)) {
            return Some(found);
        }
        step = step.checked_add(interval)?;
    }

    log::warn!("No valid day of month in {:?} within {} months", days, MAX_MONTH_STEPS);
    None
}

fn previous_monthly(date: NaiveDate, interval: u32, days: &BTreeSet<u8>) -> Option<NaiveDate> {
    let today = date.day() as u8;
    if let Some(found) = days
        .range(..today)
        .rev()
        .find_map(|&day| date.with_day(day as u32))
    {
        return Some(found);
    }

    let month_start = date.with_day(1)?;
    let mut step = interval;
    for _ in 0..MAX_MONTH_STEPS {
        let month = month_start.checked_sub_months(Months::new(step))?;
        if let Some(found) = days.iter().rev().find_map(|&day| month.with_day(day as u32)) {
            return Some(found);
        }
        step = step.checked_add(interval)?;
    }

    log::warn!("No valid day of month in {:?} within {} months", days, MAX_MONTH_STEPS);
    None
}
