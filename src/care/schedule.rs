//! Due date derivation and status classification
//!
//! A task's displayed due date never lies in the past: new tasks are due
//! today at the latest, and a missed occurrence collapses to today instead of
//! accumulating a backlog. Status is classified against the scheduled
//! occurrence so a missed one still reports `Late`.

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::models::{CareKind, CareSchedule, CareTask, MarkStatus};
use crate::recurrence::{start_of_day, CalendarContext, RecurrenceRule};

/// Occurrences walked when looking for the latest missed one; ten years of
/// a daily rule.
const MAX_MISSED_STEPS: usize = 3660;

impl CareSchedule {
    pub fn new(
        start_date: NaiveDateTime,
        recurrence_rule: Option<RecurrenceRule>,
        calendar: CalendarContext,
    ) -> Self {
        Self {
            start_date,
            recurrence_rule,
            calendar,
        }
    }

    /// A schedule that never repeats
    pub fn one_off(start_date: NaiveDateTime, calendar: CalendarContext) -> Self {
        Self::new(start_date, None, calendar)
    }

    /// First occurrence on or after the start date
    pub fn first_due(&self) -> Option<NaiveDateTime> {
        match &self.recurrence_rule {
            None => Some(start_of_day(self.start_date)),
            Some(rule) => rule.first_occurrence_from(self.start_date, &self.calendar),
        }
    }

    /// Next occurrence after `after`, never before the first one
    pub fn next_occurrence(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        let rule = self.recurrence_rule.as_ref()?;
        if after < start_of_day(self.start_date) {
            return self.first_due();
        }
        rule.next_occurrence(after, &self.calendar)
    }

    /// Previous occurrence before `before`, never before the start date
    pub fn previous_occurrence(&self, before: NaiveDateTime) -> Option<NaiveDateTime> {
        let rule = self.recurrence_rule.as_ref()?;
        rule.previous_occurrence(before, &self.calendar)
            .filter(|previous| *previous >= start_of_day(self.start_date))
    }

    /// The occurrence the task is scheduled for, without collapsing to today
    pub fn scheduled_due_date(&self, last_completed: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
        match last_completed {
            None => self.first_due(),
            Some(done) => self.next_occurrence(done),
        }
    }

    /// Due date to show for a task with the given completion history.
    ///
    /// - never completed: first occurrence, or today if that has passed
    /// - completed, no rule: `None`
    /// - completed: next occurrence after the completion, or today if missed
    ///
    /// `None` for a recurring task means the rule cannot advance.
    pub fn compute_due_date(
        &self,
        last_completed: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        let today = start_of_day(now);
        self.scheduled_due_date(last_completed)
            .map(|scheduled| scheduled.max(today))
    }

    /// Whole days since the most recent missed occurrence.
    ///
    /// Follows the occurrences after the last completion up to today and
    /// measures from the latest one, so lateness does not compound.
    pub fn days_late(&self, last_completed: Option<NaiveDateTime>, now: NaiveDateTime) -> i64 {
        if last_completed.is_none() {
            return 0;
        }
        let today = start_of_day(now);
        let Some(scheduled) = self.scheduled_due_date(last_completed) else {
            return 0;
        };
        if scheduled >= today {
            return 0;
        }

        let mut missed = scheduled;
        for _ in 0..MAX_MISSED_STEPS {
            match self.next_occurrence(missed) {
                Some(next) if next < today => missed = next,
                _ => break,
            }
        }
        (today - missed).num_days()
    }
}

/// Classify a task as Done, Late or Due.
///
/// Done wins when the last completion is on `now`'s calendar day; Late needs
/// a due date before today; everything else, unscheduled tasks included, is Due.
pub fn mark_status(
    due_date: Option<NaiveDateTime>,
    last_completed: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> MarkStatus {
    if last_completed.is_some_and(|done| done.date() == now.date()) {
        return MarkStatus::Done;
    }
    match due_date {
        Some(due) if due < start_of_day(now) => MarkStatus::Late,
        _ => MarkStatus::Due,
    }
}

impl CareTask {
    /// Create a task and derive its initial state
    pub fn new(plant_id: Uuid, kind: CareKind, schedule: CareSchedule, now: NaiveDateTime) -> Self {
        let mut task = Self {
            id: Uuid::new_v4(),
            plant_id,
            kind,
            schedule,
            notes: None,
            completions: Vec::new(),
            last_completed: None,
            due_date: None,
            status: MarkStatus::Due,
            days_late: 0,
            created_at: now,
        };
        task.refresh(now);
        task
    }

    /// Recompute the derived fields. Repeated calls with the same `now` give
    /// the same result.
    pub fn refresh(&mut self, now: NaiveDateTime) {
        self.last_completed = self.completions.iter().max().copied();

        let scheduled = self.schedule.scheduled_due_date(self.last_completed);
        match self.schedule.compute_due_date(self.last_completed, now) {
            Some(due) => self.due_date = Some(due),
            None if self.reminders_enabled() => {
                log::warn!(
                    "{} task {} cannot advance its schedule; keeping due date {:?}",
                    self.kind,
                    self.id,
                    self.due_date
                );
            }
            None => self.due_date = None,
        }

        // New tasks are never overdue; completed ones are judged against the
        // occurrence they were scheduled for.
        let status_date = if self.last_completed.is_some() {
            scheduled.or(self.due_date)
        } else {
            self.due_date
        };
        self.status = mark_status(status_date, self.last_completed, now);
        self.days_late = match self.status {
            MarkStatus::Late => self.schedule.days_late(self.last_completed, now),
            _ => 0,
        };
    }

    /// Record a completion at `now` and advance the due date
    pub fn mark_complete(&mut self, now: NaiveDateTime) {
        self.completions.push(now);
        log::debug!("Completed {} task {} at {}", self.kind, self.id, now);
        self.refresh(now);
    }

    /// Remove the most recent completion. Returns false when there was none.
    pub fn undo_completion(&mut self, now: NaiveDateTime) -> bool {
        let Some(index) = self
            .completions
            .iter()
            .enumerate()
            .max_by_key(|(_, at)| **at)
            .map(|(index, _)| index)
        else {
            return false;
        };
        self.completions.remove(index);
        self.refresh(now);
        true
    }

    /// Turn reminders on with the given rule; empty day sets get defaults
    pub fn enable_reminders(&mut self, rule: RecurrenceRule, now: NaiveDateTime) {
        let rule = rule.with_defaults(self.schedule.start_date.date());
        self.schedule.recurrence_rule = Some(rule);
        self.refresh(now);
    }

    /// Turn reminders off; the task becomes one-off
    pub fn disable_reminders(&mut self, now: NaiveDateTime) {
        self.schedule.recurrence_rule = None;
        self.refresh(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Weekday};
    use std::collections::BTreeSet;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        at(y, m, d, 0)
    }

    fn schedule(start: NaiveDateTime, rule: Option<RecurrenceRule>) -> CareSchedule {
        CareSchedule::new(start, rule, CalendarContext::default())
    }

    fn watering(schedule: CareSchedule, now: NaiveDateTime) -> CareTask {
        CareTask::new(Uuid::new_v4(), CareKind::Watering, schedule, now)
    }

    #[test]
    fn test_new_task_is_never_overdue() {
        let now = at(2024, 4, 20, 9);
        let start = now - Duration::days(30);
        let weekly = schedule(start, Some(RecurrenceRule::weekly(1, [2]).unwrap()));

        assert_eq!(weekly.compute_due_date(None, now), Some(day(2024, 4, 20)));

        let task = watering(weekly, now);
        assert_eq!(task.status, MarkStatus::Due);
        assert_eq!(task.days_late, 0);
    }

    #[test]
    fn test_new_task_with_future_start() {
        let now = at(2024, 4, 20, 9);
        let monthly = schedule(
            at(2024, 4, 25, 12),
            Some(RecurrenceRule::monthly(1, [1]).unwrap()),
        );

        assert_eq!(monthly.compute_due_date(None, now), Some(day(2024, 5, 1)));
    }

    #[test]
    fn test_new_weekly_task_waits_for_its_day() {
        // Saturday 2024-04-20; Mondays only (ordinal 2 with Sunday first)
        let now = at(2024, 4, 20, 9);
        let weekly = schedule(now, Some(RecurrenceRule::weekly(1, [2]).unwrap()));

        assert_eq!(weekly.compute_due_date(None, now), Some(day(2024, 4, 22)));
    }

    #[test]
    fn test_on_time_completion_advances() {
        let now = at(2024, 4, 20, 9);
        let every_three = schedule(at(2024, 4, 1, 8), Some(RecurrenceRule::daily(3).unwrap()));

        assert_eq!(
            every_three.compute_due_date(Some(at(2024, 4, 19, 18)), now),
            Some(day(2024, 4, 22))
        );
    }

    #[test]
    fn test_late_collapses_to_today_without_backlog() {
        let now = at(2024, 4, 20, 9);
        let daily = schedule(at(2024, 1, 1, 8), Some(RecurrenceRule::daily(1).unwrap()));
        let completed = now - Duration::days(10);

        assert_eq!(daily.compute_due_date(Some(completed), now), Some(day(2024, 4, 20)));
    }

    #[test]
    fn test_one_off_task() {
        let now = at(2024, 4, 20, 9);
        let once = CareSchedule::one_off(at(2024, 4, 18, 9), CalendarContext::default());

        assert_eq!(once.compute_due_date(None, now), Some(day(2024, 4, 20)));
        assert_eq!(once.compute_due_date(Some(now), now), None);
        assert_eq!(once.next_occurrence(now), None);
        assert_eq!(once.previous_occurrence(now), None);
    }

    #[test]
    fn test_compute_due_date_is_idempotent() {
        let now = at(2024, 4, 20, 9);
        let rule = RecurrenceRule::monthly(1, [1, 15]).unwrap();
        let monthly = schedule(at(2024, 1, 1, 8), Some(rule));
        let completed = Some(at(2024, 4, 2, 7));

        let first = monthly.compute_due_date(completed, now);
        let second = monthly.compute_due_date(completed, now);
        assert_eq!(first, second);
        assert_eq!(first, Some(day(2024, 4, 20)));
    }

    #[test]
    fn test_previous_occurrence_clamped_to_start() {
        let daily = schedule(at(2024, 4, 10, 15), Some(RecurrenceRule::daily(1).unwrap()));

        assert_eq!(daily.previous_occurrence(at(2024, 4, 12, 9)), Some(day(2024, 4, 11)));
        assert_eq!(daily.previous_occurrence(at(2024, 4, 11, 9)), Some(day(2024, 4, 10)));
        assert_eq!(daily.previous_occurrence(at(2024, 4, 10, 9)), None);
    }

    #[test]
    fn test_next_occurrence_not_before_start() {
        let monthly = schedule(at(2024, 5, 3, 9), Some(RecurrenceRule::monthly(1, [1, 15]).unwrap()));

        assert_eq!(monthly.next_occurrence(at(2024, 3, 1, 9)), Some(day(2024, 5, 15)));
        assert_eq!(monthly.next_occurrence(at(2024, 5, 15, 9)), Some(day(2024, 6, 1)));
    }

    #[test]
    fn test_mark_status_classification() {
        let now = at(2024, 4, 20, 15);

        assert_eq!(
            mark_status(Some(day(2024, 4, 25)), Some(at(2024, 4, 20, 8)), now),
            MarkStatus::Done
        );
        assert_eq!(
            mark_status(Some(day(2024, 4, 19)), Some(at(2024, 4, 12, 8)), now),
            MarkStatus::Late
        );
        assert_eq!(mark_status(Some(day(2024, 4, 20)), None, now), MarkStatus::Due);
        assert_eq!(mark_status(Some(day(2024, 4, 22)), None, now), MarkStatus::Due);
        assert_eq!(mark_status(None, None, now), MarkStatus::Due);
    }

    #[test]
    fn test_missed_occurrence_reports_late_with_today_due() {
        let now = at(2024, 4, 20, 9);
        let mut task = watering(
            schedule(at(2024, 4, 1, 8), Some(RecurrenceRule::daily(2).unwrap())),
            at(2024, 4, 1, 8),
        );
        task.mark_complete(at(2024, 4, 10, 8));
        task.refresh(now);

        assert_eq!(task.status, MarkStatus::Late);
        assert_eq!(task.due_date, Some(day(2024, 4, 20)));
        // Last daily(2) occurrence before the 20th is the 18th
        assert_eq!(task.days_late, 2);
    }

    #[test]
    fn test_days_late_follows_every_third_day() {
        let every_three = schedule(at(2024, 4, 1, 8), Some(RecurrenceRule::daily(3).unwrap()));
        let completed = Some(at(2024, 4, 10, 8));
        let now = at(2024, 4, 20, 9);

        // Missed the 13th, 16th and 19th; the 22nd is still ahead
        assert_eq!(every_three.days_late(completed, now), 1);

        let mut task = watering(every_three, at(2024, 4, 1, 8));
        task.mark_complete(at(2024, 4, 10, 8));
        task.refresh(now);
        assert_eq!(task.status, MarkStatus::Late);
        assert_eq!(task.days_late, 1);
    }

    #[test]
    fn test_days_late_follows_fortnightly_weeks() {
        // Every other Monday (ordinal 2 with Sunday first)
        let fortnightly = schedule(
            at(2024, 4, 1, 8),
            Some(RecurrenceRule::weekly(2, [2]).unwrap()),
        );
        let completed = Some(at(2024, 4, 1, 9));
        let now = at(2024, 4, 24, 9); // Wednesday

        // Only Monday the 15th was missed; the 22nd is not an occurrence
        assert_eq!(fortnightly.days_late(completed, now), 9);
    }

    #[test]
    fn test_days_late_from_latest_missed_weekly_occurrence() {
        // Mondays and Thursdays (Sunday first: 2 and 5)
        let weekly = schedule(at(2024, 4, 1, 8), Some(RecurrenceRule::weekly(1, [2, 5]).unwrap()));
        let completed = Some(at(2024, 4, 1, 9)); // Monday
        let now = at(2024, 4, 13, 9); // Saturday

        // Missed Thu 4th, Mon 8th, Thu 11th; lateness counts from the 11th
        assert_eq!(weekly.days_late(completed, now), 2);
        assert_eq!(weekly.days_late(None, now), 0);
        assert_eq!(weekly.days_late(Some(at(2024, 4, 11, 9)), now), 0);
    }

    #[test]
    fn test_completion_marks_done_for_the_day() {
        let start = at(2024, 4, 15, 8);
        let mut task = watering(schedule(start, Some(RecurrenceRule::daily(3).unwrap())), start);
        assert_eq!(task.due_date, Some(day(2024, 4, 15)));

        let done_at = at(2024, 4, 15, 19);
        task.mark_complete(done_at);
        assert_eq!(task.status, MarkStatus::Done);
        assert_eq!(task.last_completed, Some(done_at));
        assert_eq!(task.due_date, Some(day(2024, 4, 18)));

        // Next morning it's simply due again in two days
        task.refresh(at(2024, 4, 16, 7));
        assert_eq!(task.status, MarkStatus::Due);
        assert_eq!(task.due_date, Some(day(2024, 4, 18)));
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let now = at(2024, 4, 20, 9);
        let mut task = watering(
            schedule(at(2024, 3, 1, 8), Some(RecurrenceRule::weekly(1, [1, 4]).unwrap())),
            at(2024, 3, 1, 8),
        );
        task.mark_complete(at(2024, 4, 2, 10));

        task.refresh(now);
        let snapshot = task.clone();
        task.refresh(now);
        task.refresh(now);
        assert_eq!(task, snapshot);
    }

    #[test]
    fn test_undo_completion() {
        let start = at(2024, 4, 15, 8);
        let mut task = watering(schedule(start, Some(RecurrenceRule::daily(1).unwrap())), start);
        task.mark_complete(at(2024, 4, 15, 9));
        task.mark_complete(at(2024, 4, 16, 9));

        assert!(task.undo_completion(at(2024, 4, 16, 10)));
        assert_eq!(task.last_completed, Some(at(2024, 4, 15, 9)));
        assert_eq!(task.due_date, Some(day(2024, 4, 16)));
        assert_eq!(task.status, MarkStatus::Due);

        assert!(task.undo_completion(at(2024, 4, 16, 10)));
        assert!(!task.undo_completion(at(2024, 4, 16, 10)));
        assert_eq!(task.last_completed, None);
    }

    #[test]
    fn test_reminders_toggle_rule() {
        let start = at(2024, 4, 17, 8);
        let mut task = watering(CareSchedule::one_off(start, CalendarContext::default()), start);
        assert!(!task.reminders_enabled());

        task.enable_reminders(
            RecurrenceRule::Monthly {
                interval: 1,
                days_of_month: BTreeSet::new(),
            },
            start,
        );
        assert_eq!(
            task.schedule.recurrence_rule,
            Some(RecurrenceRule::monthly(1, [17]).unwrap())
        );
        assert_eq!(task.due_date, Some(day(2024, 4, 17)));

        task.mark_complete(at(2024, 4, 17, 9));
        assert_eq!(task.due_date, Some(day(2024, 5, 17)));

        task.disable_reminders(at(2024, 4, 18, 9));
        assert!(!task.reminders_enabled());
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn test_stuck_rule_keeps_previous_due_date() {
        let start = at(2024, 3, 31, 8);
        let mut task = watering(
            schedule(start, Some(RecurrenceRule::monthly(12, [31]).unwrap())),
            start,
        );
        assert_eq!(task.due_date, Some(day(2024, 3, 31)));

        // From April, every 12 months never reaches a 31st
        task.completions.push(at(2024, 4, 2, 8));
        task.refresh(at(2024, 4, 3, 8));
        assert_eq!(task.due_date, Some(day(2024, 3, 31)));
    }

    #[test]
    fn test_monday_first_calendar_schedule() {
        let cal = CalendarContext::new(Weekday::Mon);
        // Tue/Thu/Sat
        let weekly = CareSchedule::new(
            at(2024, 3, 1, 8),
            Some(RecurrenceRule::weekly(1, [2, 4, 6]).unwrap()),
            cal,
        );

        // Completed Friday 15th -> Saturday 16th
        assert_eq!(
            weekly.compute_due_date(Some(at(2024, 3, 15, 9)), at(2024, 3, 15, 10)),
            Some(day(2024, 3, 16))
        );
    }
}
