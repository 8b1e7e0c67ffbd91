//! "Up Next" worklist grouping
//!
//! Tasks are expected to be refreshed for `now` before grouping.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use super::models::{CareTask, MarkStatus};
use crate::recurrence::start_of_day;

/// Worklist section, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WorklistSection {
    Late,
    Today,
    Tomorrow,
    Upcoming,
    Completed,
}

impl WorklistSection {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Late => "Late",
            Self::Today => "Today",
            Self::Tomorrow => "Tomorrow",
            Self::Upcoming => "Upcoming",
            Self::Completed => "Completed Today",
        }
    }
}

/// One non-empty section of the worklist
#[derive(Debug, Clone)]
pub struct WorklistGroup<'a> {
    pub section: WorklistSection,
    pub tasks: Vec<&'a CareTask>,
}

/// Section a task belongs in, or `None` if it is outside the horizon or has
/// nothing left to do
pub fn section_for(
    task: &CareTask,
    now: NaiveDateTime,
    horizon_days: u32,
) -> Option<WorklistSection> {
    match task.status {
        MarkStatus::Done => return Some(WorklistSection::Completed),
        MarkStatus::Late => return Some(WorklistSection::Late),
        MarkStatus::Due => {}
    }

    let due = task.due_date?;
    let days = (start_of_day(due) - start_of_day(now)).num_days();
    match days {
        d if d <= 0 => Some(WorklistSection::Today),
        1 => Some(WorklistSection::Tomorrow),
        d if d <= horizon_days as i64 => Some(WorklistSection::Upcoming),
        _ => None,
    }
}

/// Group tasks into ordered, non-empty sections.
///
/// Within a section tasks are ordered by due date, then kind name; completed
/// tasks by completion time.
pub fn up_next(tasks: &[CareTask], now: NaiveDateTime, horizon_days: u32) -> Vec<WorklistGroup<'_>> {
    let mut groups: Vec<WorklistGroup<'_>> = Vec::new();

    for task in tasks {
        let Some(section) = section_for(task, now, horizon_days) else {
            continue;
        };
        match groups.iter_mut().find(|g| g.section == section) {
            Some(group) => group.tasks.push(task),
            None => groups.push(WorklistGroup {
                section,
                tasks: vec![task],
            }),
        }
    }

    // Far-future sentinel keeps tasks without a due date at the end
    let far = now + Duration::days(36_500);
    for group in &mut groups {
        if group.section == WorklistSection::Completed {
            group.tasks.sort_by_key(|t| t.last_completed);
        } else {
            group.tasks.sort_by(|a, b| {
                a.due_date
                    .unwrap_or(far)
                    .cmp(&b.due_date.unwrap_or(far))
                    .then_with(|| a.kind.display_name().cmp(b.kind.display_name()))
            });
        }
    }
    groups.sort_by_key(|g| g.section);

    log::debug!(
        "Up next: {} sections from {} tasks",
        groups.len(),
        tasks.len()
    );
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::care::models::{CareKind, CareSchedule};
    use crate::recurrence::{CalendarContext, RecurrenceRule};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn task(kind: CareKind, start: NaiveDateTime, rule: RecurrenceRule) -> CareTask {
        let schedule = CareSchedule::new(start, Some(rule), CalendarContext::default());
        CareTask::new(Uuid::new_v4(), kind, schedule, start)
    }

    #[test]
    fn test_groups_in_section_order() {
        let now = at(2024, 4, 20, 9);
        let plant_start = at(2024, 4, 1, 8);

        let mut late = task(CareKind::Watering, plant_start, RecurrenceRule::daily(2).unwrap());
        late.mark_complete(at(2024, 4, 10, 8));

        let mut done = task(CareKind::Misting, plant_start, RecurrenceRule::daily(1).unwrap());
        done.mark_complete(at(2024, 4, 20, 8));

        let mut tomorrow = task(CareKind::Pruning, plant_start, RecurrenceRule::daily(2).unwrap());
        tomorrow.mark_complete(at(2024, 4, 19, 8));

        let mut upcoming = task(CareKind::Fertilizing, plant_start, RecurrenceRule::daily(5).unwrap());
        upcoming.mark_complete(at(2024, 4, 19, 8));

        let mut far = task(CareKind::Repotting, plant_start, RecurrenceRule::monthly(1, [1]).unwrap());
        far.mark_complete(at(2024, 4, 1, 8));

        let new_today = task(CareKind::Rotating, now, RecurrenceRule::daily(7).unwrap());

        let mut tasks = vec![upcoming, far, done, tomorrow, new_today, late];
        for t in &mut tasks {
            t.refresh(now);
        }

        let groups = up_next(&tasks, now, 7);
        let sections: Vec<_> = groups.iter().map(|g| g.section).collect();
        assert_eq!(
            sections,
            vec![
                WorklistSection::Late,
                WorklistSection::Today,
                WorklistSection::Tomorrow,
                WorklistSection::Upcoming,
                WorklistSection::Completed,
            ]
        );
        assert_eq!(groups[0].tasks[0].kind, CareKind::Watering);
        assert_eq!(groups[1].tasks[0].kind, CareKind::Rotating);
        assert_eq!(groups[2].tasks[0].kind, CareKind::Pruning);
        assert_eq!(groups[3].tasks[0].kind, CareKind::Fertilizing);
        assert_eq!(groups[4].tasks[0].kind, CareKind::Misting);
        // Monthly repotting on May 1st is beyond the 7 day horizon
        assert!(groups
            .iter()
            .all(|g| g.tasks.iter().all(|t| t.kind != CareKind::Repotting)));
    }

    #[test]
    fn test_upcoming_sorted_by_due_date_then_kind() {
        let now = at(2024, 4, 20, 9);
        let start = at(2024, 4, 23, 8);

        let tasks = vec![
            task(CareKind::Watering, at(2024, 4, 25, 8), RecurrenceRule::daily(1).unwrap()),
            task(CareKind::Misting, start, RecurrenceRule::daily(1).unwrap()),
            task(CareKind::Fertilizing, start, RecurrenceRule::daily(1).unwrap()),
        ];

        let groups = up_next(&tasks, now, 14);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].section, WorklistSection::Upcoming);
        let kinds: Vec<_> = groups[0].tasks.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![CareKind::Fertilizing, CareKind::Misting, CareKind::Watering]
        );
    }

    #[test]
    fn test_empty_worklist() {
        let groups = up_next(&[], at(2024, 4, 20, 9), 7);
        assert!(groups.is_empty());
    }
}
