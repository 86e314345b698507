//! Which tasks apply to which calendar day.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::task::{Frequency, Task};
use crate::time::{is_weekend, weekday_index};

/// Pure scheduling predicate.
///
/// - weekend-flagged tasks never show on weekdays
/// - weekly tasks land on Monday, or Saturday when weekend-flagged
/// - custom tasks show on the weekdays listed in `custom_days` (0 = Sunday)
/// - daily tasks show every day
pub fn is_task_scheduled(task: &Task, date: NaiveDate) -> bool {
    if task.is_weekend_task && !is_weekend(date) {
        return false;
    }

    match task.frequency {
        Frequency::Daily => true,
        Frequency::Weekly => {
            let anchor = if task.is_weekend_task { Weekday::Sat } else { Weekday::Mon };
            date.weekday() == anchor
        }
        Frequency::Custom => task.custom_days.contains(&weekday_index(date)),
    }
}

pub fn tasks_for_day(tasks: &[Task], date: NaiveDate) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| is_task_scheduled(t, date))
        .cloned()
        .collect()
}
