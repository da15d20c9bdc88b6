//! Report aggregation over already-loaded rows. Boundaries are UTC and weeks
//! start on Sunday. Running entries count the time elapsed up to `now`.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

use crate::database::models::{
    DailyTotal, DashboardStats, Task, TaskItem, TaskTimeSummary, TaskWithStats, TimeEntry,
};

/// Longest range the daily report will fill
pub const MAX_DAILY_RANGE_DAYS: i64 = 366;

pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(chrono::NaiveTime::MIN).and_utc()
}

pub fn start_of_week(now: DateTime<Utc>) -> DateTime<Utc> {
    let days = u64::from(now.weekday().num_days_from_sunday());
    let day = start_of_day(now);
    day.checked_sub_days(Days::new(days)).unwrap_or(day)
}

pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let day = start_of_day(now);
    day.with_day(1).unwrap_or(day)
}

fn tracked_since(entries: &[TimeEntry], since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    entries
        .iter()
        .filter(|entry| entry.start_time >= since && entry.start_time <= now)
        .map(|entry| entry.elapsed_seconds(now))
        .sum()
}

fn tracked_by_task(entries: &[TimeEntry], now: DateTime<Utc>) -> HashMap<i32, i64> {
    let mut totals = HashMap::new();
    for entry in entries {
        *totals.entry(entry.task_id).or_insert(0) += entry.elapsed_seconds(now);
    }
    totals
}

/// `user_entries` are the caller's own entries; `task_entries` are every entry
/// recorded against `tasks`
pub fn dashboard(
    tasks: &[Task],
    user_entries: &[TimeEntry],
    task_entries: &[TimeEntry],
    now: DateTime<Utc>,
) -> DashboardStats {
    let today = now.date_naive();
    let tomorrow = today.succ_opt();
    let tracked = tracked_by_task(task_entries, now);

    let mut stats = DashboardStats {
        today_time: tracked_since(user_entries, start_of_day(now), now),
        week_time: tracked_since(user_entries, start_of_week(now), now),
        month_time: tracked_since(user_entries, start_of_month(now), now),
        ..Default::default()
    };

    let mut estimated_total = 0i64;
    let mut tracked_total = 0i64;

    for task in tasks {
        let spent = tracked.get(&task.id).copied().unwrap_or(0);
        let estimate = task.estimated_seconds().filter(|seconds| *seconds > 0);

        if task.is_completed {
            stats.completed_tasks += 1;
            if let Some(estimate) = estimate {
                if spent > 0 {
                    estimated_total += estimate;
                    tracked_total += spent;
                }
            }
        } else {
            stats.active_tasks += 1;

            if let Some(deadline) = task.deadline {
                let due = deadline.date_naive();
                if deadline < now {
                    stats.overdue_tasks += 1;
                } else if due == today {
                    stats.due_today_tasks += 1;
                }
                if Some(due) == tomorrow {
                    stats.due_tomorrow_tasks += 1;
                }
            }

            if let Some(estimate) = estimate {
                if spent * 5 >= estimate * 4 && spent <= estimate {
                    stats.nearing_limit_tasks += 1;
                }
            }
        }

        if let Some(estimate) = estimate {
            if spent > estimate {
                stats.over_time_tasks += 1;
            }
        }
    }

    if tracked_total > 0 {
        stats.efficiency = (100.0 * estimated_total as f64 / tracked_total as f64).round() as i64;
    }

    stats
}

/// Tracked time per task, largest first; tasks without time are left out
pub fn time_by_task(tasks: &[Task], entries: &[TimeEntry], now: DateTime<Utc>) -> Vec<TaskTimeSummary> {
    let tracked = tracked_by_task(entries, now);
    let mut summaries: Vec<TaskTimeSummary> = tasks
        .iter()
        .filter_map(|task| {
            let total_time = tracked.get(&task.id).copied().unwrap_or(0);
            (total_time > 0).then(|| TaskTimeSummary {
                task: task.clone(),
                total_time,
            })
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.total_time
            .cmp(&a.total_time)
            .then_with(|| a.task.id.cmp(&b.task.id))
    });
    summaries
}

/// One row per calendar day in `start..=end`, zero-filled. Entries count on
/// the day they started.
pub fn daily_totals(
    entries: &[TimeEntry],
    start: NaiveDate,
    end: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<DailyTotal> {
    let mut by_day: HashMap<NaiveDate, i64> = HashMap::new();
    for entry in entries {
        let day = entry.start_time.date_naive();
        if day >= start && day <= end {
            *by_day.entry(day).or_insert(0) += entry.elapsed_seconds(now);
        }
    }

    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|date| DailyTotal {
            date,
            total_time: by_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Attaches time totals, running-entry counts and checklist items to tasks
pub fn tasks_with_stats(
    tasks: Vec<Task>,
    entries: &[TimeEntry],
    items: &[TaskItem],
    now: DateTime<Utc>,
) -> Vec<TaskWithStats> {
    let tracked = tracked_by_task(entries, now);

    tasks
        .into_iter()
        .map(|task| {
            let active_entries = entries
                .iter()
                .filter(|entry| entry.task_id == task.id && entry.is_running)
                .count() as i64;
            let task_items = items
                .iter()
                .filter(|item| item.task_id == task.id)
                .cloned()
                .collect();

            TaskWithStats {
                total_time: tracked.get(&task.id).copied().unwrap_or(0),
                active_entries,
                items: task_items,
                task,
            }
        })
        .collect()
}
