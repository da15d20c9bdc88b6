use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::Task;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: i32,
    pub task_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds
    pub duration: Option<i32>,
    pub is_running: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: i32,
}

impl TimeEntry {
    /// Tracked seconds as of `now`; running entries count their elapsed time
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        if self.is_running {
            (now - self.start_time).num_seconds().max(0)
        } else if let Some(duration) = self.duration {
            i64::from(duration)
        } else {
            self.end_time
                .map(|end| (end - self.start_time).num_seconds().max(0))
                .unwrap_or(0)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryWithTask {
    #[serde(flatten)]
    pub entry: TimeEntry,
    pub task: Task,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryInput {
    pub task_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Ignored when both times are present
    pub duration: Option<i32>,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_running: bool,
}

/// Row data for inserting an entry
#[derive(Debug, Clone)]
pub struct NewTimeEntry {
    pub task_id: i32,
    pub user_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub is_running: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryUpdate {
    pub task_id: Option<i32>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTimerInput {
    pub task_id: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub user_id: Option<i32>,
    pub all: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedCount {
    pub deleted: u64,
}
