use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TASK_COLOR: &str = "#3B82F6";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub estimated_hours: Option<i32>,
    pub deadline: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub source: String,
    pub user_id: i32,
    pub project_id: Option<i32>,
}

impl Task {
    pub fn estimated_seconds(&self) -> Option<i64> {
        self.estimated_hours.map(|hours| i64::from(hours) * 3600)
    }

    /// Time can only be tracked against live, unfinished tasks
    pub fn accepts_time(&self) -> bool {
        self.is_active && !self.is_completed
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub estimated_hours: Option<i32>,
    pub deadline: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub source: String,
    pub project_id: Option<i32>,
}

/// Row data for inserting a task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub estimated_hours: Option<i32>,
    pub deadline: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub source: String,
    pub user_id: i32,
    pub project_id: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub estimated_hours: Option<i32>,
    pub deadline: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub source: Option<String>,
    pub project_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithStats {
    #[serde(flatten)]
    pub task: Task,
    /// Seconds, running entries included
    pub total_time: i64,
    pub active_entries: i64,
    pub items: Vec<TaskItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub project_id: Option<i32>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
    pub id: i32,
    pub task_id: i32,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItemInput {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItemUpdate {
    pub title: Option<String>,
    pub completed: Option<bool>,
}
