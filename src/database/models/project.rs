use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub is_personal: bool,
    pub estimated_hours: Option<i32>,
    pub deadline: Option<DateTime<Utc>>,
    pub owner_id: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_personal: bool,
    pub estimated_hours: Option<i32>,
    pub deadline: Option<DateTime<Utc>>,
    pub owner_id: Option<i32>,
    pub is_active: Option<bool>,
    /// Bind the new project to this team right away
    pub team_id: Option<i32>,
}

/// Partial update; `is_personal` is deliberately absent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub estimated_hours: Option<i32>,
    pub deadline: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTeam {
    pub id: i32,
    pub project_id: i32,
    pub team_id: i32,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindTeamInput {
    pub team_id: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    pub all: Option<bool>,
}

/// Outcome of the orphan-task repair routine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairSummary {
    pub users_processed: usize,
    pub projects_created: usize,
    pub tasks_migrated: u64,
}

/// How a user reaches a project through its bound teams
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectTeamAccess {
    pub is_member: bool,
    pub is_manager: bool,
}
