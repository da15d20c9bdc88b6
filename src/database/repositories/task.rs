use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::{
    models::{NewTask, Task, TaskListQuery, TaskUpdate},
    utils::sql,
};

const TASK_COLUMNS: &str = r#"
    id,
    name,
    description,
    color,
    estimated_hours,
    deadline,
    is_active,
    is_completed,
    completed_at,
    created_at,
    source,
    user_id,
    project_id
"#;

const PREFIXED_TASK_COLUMNS: &str = r#"
    t.id,
    t.name,
    t.description,
    t.color,
    t.estimated_hours,
    t.deadline,
    t.is_active,
    t.is_completed,
    t.completed_at,
    t.created_at,
    t.source,
    t.user_id,
    t.project_id
"#;

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_task_by_id(&self, id: i32) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&sql(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_tasks_by_ids(&self, ids: &[i32]) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&sql(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ANY(?)"
        )))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
    }

    /// Active tasks visible to a user: their own tasks plus tasks in projects
    /// they own or reach through a bound team. `None` lists every active task.
    pub async fn get_visible_tasks(
        &self,
        user_id: Option<i32>,
        query: &TaskListQuery,
    ) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&sql(&format!(
            r#"
            SELECT {PREFIXED_TASK_COLUMNS}
            FROM
                tasks t
                LEFT JOIN projects p ON p.id = t.project_id
            WHERE
                t.is_active = TRUE
                AND (?::INTEGER IS NULL OR t.project_id = ?)
                AND (?::BOOLEAN IS NULL OR t.is_completed = ?)
                AND (
                    ?::INTEGER IS NULL
                    OR t.user_id = ?
                    OR p.owner_id = ?
                    OR EXISTS (
                        SELECT 1
                        FROM project_teams pt
                        WHERE pt.project_id = t.project_id
                          AND (
                            EXISTS (SELECT 1 FROM team_members tm WHERE tm.team_id = pt.team_id AND tm.user_id = ?)
                            OR EXISTS (SELECT 1 FROM team_managers tg WHERE tg.team_id = pt.team_id AND tg.user_id = ?)
                          )
                    )
                )
            ORDER BY
                t.created_at DESC
            "#
        )))
        .bind(query.project_id)
        .bind(query.project_id)
        .bind(query.completed)
        .bind(query.completed)
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Active tasks created by the user, used by the dashboard
    pub async fn get_user_active_tasks(&self, user_id: i32) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&sql(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ? AND is_active = TRUE ORDER BY id"
        )))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task, sqlx::Error> {
        sqlx::query_as::<_, Task>(&sql(&format!(
            r#"
            INSERT INTO
                tasks (
                    name,
                    description,
                    color,
                    estimated_hours,
                    deadline,
                    is_active,
                    created_at,
                    source,
                    user_id,
                    project_id
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {TASK_COLUMNS}
            "#
        )))
        .bind(&task.name)
        .bind(&task.description)
        .bind(&task.color)
        .bind(task.estimated_hours)
        .bind(task.deadline)
        .bind(task.is_active)
        .bind(Utc::now())
        .bind(&task.source)
        .bind(task.user_id)
        .bind(task.project_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_task(
        &self,
        id: i32,
        input: &TaskUpdate,
    ) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&sql(&format!(
            r#"
            UPDATE tasks
            SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                color = COALESCE(?, color),
                estimated_hours = COALESCE(?, estimated_hours),
                deadline = COALESCE(?, deadline),
                is_active = COALESCE(?, is_active),
                source = COALESCE(?, source),
                project_id = COALESCE(?, project_id)
            WHERE
                id = ?
            RETURNING {TASK_COLUMNS}
            "#
        )))
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.color)
        .bind(input.estimated_hours)
        .bind(input.deadline)
        .bind(input.is_active)
        .bind(&input.source)
        .bind(input.project_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn reopen_task(&self, id: i32) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&sql(&format!(
            r#"
            UPDATE tasks
            SET
                is_completed = FALSE,
                completed_at = NULL
            WHERE
                id = ?
            RETURNING {TASK_COLUMNS}
            "#
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Moves every project-less task of the user into `project_id`
    pub async fn migrate_orphan_tasks(
        &self,
        user_id: i32,
        project_id: i32,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(&sql(
            "UPDATE tasks SET project_id = ? WHERE user_id = ? AND project_id IS NULL",
        ))
        .bind(project_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_orphan_tasks(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE project_id IS NULL")
            .fetch_one(&self.pool)
            .await
    }
}

// Transactional steps

pub async fn deactivate_task(
    tx: &mut Transaction<'_, Postgres>,
    id: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&sql("UPDATE tasks SET is_active = FALSE WHERE id = ?"))
        .bind(id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn mark_completed(
    tx: &mut Transaction<'_, Postgres>,
    id: i32,
    completed_at: DateTime<Utc>,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&sql(&format!(
        r#"
        UPDATE tasks
        SET
            is_completed = TRUE,
            completed_at = ?
        WHERE
            id = ?
        RETURNING {TASK_COLUMNS}
        "#
    )))
    .bind(completed_at)
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}
