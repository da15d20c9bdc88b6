use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::{
    models::{NewTimeEntry, TimeEntry},
    utils::sql,
};

const ENTRY_COLUMNS: &str = r#"
    id,
    task_id,
    start_time,
    end_time,
    duration,
    is_running,
    notes,
    created_at,
    user_id
"#;

/// Fields written by a full entry update
#[derive(Debug, Clone)]
pub struct EntryChanges {
    pub task_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct TimeEntryRepository {
    pool: PgPool,
}

impl TimeEntryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_entry_by_id(&self, id: i32) -> Result<Option<TimeEntry>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(&sql(&format!(
            "SELECT {ENTRY_COLUMNS} FROM time_entries WHERE id = ?"
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Entries of a user, newest first, optionally bounded by start time
    pub async fn get_user_entries(
        &self,
        user_id: i32,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<TimeEntry>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(&sql(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM time_entries
            WHERE
                user_id = ?
                AND (?::TIMESTAMPTZ IS NULL OR start_time >= ?)
                AND (?::TIMESTAMPTZ IS NULL OR start_time <= ?)
            ORDER BY
                start_time DESC
            "#
        )))
        .bind(user_id)
        .bind(start)
        .bind(start)
        .bind(end)
        .bind(end)
        .fetch_all(&self.pool)
        .await
    }

    /// Running entries of one user, or of everyone when `user_id` is `None`
    pub async fn get_running_entries(
        &self,
        user_id: Option<i32>,
    ) -> Result<Vec<TimeEntry>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(&sql(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM time_entries
            WHERE
                is_running = TRUE
                AND (?::INTEGER IS NULL OR user_id = ?)
            ORDER BY
                start_time DESC
            "#
        )))
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_entries_for_task(&self, task_id: i32) -> Result<Vec<TimeEntry>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(&sql(&format!(
            "SELECT {ENTRY_COLUMNS} FROM time_entries WHERE task_id = ? ORDER BY start_time DESC"
        )))
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_entries_for_tasks(
        &self,
        task_ids: &[i32],
    ) -> Result<Vec<TimeEntry>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(&sql(&format!(
            "SELECT {ENTRY_COLUMNS} FROM time_entries WHERE task_id = ANY(?)"
        )))
        .bind(task_ids)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn update_entry(
        &self,
        id: i32,
        changes: &EntryChanges,
    ) -> Result<Option<TimeEntry>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(&sql(&format!(
            r#"
            UPDATE time_entries
            SET
                task_id = ?,
                start_time = ?,
                end_time = ?,
                duration = ?,
                notes = ?
            WHERE
                id = ?
            RETURNING {ENTRY_COLUMNS}
            "#
        )))
        .bind(changes.task_id)
        .bind(changes.start_time)
        .bind(changes.end_time)
        .bind(changes.duration)
        .bind(&changes.notes)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Stops a running entry at `now`; `None` when it is missing or already stopped
    pub async fn stop_entry(
        &self,
        id: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<TimeEntry>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(&sql(&format!(
            r#"
            UPDATE time_entries
            SET
                end_time = GREATEST(?, start_time),
                duration = FLOOR(EXTRACT(EPOCH FROM (GREATEST(?, start_time) - start_time)))::INTEGER,
                is_running = FALSE
            WHERE
                id = ?
                AND is_running = TRUE
            RETURNING {ENTRY_COLUMNS}
            "#
        )))
        .bind(now)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_entry(&self, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&sql("DELETE FROM time_entries WHERE id = ?"))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_user_entries(&self, user_id: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(&sql("DELETE FROM time_entries WHERE user_id = ?"))
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

// Transactional steps

pub async fn insert_entry(
    tx: &mut Transaction<'_, Postgres>,
    entry: &NewTimeEntry,
) -> Result<TimeEntry, sqlx::Error> {
    sqlx::query_as::<_, TimeEntry>(&sql(&format!(
        r#"
        INSERT INTO
            time_entries (
                task_id,
                start_time,
                end_time,
                duration,
                is_running,
                notes,
                created_at,
                user_id
            )
        VALUES
            (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {ENTRY_COLUMNS}
        "#
    )))
    .bind(entry.task_id)
    .bind(entry.start_time)
    .bind(entry.end_time)
    .bind(entry.duration)
    .bind(entry.is_running)
    .bind(&entry.notes)
    .bind(Utc::now())
    .bind(entry.user_id)
    .fetch_one(&mut **tx)
    .await
}

/// Stops whatever the user has running; returns the number of entries stopped
pub async fn stop_running_for_user(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i32,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    stop_running_where(tx, "user_id", user_id, now).await
}

pub async fn stop_running_for_task(
    tx: &mut Transaction<'_, Postgres>,
    task_id: i32,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    stop_running_where(tx, "task_id", task_id, now).await
}

async fn stop_running_where(
    tx: &mut Transaction<'_, Postgres>,
    column: &str,
    id: i32,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(&sql(&format!(
        r#"
        UPDATE time_entries
        SET
            end_time = GREATEST(?, start_time),
            duration = FLOOR(EXTRACT(EPOCH FROM (GREATEST(?, start_time) - start_time)))::INTEGER,
            is_running = FALSE
        WHERE
            {column} = ?
            AND is_running = TRUE
        "#
    )))
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}
