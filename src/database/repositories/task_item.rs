use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::{
    models::{TaskItem, TaskItemInput, TaskItemUpdate},
    utils::sql,
};

#[derive(Clone)]
pub struct TaskItemRepository {
    pool: PgPool,
}

impl TaskItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_item_by_id(&self, id: i32) -> Result<Option<TaskItem>, sqlx::Error> {
        sqlx::query_as::<_, TaskItem>(&sql(r#"
            SELECT id, task_id, title, completed, created_at, user_id
            FROM task_items
            WHERE id = ?
        "#))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_items_for_task(&self, task_id: i32) -> Result<Vec<TaskItem>, sqlx::Error> {
        sqlx::query_as::<_, TaskItem>(&sql(r#"
            SELECT id, task_id, title, completed, created_at, user_id
            FROM task_items
            WHERE task_id = ?
            ORDER BY created_at, id
        "#))
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_items_for_tasks(&self, task_ids: &[i32]) -> Result<Vec<TaskItem>, sqlx::Error> {
        sqlx::query_as::<_, TaskItem>(&sql(r#"
            SELECT id, task_id, title, completed, created_at, user_id
            FROM task_items
            WHERE task_id = ANY(?)
            ORDER BY created_at, id
        "#))
        .bind(task_ids)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn create_item(
        &self,
        task_id: i32,
        user_id: i32,
        input: &TaskItemInput,
    ) -> Result<TaskItem, sqlx::Error> {
        sqlx::query_as::<_, TaskItem>(&sql(r#"
            INSERT INTO task_items (task_id, title, completed, created_at, user_id)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, task_id, title, completed, created_at, user_id
        "#))
        .bind(task_id)
        .bind(input.title.trim())
        .bind(input.completed)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_item(
        &self,
        id: i32,
        input: &TaskItemUpdate,
    ) -> Result<Option<TaskItem>, sqlx::Error> {
        sqlx::query_as::<_, TaskItem>(&sql(r#"
            UPDATE task_items
            SET
                title = COALESCE(?, title),
                completed = COALESCE(?, completed)
            WHERE
                id = ?
            RETURNING id, task_id, title, completed, created_at, user_id
        "#))
        .bind(input.title.as_deref().map(str::trim))
        .bind(input.completed)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_item(&self, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&sql("DELETE FROM task_items WHERE id = ?"))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn complete_all_items(&self, task_id: i32) -> Result<Vec<TaskItem>, sqlx::Error> {
        sqlx::query(&sql(
            "UPDATE task_items SET completed = TRUE WHERE task_id = ? AND completed = FALSE",
        ))
        .bind(task_id)
        .execute(&self.pool)
        .await?;

        self.get_items_for_task(task_id).await
    }
}

pub async fn complete_items(
    tx: &mut Transaction<'_, Postgres>,
    task_id: i32,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(&sql(
        "UPDATE task_items SET completed = TRUE WHERE task_id = ? AND completed = FALSE",
    ))
    .bind(task_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}
