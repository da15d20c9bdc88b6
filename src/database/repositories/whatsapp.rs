use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::{
    models::{WhatsappIntegration, WhatsappIntegrationInput, WhatsappIntegrationUpdate, WhatsappLog},
    utils::sql,
};

const INTEGRATION_COLUMNS: &str = r#"
    id,
    instance_name,
    api_url,
    api_key,
    phone_number,
    is_active,
    webhook_url,
    authorized_numbers,
    restrict_to_numbers,
    allowed_group_jid,
    response_mode,
    last_connection,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct WhatsappRepository {
    pool: PgPool,
}

impl WhatsappRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The single configured integration, if any
    pub async fn get_integration(&self) -> Result<Option<WhatsappIntegration>, sqlx::Error> {
        sqlx::query_as::<_, WhatsappIntegration>(&format!(
            "SELECT {INTEGRATION_COLUMNS} FROM whatsapp_integrations ORDER BY id LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await
    }

    /// Removes the integration together with its log rows
    pub async fn delete_integration(&self, id: i32) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&sql("DELETE FROM whatsapp_logs WHERE integration_id = ?"))
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(&sql("DELETE FROM whatsapp_integrations WHERE id = ?"))
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Newest first
    pub async fn get_logs(&self, limit: i64) -> Result<Vec<WhatsappLog>, sqlx::Error> {
        sqlx::query_as::<_, WhatsappLog>(&sql(r#"
            SELECT id, integration_id, log_type, message, metadata, timestamp
            FROM whatsapp_logs
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
        "#))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}

// Transactional steps

pub async fn create_integration(
    tx: &mut Transaction<'_, Postgres>,
    input: &WhatsappIntegrationInput,
) -> Result<WhatsappIntegration, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, WhatsappIntegration>(&sql(&format!(
        r#"
        INSERT INTO
            whatsapp_integrations (
                instance_name,
                api_url,
                api_key,
                phone_number,
                is_active,
                webhook_url,
                authorized_numbers,
                restrict_to_numbers,
                allowed_group_jid,
                response_mode,
                created_at,
                updated_at
            )
        VALUES
            (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {INTEGRATION_COLUMNS}
        "#
    )))
    .bind(&input.instance_name)
    .bind(&input.api_url)
    .bind(&input.api_key)
    .bind(&input.phone_number)
    .bind(input.is_active.unwrap_or(true))
    .bind(&input.webhook_url)
    .bind(&input.authorized_numbers)
    .bind(input.restrict_to_numbers.unwrap_or(true))
    .bind(&input.allowed_group_jid)
    .bind(input.response_mode.as_deref().unwrap_or("individual"))
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await
}

pub async fn update_integration(
    tx: &mut Transaction<'_, Postgres>,
    id: i32,
    input: &WhatsappIntegrationUpdate,
) -> Result<Option<WhatsappIntegration>, sqlx::Error> {
    sqlx::query_as::<_, WhatsappIntegration>(&sql(&format!(
        r#"
        UPDATE whatsapp_integrations
        SET
            instance_name = COALESCE(?, instance_name),
            api_url = COALESCE(?, api_url),
            api_key = COALESCE(?, api_key),
            phone_number = COALESCE(?, phone_number),
            is_active = COALESCE(?, is_active),
            webhook_url = COALESCE(?, webhook_url),
            authorized_numbers = COALESCE(?, authorized_numbers),
            restrict_to_numbers = COALESCE(?, restrict_to_numbers),
            allowed_group_jid = COALESCE(?, allowed_group_jid),
            response_mode = COALESCE(?, response_mode),
            updated_at = ?
        WHERE
            id = ?
        RETURNING {INTEGRATION_COLUMNS}
        "#
    )))
    .bind(&input.instance_name)
    .bind(&input.api_url)
    .bind(&input.api_key)
    .bind(&input.phone_number)
    .bind(input.is_active)
    .bind(&input.webhook_url)
    .bind(&input.authorized_numbers)
    .bind(input.restrict_to_numbers)
    .bind(&input.allowed_group_jid)
    .bind(&input.response_mode)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn add_log(
    tx: &mut Transaction<'_, Postgres>,
    integration_id: i32,
    log_type: &str,
    message: &str,
    metadata: Option<String>,
) -> Result<WhatsappLog, sqlx::Error> {
    sqlx::query_as::<_, WhatsappLog>(&sql(r#"
        INSERT INTO whatsapp_logs (integration_id, log_type, message, metadata, timestamp)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, integration_id, log_type, message, metadata, timestamp
    "#))
    .bind(integration_id)
    .bind(log_type)
    .bind(message)
    .bind(metadata)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await
}
