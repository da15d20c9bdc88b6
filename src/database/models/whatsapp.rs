use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WhatsappIntegration {
    pub id: i32,
    pub instance_name: String,
    pub api_url: String,
    pub api_key: String,
    pub phone_number: String,
    pub is_active: bool,
    pub webhook_url: Option<String>,
    pub authorized_numbers: Option<String>,
    pub restrict_to_numbers: bool,
    pub allowed_group_jid: Option<String>,
    pub response_mode: String,
    pub last_connection: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response shape; the gateway key is replaced by a flag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsappIntegrationInfo {
    pub id: i32,
    pub instance_name: String,
    pub api_url: String,
    pub has_api_key: bool,
    pub phone_number: String,
    pub is_active: bool,
    pub webhook_url: Option<String>,
    pub authorized_numbers: Option<String>,
    pub restrict_to_numbers: bool,
    pub allowed_group_jid: Option<String>,
    pub response_mode: String,
    pub last_connection: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WhatsappIntegration> for WhatsappIntegrationInfo {
    fn from(integration: WhatsappIntegration) -> Self {
        Self {
            id: integration.id,
            instance_name: integration.instance_name,
            api_url: integration.api_url,
            has_api_key: !integration.api_key.is_empty(),
            phone_number: integration.phone_number,
            is_active: integration.is_active,
            webhook_url: integration.webhook_url,
            authorized_numbers: integration.authorized_numbers,
            restrict_to_numbers: integration.restrict_to_numbers,
            allowed_group_jid: integration.allowed_group_jid,
            response_mode: integration.response_mode,
            last_connection: integration.last_connection,
            created_at: integration.created_at,
            updated_at: integration.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsappIntegrationInput {
    pub instance_name: String,
    pub api_url: String,
    pub api_key: String,
    pub phone_number: String,
    pub is_active: Option<bool>,
    pub webhook_url: Option<String>,
    pub authorized_numbers: Option<String>,
    pub restrict_to_numbers: Option<bool>,
    pub allowed_group_jid: Option<String>,
    pub response_mode: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsappIntegrationUpdate {
    pub instance_name: Option<String>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: Option<bool>,
    pub webhook_url: Option<String>,
    pub authorized_numbers: Option<String>,
    pub restrict_to_numbers: Option<bool>,
    pub allowed_group_jid: Option<String>,
    pub response_mode: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WhatsappLog {
    pub id: i32,
    pub integration_id: i32,
    pub log_type: String,
    pub message: String,
    pub metadata: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WhatsappLogQuery {
    pub limit: Option<i64>,
}
