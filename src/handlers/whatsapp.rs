use actix_web::{HttpResponse, Result, web};
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::models::{
    WhatsappIntegrationInfo, WhatsappIntegrationInput, WhatsappIntegrationUpdate,
    WhatsappLogQuery,
};
use crate::database::repositories::{WhatsappRepository, whatsapp as whatsapp_repo};
use crate::database::transaction::DatabaseTransaction;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{UserContext, validation};

pub const DEFAULT_LOG_LIMIT: i64 = 50;
pub const MAX_LOG_LIMIT: i64 = 500;

const CONFIG_LOG: &str = "config";

/// Writes the `config` log row that accompanies every configuration change
async fn log_config_change(
    tx: &mut Transaction<'_, Postgres>,
    integration_id: i32,
    message: &str,
    user_id: i32,
) -> Result<(), AppError> {
    let metadata = json!({ "userId": user_id }).to_string();
    whatsapp_repo::add_log(tx, integration_id, CONFIG_LOG, message, Some(metadata)).await?;
    Ok(())
}

pub async fn get_integration(
    ctx: UserContext,
    whatsapp: web::Data<WhatsappRepository>,
) -> Result<HttpResponse> {
    ctx.requires_admin()?;

    let integration = whatsapp
        .get_integration()
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("WhatsApp integration is not configured".to_string()))?;

    Ok(ApiResponse::success(WhatsappIntegrationInfo::from(integration)))
}

pub async fn create_integration(
    ctx: UserContext,
    pool: web::Data<PgPool>,
    whatsapp: web::Data<WhatsappRepository>,
    input: web::Json<WhatsappIntegrationInput>,
) -> Result<HttpResponse> {
    ctx.requires_admin()?;
    let input = input.into_inner();
    validation::validate_whatsapp(&input)?;

    if whatsapp
        .get_integration()
        .await
        .map_err(AppError::from)?
        .is_some()
    {
        return Err(AppError::Conflict(
            "A WhatsApp integration already exists".to_string(),
        )
        .into());
    }

    let user_id = ctx.user_id();
    let integration = DatabaseTransaction::run(pool.get_ref(), move |tx| {
        Box::pin(async move {
            let integration = whatsapp_repo::create_integration(tx, &input).await?;
            log_config_change(tx, integration.id, "Integration created", user_id).await?;
            Ok(integration)
        })
    })
    .await?;

    log::info!(
        "WhatsApp integration {} created by admin {}",
        integration.id,
        ctx.user_id()
    );

    Ok(ApiResponse::created(WhatsappIntegrationInfo::from(integration)))
}

pub async fn update_integration(
    ctx: UserContext,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
    input: web::Json<WhatsappIntegrationUpdate>,
) -> Result<HttpResponse> {
    ctx.requires_admin()?;
    let integration_id = path.into_inner();
    let input = input.into_inner();
    validation::validate_whatsapp_update(&input)?;

    let user_id = ctx.user_id();
    let integration = DatabaseTransaction::run(pool.get_ref(), move |tx| {
        Box::pin(async move {
            let integration = whatsapp_repo::update_integration(tx, integration_id, &input)
                .await?
                .ok_or_else(|| AppError::NotFound("WhatsApp integration not found".to_string()))?;
            log_config_change(tx, integration.id, "Integration updated", user_id).await?;
            Ok(integration)
        })
    })
    .await?;

    log::info!(
        "WhatsApp integration {} updated by admin {}",
        integration.id,
        ctx.user_id()
    );

    Ok(ApiResponse::success(WhatsappIntegrationInfo::from(integration)))
}

/// Removes the integration together with its log rows, config history included
pub async fn delete_integration(
    ctx: UserContext,
    whatsapp: web::Data<WhatsappRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    ctx.requires_admin()?;
    let integration_id = path.into_inner();

    let deleted = whatsapp
        .delete_integration(integration_id)
        .await
        .map_err(AppError::from)?;
    if !deleted {
        return Err(AppError::NotFound("WhatsApp integration not found".to_string()).into());
    }

    log::info!(
        "WhatsApp integration {} deleted by admin {}",
        integration_id,
        ctx.user_id()
    );
    Ok(ApiResponse::success_message("WhatsApp integration deleted"))
}

pub async fn get_logs(
    ctx: UserContext,
    whatsapp: web::Data<WhatsappRepository>,
    query: web::Query<WhatsappLogQuery>,
) -> Result<HttpResponse> {
    ctx.requires_admin()?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT);

    let logs = whatsapp.get_logs(limit).await.map_err(AppError::from)?;
    Ok(ApiResponse::success(logs))
}
