use actix_web::{HttpResponse, Result, web};
use chrono::Utc;

use crate::database::models::{NotificationSettings, NotificationSettingsInput};
use crate::database::repositories::NotificationSettingsRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{UserContext, validation};

/// Stored settings, or the defaults when nothing has been saved yet
pub async fn get_settings(
    _ctx: UserContext,
    settings: web::Data<NotificationSettingsRepository>,
) -> Result<HttpResponse> {
    let current = settings
        .get_settings()
        .await
        .map_err(AppError::from)?
        .unwrap_or_else(|| NotificationSettings::defaults(Utc::now()));

    Ok(ApiResponse::success(current))
}

pub async fn update_settings(
    ctx: UserContext,
    settings: web::Data<NotificationSettingsRepository>,
    input: web::Json<NotificationSettingsInput>,
) -> Result<HttpResponse> {
    ctx.requires_admin()?;
    let input = input.into_inner();
    validation::validate_notification_settings(&input)?;

    let mut current = settings
        .get_settings()
        .await
        .map_err(AppError::from)?
        .unwrap_or_else(|| NotificationSettings::defaults(Utc::now()));
    current.apply(&input);

    let saved = settings
        .save_settings(&current)
        .await
        .map_err(|e| {
            log::error!("Failed to save notification settings: {}", e);
            AppError::from(e)
        })?;

    log::info!("Notification settings updated by admin {}", ctx.user_id());
    Ok(ApiResponse::success(saved))
}
