use actix_web::{HttpResponse, Result, web};

use crate::database::models::{
    ApiKeyResponse, ChangePasswordInput, LoginInput, RecoverPasswordInput, RecoveryKeyResponse,
    ResetPasswordInput, SetupInput, SetupStatus, UserInfo,
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{AuthService, UserContext, validation};

pub async fn status(auth: web::Data<AuthService>) -> Result<HttpResponse> {
    let initialized = auth.is_initialized().await.map_err(AppError::from)?;
    Ok(ApiResponse::success(SetupStatus { initialized }))
}

pub async fn setup(
    auth: web::Data<AuthService>,
    input: web::Json<SetupInput>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    validation::validate_setup(&input)?;

    let response = auth.setup(input).await.map_err(|e| {
        log::warn!("Initial setup rejected: {}", e);
        AppError::from(e)
    })?;

    Ok(ApiResponse::created(response))
}

pub async fn login(
    auth: web::Data<AuthService>,
    input: web::Json<LoginInput>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    if input.username.trim().is_empty() || input.password.is_empty() {
        return Err(AppError::BadRequest("Username and password are required".to_string()).into());
    }

    let response = auth.login(input).await.map_err(AppError::from)?;
    Ok(ApiResponse::success(response))
}

pub async fn me(ctx: UserContext) -> Result<HttpResponse> {
    Ok(ApiResponse::success(UserInfo::from(ctx.user)))
}

pub async fn change_password(
    auth: web::Data<AuthService>,
    ctx: UserContext,
    input: web::Json<ChangePasswordInput>,
) -> Result<HttpResponse> {
    validation::validate_password("newPassword", &input.new_password)?;

    auth.change_password(&ctx.user, &input)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success_message("Password updated"))
}

pub async fn reset_password(
    auth: web::Data<AuthService>,
    input: web::Json<ResetPasswordInput>,
) -> Result<HttpResponse> {
    validation::validate_password("newPassword", &input.new_password)?;

    auth.reset_password(&input).await.map_err(AppError::from)?;

    Ok(ApiResponse::success_message("Password has been reset"))
}

pub async fn recover(
    auth: web::Data<AuthService>,
    input: web::Json<RecoverPasswordInput>,
) -> Result<HttpResponse> {
    validation::validate_password("newPassword", &input.new_password)?;

    let recovery_key = auth.recover(&input).await.map_err(AppError::from)?;

    Ok(ApiResponse::success(RecoveryKeyResponse { recovery_key }))
}

pub async fn regenerate_api_key(
    auth: web::Data<AuthService>,
    ctx: UserContext,
) -> Result<HttpResponse> {
    let api_key = auth
        .regenerate_api_key(ctx.user_id())
        .await
        .map_err(|e| {
            log::error!("Failed to rotate API key for user {}: {}", ctx.user_id(), e);
            AppError::from(e)
        })?;

    log::info!("API key rotated for user {}", ctx.user_id());
    Ok(ApiResponse::success(ApiKeyResponse { api_key }))
}

pub async fn regenerate_recovery_key(
    auth: web::Data<AuthService>,
    ctx: UserContext,
) -> Result<HttpResponse> {
    let recovery_key = auth
        .regenerate_recovery_key(ctx.user_id())
        .await
        .map_err(|e| {
            log::error!(
                "Failed to rotate recovery key for user {}: {}",
                ctx.user_id(),
                e
            );
            AppError::from(e)
        })?;

    log::info!("Recovery key rotated for user {}", ctx.user_id());
    Ok(ApiResponse::success(RecoveryKeyResponse { recovery_key }))
}
