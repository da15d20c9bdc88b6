use actix_web::{HttpResponse, Result, web};
use sqlx::PgPool;

use crate::database::models::{
    CreateUserInput, CreatedUserResponse, ManagedTeamsInput, NewUser, UpdateUserInput, UserInfo,
    UserRole,
};
use crate::database::repositories::{TeamRepository, UserRepository, team as team_repo};
use crate::database::transaction::DatabaseTransaction;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{
    AuthService, UserContext,
    auth::{generate_api_key, generate_reset_token, hash_password},
    validation,
};

fn user_not_found(user_id: i32) -> AppError {
    log::warn!("User {} not found", user_id);
    AppError::NotFound("User not found".to_string())
}

pub async fn list_users(
    ctx: UserContext,
    users: web::Data<UserRepository>,
) -> Result<HttpResponse> {
    ctx.requires_admin()?;

    let all = users.get_all_users().await.map_err(|e| {
        log::error!("Failed to list users: {}", e);
        AppError::from(e)
    })?;

    let infos: Vec<UserInfo> = all.into_iter().map(UserInfo::from).collect();
    Ok(ApiResponse::success(infos))
}

/// Creates an account with an unusable password and a reset token the admin
/// hands over to the new user
pub async fn create_user(
    ctx: UserContext,
    auth: web::Data<AuthService>,
    users: web::Data<UserRepository>,
    input: web::Json<CreateUserInput>,
) -> Result<HttpResponse> {
    ctx.requires_admin()?;
    let input = input.into_inner();
    validation::validate_new_user(&input)?;

    let (reset_token, reset_token_expiry) = auth.new_reset_token();
    let placeholder_password = hash_password(&generate_reset_token()).map_err(AppError::from)?;

    let user = users
        .create_user(&NewUser {
            username: input.username.trim().to_string(),
            password_hash: placeholder_password,
            email: input.email.trim().to_string(),
            full_name: input.full_name.trim().to_string(),
            role: input.role.unwrap_or_default(),
            must_reset_password: true,
            reset_token: Some(reset_token.clone()),
            reset_token_expiry: Some(reset_token_expiry),
            api_key: Some(generate_api_key()),
            recovery_key_hash: None,
        })
        .await
        .map_err(AppError::from)?;

    log::info!("User {} created by admin {}", user.id, ctx.user_id());

    Ok(ApiResponse::created(CreatedUserResponse {
        user: user.into(),
        reset_token,
        reset_token_expiry,
    }))
}

pub async fn get_user(
    ctx: UserContext,
    users: web::Data<UserRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    ctx.requires_self_or_admin(user_id)?;

    let user = users
        .find_by_id(user_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| user_not_found(user_id))?;

    Ok(ApiResponse::success(UserInfo::from(user)))
}

pub async fn update_user(
    ctx: UserContext,
    users: web::Data<UserRepository>,
    path: web::Path<i32>,
    input: web::Json<UpdateUserInput>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let input = input.into_inner();
    ctx.requires_self_or_admin(user_id)?;
    validation::validate_user_update(&input)?;

    if !ctx.is_admin() && (input.role.is_some() || input.is_active.is_some()) {
        log::warn!("User {} tried to change own role or status", ctx.user_id());
        return Err(AppError::PermissionDenied(
            "Only administrators can change roles or account status".to_string(),
        )
        .into());
    }

    if ctx.is_admin()
        && user_id == ctx.user_id()
        && (input.role == Some(UserRole::User) || input.is_active == Some(false))
    {
        return Err(AppError::BadRequest(
            "Administrators cannot demote or deactivate themselves".to_string(),
        )
        .into());
    }

    let input = UpdateUserInput {
        full_name: input.full_name.map(|name| name.trim().to_string()),
        email: input.email.map(|email| email.trim().to_string()),
        ..input
    };

    let user = users
        .update_user(user_id, &input)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| user_not_found(user_id))?;

    log::info!("User {} updated by {}", user_id, ctx.user_id());
    Ok(ApiResponse::success(UserInfo::from(user)))
}

pub async fn delete_user(
    ctx: UserContext,
    users: web::Data<UserRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    ctx.requires_admin()?;
    let user_id = path.into_inner();

    if user_id == ctx.user_id() {
        return Err(AppError::BadRequest("You cannot delete your own account".to_string()).into());
    }

    let deleted = users.delete_user(user_id).await.map_err(AppError::from)?;
    if !deleted {
        return Err(user_not_found(user_id).into());
    }

    log::info!("User {} deleted by admin {}", user_id, ctx.user_id());
    Ok(ApiResponse::success_message("User deleted"))
}

pub async fn get_managed_teams(
    ctx: UserContext,
    teams: web::Data<TeamRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    ctx.requires_self_or_admin(user_id)?;

    let team_ids = teams
        .get_managed_team_ids(user_id)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(team_ids))
}

/// Replaces all manager assignments of a user in one transaction
pub async fn update_managed_teams(
    ctx: UserContext,
    pool: web::Data<PgPool>,
    users: web::Data<UserRepository>,
    teams: web::Data<TeamRepository>,
    path: web::Path<i32>,
    input: web::Json<ManagedTeamsInput>,
) -> Result<HttpResponse> {
    ctx.requires_admin()?;
    let user_id = path.into_inner();

    users
        .find_by_id(user_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| user_not_found(user_id))?;

    let mut team_ids = input.into_inner().team_ids;
    team_ids.sort_unstable();
    team_ids.dedup();

    for team_id in &team_ids {
        if teams
            .get_team_by_id(*team_id)
            .await
            .map_err(AppError::from)?
            .is_none()
        {
            return Err(AppError::NotFound(format!("Team {} not found", team_id)).into());
        }
    }

    let assigned = team_ids.clone();
    DatabaseTransaction::run(pool.get_ref(), |tx| {
        Box::pin(async move {
            team_repo::replace_managed_teams(tx, user_id, &assigned).await?;
            for team_id in &assigned {
                team_repo::insert_member(tx, *team_id, user_id).await?;
            }
            Ok(())
        })
    })
    .await?;

    log::info!(
        "Managed teams of user {} set to {:?} by admin {}",
        user_id,
        team_ids,
        ctx.user_id()
    );
    Ok(ApiResponse::success(team_ids))
}
