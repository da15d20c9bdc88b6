use actix_web::{HttpResponse, Result, web};
use sqlx::PgPool;

use crate::database::models::{Team, TeamInput, TeamUpdate, TeamUserInput};
use crate::database::repositories::{
    ProjectRepository, TeamRepository, UserRepository, team as team_repo,
};
use crate::database::transaction::DatabaseTransaction;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{UserContext, access, validation};

async fn load_team(teams: &TeamRepository, team_id: i32) -> Result<Team, AppError> {
    teams.get_team_by_id(team_id).await?.ok_or_else(|| {
        log::warn!("Team {} not found", team_id);
        AppError::NotFound("Team not found".to_string())
    })
}

/// Members, managers and admins can read a team
async fn require_team_view(
    teams: &TeamRepository,
    ctx: &UserContext,
    team_id: i32,
) -> Result<Team, AppError> {
    let team = load_team(teams, team_id).await?;
    let role = access::team_role(teams, &ctx.user, team_id).await?;
    if !access::can_view_team(&ctx.user, role) {
        log::warn!("User {} denied access to team {}", ctx.user_id(), team_id);
        return Err(AppError::PermissionDenied(
            "You are not a member of this team".to_string(),
        ));
    }
    Ok(team)
}

/// Managers and admins can change a team
async fn require_team_manager(
    teams: &TeamRepository,
    ctx: &UserContext,
    team_id: i32,
) -> Result<Team, AppError> {
    let team = load_team(teams, team_id).await?;
    let role = access::team_role(teams, &ctx.user, team_id).await?;
    if !access::can_manage_team(&ctx.user, role) {
        log::warn!("User {} denied management of team {}", ctx.user_id(), team_id);
        return Err(AppError::PermissionDenied(
            "Only team managers can do this".to_string(),
        ));
    }
    Ok(team)
}

async fn require_user(users: &UserRepository, user_id: i32) -> Result<(), AppError> {
    match users.find_by_id(user_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound("User not found".to_string())),
    }
}

pub async fn list_teams(
    ctx: UserContext,
    teams: web::Data<TeamRepository>,
) -> Result<HttpResponse> {
    let result = if ctx.is_admin() {
        teams.get_all_teams().await
    } else {
        teams.get_user_teams(ctx.user_id()).await
    };

    let list = result.map_err(|e| {
        log::error!("Failed to list teams for user {}: {}", ctx.user_id(), e);
        AppError::from(e)
    })?;

    Ok(ApiResponse::success(list))
}

pub async fn managed_teams(
    ctx: UserContext,
    teams: web::Data<TeamRepository>,
) -> Result<HttpResponse> {
    let list = teams
        .get_managed_teams(ctx.user_id())
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(list))
}

/// The creator becomes member and manager in the same transaction
pub async fn create_team(
    ctx: UserContext,
    pool: web::Data<PgPool>,
    input: web::Json<TeamInput>,
) -> Result<HttpResponse> {
    let mut input = input.into_inner();
    validation::validate_team(&input)?;
    input.name = input.name.trim().to_string();

    let creator_id = ctx.user_id();
    let team = DatabaseTransaction::run(pool.get_ref(), |tx| {
        Box::pin(async move {
            let team = team_repo::insert_team(tx, &input).await?;
            team_repo::insert_member(tx, team.id, creator_id).await?;
            team_repo::insert_manager(tx, team.id, creator_id).await?;
            Ok(team)
        })
    })
    .await?;

    log::info!("Team {} '{}' created by user {}", team.id, team.name, creator_id);
    Ok(ApiResponse::created(team))
}

pub async fn get_team(
    ctx: UserContext,
    teams: web::Data<TeamRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let team = require_team_view(&teams, &ctx, path.into_inner()).await?;
    Ok(ApiResponse::success(team))
}

pub async fn update_team(
    ctx: UserContext,
    teams: web::Data<TeamRepository>,
    path: web::Path<i32>,
    input: web::Json<TeamUpdate>,
) -> Result<HttpResponse> {
    let team_id = path.into_inner();
    let mut input = input.into_inner();
    validation::validate_team_update(&input)?;
    input.name = input.name.map(|name| name.trim().to_string());

    require_team_manager(&teams, &ctx, team_id).await?;

    let team = teams
        .update_team(team_id, &input)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

    log::info!("Team {} updated by user {}", team_id, ctx.user_id());
    Ok(ApiResponse::success(team))
}

pub async fn delete_team(
    ctx: UserContext,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    ctx.requires_admin()?;
    let team_id = path.into_inner();

    let deleted = DatabaseTransaction::run(pool.get_ref(), |tx| {
        Box::pin(async move { Ok(team_repo::delete_team_cascade(tx, team_id).await?) })
    })
    .await?;

    if !deleted {
        return Err(AppError::NotFound("Team not found".to_string()).into());
    }

    log::info!("Team {} deleted by admin {}", team_id, ctx.user_id());
    Ok(ApiResponse::success_message("Team deleted"))
}

pub async fn get_members(
    ctx: UserContext,
    teams: web::Data<TeamRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let team_id = path.into_inner();
    require_team_view(&teams, &ctx, team_id).await?;

    let members = teams
        .get_team_member_users(team_id)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(members))
}

pub async fn add_member(
    ctx: UserContext,
    teams: web::Data<TeamRepository>,
    users: web::Data<UserRepository>,
    path: web::Path<i32>,
    input: web::Json<TeamUserInput>,
) -> Result<HttpResponse> {
    let team_id = path.into_inner();
    require_team_manager(&teams, &ctx, team_id).await?;
    require_user(&users, input.user_id).await?;

    let member = teams
        .add_team_member(team_id, input.user_id)
        .await
        .map_err(AppError::from)?;

    log::info!(
        "User {} added to team {} by {}",
        input.user_id,
        team_id,
        ctx.user_id()
    );
    Ok(ApiResponse::created(member))
}

pub async fn remove_member(
    ctx: UserContext,
    teams: web::Data<TeamRepository>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    let (team_id, user_id) = path.into_inner();
    require_team_manager(&teams, &ctx, team_id).await?;

    let removed = teams
        .remove_team_member(team_id, user_id)
        .await
        .map_err(AppError::from)?;
    if !removed {
        return Err(AppError::NotFound("User is not a member of this team".to_string()).into());
    }

    log::info!("User {} removed from team {} by {}", user_id, team_id, ctx.user_id());
    Ok(ApiResponse::success_message("Member removed"))
}

pub async fn get_managers(
    ctx: UserContext,
    teams: web::Data<TeamRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let team_id = path.into_inner();
    require_team_view(&teams, &ctx, team_id).await?;

    let managers = teams
        .get_team_manager_users(team_id)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(managers))
}

/// New managers are made members as well
pub async fn add_manager(
    ctx: UserContext,
    teams: web::Data<TeamRepository>,
    users: web::Data<UserRepository>,
    path: web::Path<i32>,
    input: web::Json<TeamUserInput>,
) -> Result<HttpResponse> {
    let team_id = path.into_inner();
    require_team_manager(&teams, &ctx, team_id).await?;
    require_user(&users, input.user_id).await?;

    teams
        .add_team_member(team_id, input.user_id)
        .await
        .map_err(AppError::from)?;
    let manager = teams
        .add_team_manager(team_id, input.user_id)
        .await
        .map_err(AppError::from)?;

    log::info!(
        "User {} made manager of team {} by {}",
        input.user_id,
        team_id,
        ctx.user_id()
    );
    Ok(ApiResponse::created(manager))
}

pub async fn remove_manager(
    ctx: UserContext,
    teams: web::Data<TeamRepository>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    let (team_id, user_id) = path.into_inner();
    require_team_manager(&teams, &ctx, team_id).await?;

    let removed = teams
        .remove_team_manager(team_id, user_id)
        .await
        .map_err(AppError::from)?;
    if !removed {
        return Err(AppError::NotFound("User is not a manager of this team".to_string()).into());
    }

    log::info!(
        "User {} is no longer manager of team {} ({})",
        user_id,
        team_id,
        ctx.user_id()
    );
    Ok(ApiResponse::success_message("Manager removed"))
}

pub async fn get_team_projects(
    ctx: UserContext,
    teams: web::Data<TeamRepository>,
    projects: web::Data<ProjectRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let team_id = path.into_inner();
    require_team_view(&teams, &ctx, team_id).await?;

    let list = projects
        .get_projects_for_team(team_id)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(list))
}
