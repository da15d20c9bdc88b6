use actix_web::{HttpResponse, Result, web};
use sqlx::PgPool;

use crate::database::models::{
    BindTeamInput, Project, ProjectInput, ProjectListQuery, ProjectUpdate,
};
use crate::database::repositories::{ProjectRepository, TeamRepository, project as project_repo};
use crate::database::transaction::DatabaseTransaction;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{ProvisioningService, UserContext, access, validation};

async fn load_project(projects: &ProjectRepository, project_id: i32) -> Result<Project, AppError> {
    projects.get_project_by_id(project_id).await?.ok_or_else(|| {
        log::warn!("Project {} not found", project_id);
        AppError::NotFound("Project not found".to_string())
    })
}

async fn require_project_view(
    projects: &ProjectRepository,
    ctx: &UserContext,
    project_id: i32,
) -> Result<Project, AppError> {
    let project = load_project(projects, project_id).await?;
    let permissions = access::project_permissions(projects, &ctx.user, &project).await?;
    if !permissions.view {
        log::warn!("User {} denied access to project {}", ctx.user_id(), project_id);
        return Err(AppError::PermissionDenied(
            "You do not have access to this project".to_string(),
        ));
    }
    Ok(project)
}

async fn require_project_edit(
    projects: &ProjectRepository,
    ctx: &UserContext,
    project_id: i32,
) -> Result<Project, AppError> {
    let project = load_project(projects, project_id).await?;
    let permissions = access::project_permissions(projects, &ctx.user, &project).await?;
    if !permissions.edit {
        log::warn!("User {} denied changes to project {}", ctx.user_id(), project_id);
        return Err(AppError::PermissionDenied(
            "You cannot modify this project".to_string(),
        ));
    }
    Ok(project)
}

/// Lists the caller's projects, provisioning the personal project on first use.
/// Admins may pass `?all=true` to see every project.
pub async fn list_projects(
    ctx: UserContext,
    provisioning: web::Data<ProvisioningService>,
    projects: web::Data<ProjectRepository>,
    query: web::Query<ProjectListQuery>,
) -> Result<HttpResponse> {
    if ctx.is_admin() && query.all.unwrap_or(false) {
        let all = projects.get_all_projects().await.map_err(AppError::from)?;
        return Ok(ApiResponse::success(all));
    }

    provisioning
        .ensure_personal_project(&ctx.user)
        .await
        .map_err(AppError::from)?;

    let list = projects
        .get_projects_for_user(ctx.user_id())
        .await
        .map_err(|e| {
            log::error!("Failed to list projects for user {}: {}", ctx.user_id(), e);
            AppError::from(e)
        })?;

    Ok(ApiResponse::success(list))
}

pub async fn create_project(
    ctx: UserContext,
    pool: web::Data<PgPool>,
    projects: web::Data<ProjectRepository>,
    teams: web::Data<TeamRepository>,
    input: web::Json<ProjectInput>,
) -> Result<HttpResponse> {
    let mut input = input.into_inner();
    validation::validate_project(&input)?;
    input.name = input.name.trim().to_string();

    let owner_id = if ctx.is_admin() {
        input.owner_id.unwrap_or(ctx.user_id())
    } else {
        ctx.user_id()
    };

    if input.is_personal {
        if input.team_id.is_some() {
            return Err(AppError::BadRequest(
                "Personal projects cannot be bound to a team".to_string(),
            )
            .into());
        }
        if projects
            .get_personal_project(owner_id)
            .await
            .map_err(AppError::from)?
            .is_some()
        {
            return Err(AppError::Conflict(
                "This user already has a personal project".to_string(),
            )
            .into());
        }
    }

    if let Some(team_id) = input.team_id {
        if teams
            .get_team_by_id(team_id)
            .await
            .map_err(AppError::from)?
            .is_none()
        {
            return Err(AppError::NotFound("Team not found".to_string()).into());
        }
        let role = access::team_role(&teams, &ctx.user, team_id).await?;
        if !access::can_manage_team(&ctx.user, role) {
            log::warn!(
                "User {} tried to create a project for team {} without managing it",
                ctx.user_id(),
                team_id
            );
            return Err(AppError::PermissionDenied(
                "Only team managers can add projects to a team".to_string(),
            )
            .into());
        }
    }

    let project = DatabaseTransaction::run(pool.get_ref(), |tx| {
        Box::pin(async move {
            let project = project_repo::insert_project(tx, &input, Some(owner_id)).await?;
            if let Some(team_id) = input.team_id {
                project_repo::insert_binding(tx, project.id, team_id).await?;
            }
            Ok(project)
        })
    })
    .await?;

    log::info!(
        "Project {} '{}' created by user {}",
        project.id,
        project.name,
        ctx.user_id()
    );
    Ok(ApiResponse::created(project))
}

pub async fn get_project(
    ctx: UserContext,
    projects: web::Data<ProjectRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let project = require_project_view(&projects, &ctx, path.into_inner()).await?;
    Ok(ApiResponse::success(project))
}

pub async fn update_project(
    ctx: UserContext,
    projects: web::Data<ProjectRepository>,
    path: web::Path<i32>,
    input: web::Json<ProjectUpdate>,
) -> Result<HttpResponse> {
    let project_id = path.into_inner();
    let mut input = input.into_inner();
    validation::validate_project_update(&input)?;
    input.name = input.name.map(|name| name.trim().to_string());

    let current = require_project_edit(&projects, &ctx, project_id).await?;
    if current.is_personal && input.is_active == Some(false) {
        return Err(
            AppError::BadRequest("The personal project cannot be deactivated".to_string()).into(),
        );
    }

    let project = projects
        .update_project(project_id, &input)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    log::info!("Project {} updated by user {}", project_id, ctx.user_id());
    Ok(ApiResponse::success(project))
}

/// Soft delete; the personal project stays
pub async fn delete_project(
    ctx: UserContext,
    projects: web::Data<ProjectRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let project_id = path.into_inner();
    let project = require_project_edit(&projects, &ctx, project_id).await?;

    if project.is_personal {
        return Err(AppError::BadRequest("The personal project cannot be deleted".to_string()).into());
    }

    projects
        .deactivate_project(project_id)
        .await
        .map_err(AppError::from)?;

    log::info!("Project {} deactivated by user {}", project_id, ctx.user_id());
    Ok(ApiResponse::success_message("Project deleted"))
}

pub async fn get_project_teams(
    ctx: UserContext,
    projects: web::Data<ProjectRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let project_id = path.into_inner();
    require_project_view(&projects, &ctx, project_id).await?;

    let bound = projects
        .get_project_teams(project_id)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(bound))
}

pub async fn bind_team(
    ctx: UserContext,
    projects: web::Data<ProjectRepository>,
    teams: web::Data<TeamRepository>,
    path: web::Path<i32>,
    input: web::Json<BindTeamInput>,
) -> Result<HttpResponse> {
    let project_id = path.into_inner();
    let team_id = input.team_id;
    let project = require_project_edit(&projects, &ctx, project_id).await?;

    if project.is_personal {
        return Err(AppError::BadRequest(
            "Personal projects cannot be bound to a team".to_string(),
        )
        .into());
    }

    if teams
        .get_team_by_id(team_id)
        .await
        .map_err(AppError::from)?
        .is_none()
    {
        return Err(AppError::NotFound("Team not found".to_string()).into());
    }

    let binding = projects
        .bind_project_to_team(project_id, team_id)
        .await
        .map_err(AppError::from)?;

    log::info!(
        "Project {} bound to team {} by user {}",
        project_id,
        team_id,
        ctx.user_id()
    );
    Ok(ApiResponse::created(binding))
}

pub async fn unbind_team(
    ctx: UserContext,
    projects: web::Data<ProjectRepository>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    let (project_id, team_id) = path.into_inner();
    require_project_edit(&projects, &ctx, project_id).await?;

    let removed = projects
        .unbind_project_from_team(project_id, team_id)
        .await
        .map_err(AppError::from)?;
    if !removed {
        return Err(AppError::NotFound("Project is not bound to this team".to_string()).into());
    }

    log::info!(
        "Project {} unbound from team {} by user {}",
        project_id,
        team_id,
        ctx.user_id()
    );
    Ok(ApiResponse::success_message("Team unbound from project"))
}
