use actix_web::{HttpResponse, Result, web};
use chrono::Utc;
use sqlx::PgPool;

use crate::database::models::{
    DEFAULT_TASK_COLOR, NewTask, Task, TaskInput, TaskListQuery, TaskUpdate,
};
use crate::database::repositories::{
    ProjectRepository, TaskItemRepository, TaskRepository, TimeEntryRepository,
    task as task_repo, task_item as item_repo, time_entry as entry_repo,
};
use crate::database::transaction::DatabaseTransaction;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{ProvisioningService, UserContext, access, stats, validation};

/// What the caller needs to be allowed on a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaskAccess {
    View,
    Edit,
}

pub(crate) async fn load_task(tasks: &TaskRepository, task_id: i32) -> Result<Task, AppError> {
    tasks.get_task_by_id(task_id).await?.ok_or_else(|| {
        log::warn!("Task {} not found", task_id);
        AppError::NotFound("Task not found".to_string())
    })
}

/// Loads a task and checks the caller's rights on it
pub(crate) async fn require_task(
    tasks: &TaskRepository,
    projects: &ProjectRepository,
    ctx: &UserContext,
    task_id: i32,
    needed: TaskAccess,
) -> Result<Task, AppError> {
    let task = load_task(tasks, task_id).await?;
    let permissions = access::task_access(projects, &ctx.user, &task).await?;

    let allowed = match needed {
        TaskAccess::View => permissions.view,
        TaskAccess::Edit => permissions.edit,
    };
    if !allowed {
        log::warn!(
            "User {} denied {:?} access to task {}",
            ctx.user_id(),
            needed,
            task_id
        );
        return Err(AppError::PermissionDenied(
            "You do not have access to this task".to_string(),
        ));
    }

    Ok(task)
}

/// The caller must be able to view the project a task is placed in
async fn require_target_project(
    projects: &ProjectRepository,
    ctx: &UserContext,
    project_id: i32,
) -> Result<(), AppError> {
    let project = projects
        .get_project_by_id(project_id)
        .await?
        .filter(|project| project.is_active)
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let permissions = access::project_permissions(projects, &ctx.user, &project).await?;
    if !permissions.view {
        log::warn!(
            "User {} cannot place tasks in project {}",
            ctx.user_id(),
            project_id
        );
        return Err(AppError::PermissionDenied(
            "You do not have access to this project".to_string(),
        ));
    }
    Ok(())
}

pub async fn list_tasks(
    ctx: UserContext,
    tasks: web::Data<TaskRepository>,
    entries: web::Data<TimeEntryRepository>,
    items: web::Data<TaskItemRepository>,
    query: web::Query<TaskListQuery>,
) -> Result<HttpResponse> {
    let scope = (!ctx.is_admin()).then(|| ctx.user_id());

    let visible = tasks
        .get_visible_tasks(scope, &query)
        .await
        .map_err(|e| {
            log::error!("Failed to list tasks for user {}: {}", ctx.user_id(), e);
            AppError::from(e)
        })?;

    let ids: Vec<i32> = visible.iter().map(|task| task.id).collect();
    let task_entries = entries
        .get_entries_for_tasks(&ids)
        .await
        .map_err(AppError::from)?;
    let task_items = items
        .get_items_for_tasks(&ids)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(stats::tasks_with_stats(
        visible,
        &task_entries,
        &task_items,
        Utc::now(),
    )))
}

pub async fn get_task(
    ctx: UserContext,
    tasks: web::Data<TaskRepository>,
    projects: web::Data<ProjectRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let task = require_task(&tasks, &projects, &ctx, path.into_inner(), TaskAccess::View).await?;
    Ok(ApiResponse::success(task))
}

/// Tasks without a project land in the caller's personal project
pub async fn create_task(
    ctx: UserContext,
    provisioning: web::Data<ProvisioningService>,
    projects: web::Data<ProjectRepository>,
    tasks: web::Data<TaskRepository>,
    input: web::Json<TaskInput>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    validation::validate_task(&input)?;

    let project_id = match input.project_id {
        Some(project_id) => {
            require_target_project(&projects, &ctx, project_id).await?;
            project_id
        }
        None => {
            let (project, _) = provisioning
                .ensure_personal_project(&ctx.user)
                .await
                .map_err(AppError::from)?;
            project.id
        }
    };

    let task = tasks
        .create_task(&NewTask {
            name: input.name.trim().to_string(),
            description: input.description,
            color: input
                .color
                .unwrap_or_else(|| DEFAULT_TASK_COLOR.to_string()),
            estimated_hours: input.estimated_hours,
            deadline: input.deadline,
            is_active: input.is_active.unwrap_or(true),
            source: input.source.trim().to_string(),
            user_id: ctx.user_id(),
            project_id,
        })
        .await
        .map_err(AppError::from)?;

    log::info!(
        "Task {} created in project {} by user {}",
        task.id,
        project_id,
        ctx.user_id()
    );
    Ok(ApiResponse::created(task))
}

pub async fn update_task(
    ctx: UserContext,
    tasks: web::Data<TaskRepository>,
    projects: web::Data<ProjectRepository>,
    path: web::Path<i32>,
    input: web::Json<TaskUpdate>,
) -> Result<HttpResponse> {
    let task_id = path.into_inner();
    let mut input = input.into_inner();
    validation::validate_task_update(&input)?;
    input.name = input.name.map(|name| name.trim().to_string());

    let task = require_task(&tasks, &projects, &ctx, task_id, TaskAccess::Edit).await?;

    if let Some(target) = input.project_id {
        if task.project_id != Some(target) {
            require_target_project(&projects, &ctx, target).await?;
        }
    }

    let updated = tasks
        .update_task(task_id, &input)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    log::info!("Task {} updated by user {}", task_id, ctx.user_id());
    Ok(ApiResponse::success(updated))
}

/// Soft delete; running timers on the task are stopped
pub async fn delete_task(
    ctx: UserContext,
    pool: web::Data<PgPool>,
    tasks: web::Data<TaskRepository>,
    projects: web::Data<ProjectRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let task_id = path.into_inner();
    require_task(&tasks, &projects, &ctx, task_id, TaskAccess::Edit).await?;

    let now = Utc::now();
    let stopped = DatabaseTransaction::run(pool.get_ref(), |tx| {
        Box::pin(async move {
            task_repo::deactivate_task(tx, task_id).await?;
            Ok(entry_repo::stop_running_for_task(tx, task_id, now).await?)
        })
    })
    .await?;

    log::info!(
        "Task {} deleted by user {} ({} timers stopped)",
        task_id,
        ctx.user_id(),
        stopped
    );
    Ok(ApiResponse::success_message("Task deleted"))
}

/// Marks the task done, checks off its items and stops its timers
pub async fn complete_task(
    ctx: UserContext,
    pool: web::Data<PgPool>,
    tasks: web::Data<TaskRepository>,
    projects: web::Data<ProjectRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let task_id = path.into_inner();
    require_task(&tasks, &projects, &ctx, task_id, TaskAccess::Edit).await?;

    let now = Utc::now();
    let task = DatabaseTransaction::run(pool.get_ref(), |tx| {
        Box::pin(async move {
            let task = task_repo::mark_completed(tx, task_id, now)
                .await?
                .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;
            item_repo::complete_items(tx, task_id).await?;
            entry_repo::stop_running_for_task(tx, task_id, now).await?;
            Ok(task)
        })
    })
    .await?;

    log::info!("Task {} completed by user {}", task_id, ctx.user_id());
    Ok(ApiResponse::success(task))
}

pub async fn reopen_task(
    ctx: UserContext,
    tasks: web::Data<TaskRepository>,
    projects: web::Data<ProjectRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let task_id = path.into_inner();
    require_task(&tasks, &projects, &ctx, task_id, TaskAccess::Edit).await?;

    let task = tasks
        .reopen_task(task_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    log::info!("Task {} reopened by user {}", task_id, ctx.user_id());
    Ok(ApiResponse::success(task))
}
