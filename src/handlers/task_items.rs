use actix_web::{HttpResponse, Result, web};

use crate::database::models::{TaskItem, TaskItemInput, TaskItemUpdate};
use crate::database::repositories::{ProjectRepository, TaskItemRepository, TaskRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::handlers::tasks::{TaskAccess, require_task};
use crate::services::{UserContext, validation};

/// Authors need view rights on the parent task to change their own items,
/// everyone else needs edit rights
async fn require_item(
    items: &TaskItemRepository,
    tasks: &TaskRepository,
    projects: &ProjectRepository,
    ctx: &UserContext,
    item_id: i32,
) -> Result<TaskItem, AppError> {
    let item = items
        .get_item_by_id(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task item not found".to_string()))?;

    let needed = if item.user_id == ctx.user_id() {
        TaskAccess::View
    } else {
        TaskAccess::Edit
    };
    require_task(tasks, projects, ctx, item.task_id, needed).await?;

    Ok(item)
}

pub async fn list_items(
    ctx: UserContext,
    tasks: web::Data<TaskRepository>,
    projects: web::Data<ProjectRepository>,
    items: web::Data<TaskItemRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let task_id = path.into_inner();
    require_task(&tasks, &projects, &ctx, task_id, TaskAccess::View).await?;

    let list = items
        .get_items_for_task(task_id)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(list))
}

pub async fn create_item(
    ctx: UserContext,
    tasks: web::Data<TaskRepository>,
    projects: web::Data<ProjectRepository>,
    items: web::Data<TaskItemRepository>,
    path: web::Path<i32>,
    input: web::Json<TaskItemInput>,
) -> Result<HttpResponse> {
    let task_id = path.into_inner();
    validation::validate_item_title(&input.title)?;
    require_task(&tasks, &projects, &ctx, task_id, TaskAccess::View).await?;

    let item = items
        .create_item(task_id, ctx.user_id(), &input)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::created(item))
}

pub async fn complete_all_items(
    ctx: UserContext,
    tasks: web::Data<TaskRepository>,
    projects: web::Data<ProjectRepository>,
    items: web::Data<TaskItemRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let task_id = path.into_inner();
    require_task(&tasks, &projects, &ctx, task_id, TaskAccess::Edit).await?;

    let completed = items
        .complete_all_items(task_id)
        .await
        .map_err(AppError::from)?;

    log::info!(
        "All items of task {} completed by user {}",
        task_id,
        ctx.user_id()
    );
    Ok(ApiResponse::success(completed))
}

pub async fn update_item(
    ctx: UserContext,
    tasks: web::Data<TaskRepository>,
    projects: web::Data<ProjectRepository>,
    items: web::Data<TaskItemRepository>,
    path: web::Path<i32>,
    input: web::Json<TaskItemUpdate>,
) -> Result<HttpResponse> {
    let item_id = path.into_inner();
    let mut input = input.into_inner();
    if let Some(ref title) = input.title {
        validation::validate_item_title(title)?;
    }
    input.title = input.title.map(|title| title.trim().to_string());

    require_item(&items, &tasks, &projects, &ctx, item_id).await?;

    let item = items
        .update_item(item_id, &input)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Task item not found".to_string()))?;

    Ok(ApiResponse::success(item))
}

pub async fn delete_item(
    ctx: UserContext,
    tasks: web::Data<TaskRepository>,
    projects: web::Data<ProjectRepository>,
    items: web::Data<TaskItemRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let item_id = path.into_inner();
    require_item(&items, &tasks, &projects, &ctx, item_id).await?;

    if !items.delete_item(item_id).await.map_err(AppError::from)? {
        return Err(AppError::NotFound("Task item not found".to_string()).into());
    }

    Ok(ApiResponse::success_message("Task item deleted"))
}
