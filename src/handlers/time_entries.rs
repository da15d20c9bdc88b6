use std::collections::HashMap;

use actix_web::{HttpResponse, Result, web};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::database::models::{
    DeletedCount, NewTimeEntry, StartTimerInput, Task, TimeEntry, TimeEntryInput,
    TimeEntryQuery, TimeEntryUpdate, TimeEntryWithTask,
};
use crate::database::repositories::{
    ProjectRepository, TaskRepository, TimeEntryRepository, time_entry as entry_repo,
    time_entry::EntryChanges,
};
use crate::database::transaction::DatabaseTransaction;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::handlers::tasks::{TaskAccess, load_task, require_task};
use crate::services::{UserContext, access, validation};

/// Pairs each entry with its task
async fn with_tasks(
    tasks: &TaskRepository,
    entries: Vec<TimeEntry>,
) -> Result<Vec<TimeEntryWithTask>, AppError> {
    let mut ids: Vec<i32> = entries.iter().map(|entry| entry.task_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let by_id: HashMap<i32, Task> = tasks
        .get_tasks_by_ids(&ids)
        .await?
        .into_iter()
        .map(|task| (task.id, task))
        .collect();

    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            let task = by_id.get(&entry.task_id)?.clone();
            Some(TimeEntryWithTask { entry, task })
        })
        .collect())
}

async fn with_task(tasks: &TaskRepository, entry: TimeEntry) -> Result<TimeEntryWithTask, AppError> {
    let task = load_task(tasks, entry.task_id).await?;
    Ok(TimeEntryWithTask { entry, task })
}

async fn require_entry(
    entries: &TimeEntryRepository,
    ctx: &UserContext,
    entry_id: i32,
) -> Result<TimeEntry, AppError> {
    let entry = entries.get_entry_by_id(entry_id).await?.ok_or_else(|| {
        log::warn!("Time entry {} not found", entry_id);
        AppError::NotFound("Time entry not found".to_string())
    })?;

    if !access::can_access_entry(&ctx.user, &entry) {
        log::warn!("User {} denied access to time entry {}", ctx.user_id(), entry_id);
        return Err(AppError::PermissionDenied(
            "You do not have access to this time entry".to_string(),
        ));
    }

    Ok(entry)
}

/// Time goes only on visible tasks that are still open
async fn require_trackable_task(
    tasks: &TaskRepository,
    projects: &ProjectRepository,
    ctx: &UserContext,
    task_id: i32,
) -> Result<Task, AppError> {
    let task = require_task(tasks, projects, ctx, task_id, TaskAccess::View).await?;
    if !task.accepts_time() {
        return Err(AppError::BadRequest(
            "Time cannot be tracked on a completed or deleted task".to_string(),
        ));
    }
    Ok(task)
}

/// Stops the user's running timer and starts a new one in one transaction
async fn start_running_entry(
    pool: &PgPool,
    user_id: i32,
    task_id: i32,
    start_time: DateTime<Utc>,
    notes: Option<String>,
) -> Result<TimeEntry, AppError> {
    let now = Utc::now();
    DatabaseTransaction::run(pool, |tx| {
        Box::pin(async move {
            let stopped = entry_repo::stop_running_for_user(tx, user_id, now).await?;
            if stopped > 0 {
                log::info!("Stopped {} running timer(s) of user {}", stopped, user_id);
            }
            let entry = entry_repo::insert_entry(
                tx,
                &NewTimeEntry {
                    task_id,
                    user_id,
                    start_time,
                    end_time: None,
                    duration: None,
                    is_running: true,
                    notes,
                },
            )
            .await?;
            Ok(entry)
        })
    })
    .await
}

pub async fn list_entries(
    ctx: UserContext,
    entries: web::Data<TimeEntryRepository>,
    tasks: web::Data<TaskRepository>,
    query: web::Query<TimeEntryQuery>,
) -> Result<HttpResponse> {
    let user_id = match query.user_id {
        Some(user_id) if user_id != ctx.user_id() => {
            ctx.requires_admin()?;
            user_id
        }
        _ => ctx.user_id(),
    };

    let list = entries
        .get_user_entries(user_id, query.start_date, query.end_date)
        .await
        .map_err(|e| {
            log::error!("Failed to list time entries of user {}: {}", user_id, e);
            AppError::from(e)
        })?;

    Ok(ApiResponse::success(with_tasks(&tasks, list).await?))
}

pub async fn running_entries(
    ctx: UserContext,
    entries: web::Data<TimeEntryRepository>,
    tasks: web::Data<TaskRepository>,
    query: web::Query<TimeEntryQuery>,
) -> Result<HttpResponse> {
    let scope = if ctx.is_admin() && query.all.unwrap_or(false) {
        None
    } else {
        Some(ctx.user_id())
    };

    let running = entries
        .get_running_entries(scope)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(with_tasks(&tasks, running).await?))
}

pub async fn task_entries(
    ctx: UserContext,
    entries: web::Data<TimeEntryRepository>,
    tasks: web::Data<TaskRepository>,
    projects: web::Data<ProjectRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let task_id = path.into_inner();
    let task = require_task(&tasks, &projects, &ctx, task_id, TaskAccess::View).await?;

    let list = entries
        .get_entries_for_task(task_id)
        .await
        .map_err(AppError::from)?
        .into_iter()
        .map(|entry| TimeEntryWithTask {
            entry,
            task: task.clone(),
        })
        .collect::<Vec<_>>();

    Ok(ApiResponse::success(list))
}

pub async fn get_entry(
    ctx: UserContext,
    entries: web::Data<TimeEntryRepository>,
    tasks: web::Data<TaskRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let entry = require_entry(&entries, &ctx, path.into_inner()).await?;
    Ok(ApiResponse::success(with_task(&tasks, entry).await?))
}

/// Manual entry, or a timer start when `isRunning` is set
pub async fn create_entry(
    ctx: UserContext,
    pool: web::Data<PgPool>,
    tasks: web::Data<TaskRepository>,
    projects: web::Data<ProjectRepository>,
    input: web::Json<TimeEntryInput>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    let task = require_trackable_task(&tasks, &projects, &ctx, input.task_id).await?;
    let user_id = ctx.user_id();

    let entry = if input.is_running {
        start_running_entry(
            pool.get_ref(),
            user_id,
            task.id,
            input.start_time,
            input.notes,
        )
        .await?
    } else {
        let end_time = input.end_time.ok_or_else(|| {
            AppError::BadRequest("endTime is required for a stopped entry".to_string())
        })?;
        let duration = validation::entry_duration(input.start_time, end_time)?;

        let new_entry = NewTimeEntry {
            task_id: task.id,
            user_id,
            start_time: input.start_time,
            end_time: Some(end_time),
            duration: Some(duration),
            is_running: false,
            notes: input.notes,
        };
        DatabaseTransaction::run(pool.get_ref(), |tx| {
            Box::pin(async move { Ok(entry_repo::insert_entry(tx, &new_entry).await?) })
        })
        .await?
    };

    log::info!(
        "Time entry {} created on task {} by user {}",
        entry.id,
        task.id,
        user_id
    );
    Ok(ApiResponse::created(TimeEntryWithTask { entry, task }))
}

pub async fn start_timer(
    ctx: UserContext,
    pool: web::Data<PgPool>,
    tasks: web::Data<TaskRepository>,
    projects: web::Data<ProjectRepository>,
    input: web::Json<StartTimerInput>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    let task = require_trackable_task(&tasks, &projects, &ctx, input.task_id).await?;

    let entry = start_running_entry(
        pool.get_ref(),
        ctx.user_id(),
        task.id,
        Utc::now(),
        input.notes,
    )
    .await?;

    log::info!("Timer started on task {} by user {}", task.id, ctx.user_id());
    Ok(ApiResponse::created(TimeEntryWithTask { entry, task }))
}

pub async fn stop_timer(
    ctx: UserContext,
    entries: web::Data<TimeEntryRepository>,
    tasks: web::Data<TaskRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let entry_id = path.into_inner();
    let entry = require_entry(&entries, &ctx, entry_id).await?;
    if !entry.is_running {
        return Err(AppError::BadRequest("Time entry is not running".to_string()).into());
    }

    // None here means another request stopped it first
    let stopped = entries
        .stop_entry(entry_id, Utc::now())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::BadRequest("Time entry is not running".to_string()))?;

    log::info!(
        "Timer {} stopped by user {} after {}s",
        entry_id,
        ctx.user_id(),
        stopped.duration.unwrap_or_default()
    );
    Ok(ApiResponse::success(with_task(&tasks, stopped).await?))
}

pub async fn update_entry(
    ctx: UserContext,
    entries: web::Data<TimeEntryRepository>,
    tasks: web::Data<TaskRepository>,
    projects: web::Data<ProjectRepository>,
    path: web::Path<i32>,
    input: web::Json<TimeEntryUpdate>,
) -> Result<HttpResponse> {
    let entry_id = path.into_inner();
    let input = input.into_inner();
    let entry = require_entry(&entries, &ctx, entry_id).await?;

    let task_id = input.task_id.unwrap_or(entry.task_id);
    if task_id != entry.task_id {
        require_trackable_task(&tasks, &projects, &ctx, task_id).await?;
    }

    if entry.is_running && input.end_time.is_some() {
        return Err(AppError::BadRequest(
            "Stop the timer before setting an end time".to_string(),
        )
        .into());
    }

    let start_time = input.start_time.unwrap_or(entry.start_time);
    let end_time = input.end_time.or(entry.end_time);
    let duration = match end_time {
        Some(end_time) => Some(validation::entry_duration(start_time, end_time)?),
        None => None,
    };

    let changes = EntryChanges {
        task_id,
        start_time,
        end_time,
        duration,
        notes: input.notes.or(entry.notes),
    };

    let updated = entries
        .update_entry(entry_id, &changes)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Time entry not found".to_string()))?;

    Ok(ApiResponse::success(with_task(&tasks, updated).await?))
}

pub async fn delete_entry(
    ctx: UserContext,
    entries: web::Data<TimeEntryRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let entry_id = path.into_inner();
    require_entry(&entries, &ctx, entry_id).await?;

    if !entries.delete_entry(entry_id).await.map_err(AppError::from)? {
        return Err(AppError::NotFound("Time entry not found".to_string()).into());
    }

    Ok(ApiResponse::success_message("Time entry deleted"))
}

/// Removes every entry of the caller
pub async fn delete_all_entries(
    ctx: UserContext,
    entries: web::Data<TimeEntryRepository>,
) -> Result<HttpResponse> {
    let deleted = entries
        .delete_user_entries(ctx.user_id())
        .await
        .map_err(|e| {
            log::error!("Failed to delete entries of user {}: {}", ctx.user_id(), e);
            AppError::from(e)
        })?;

    log::info!("User {} deleted all {} time entries", ctx.user_id(), deleted);
    Ok(ApiResponse::success(DeletedCount { deleted }))
}
