use actix_web::{HttpResponse, Result, web};
use chrono::{Days, NaiveTime, Utc};

use crate::database::models::{DailyQuery, ReportRangeQuery};
use crate::database::repositories::{TaskRepository, TimeEntryRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{UserContext, stats};

pub async fn dashboard(
    ctx: UserContext,
    tasks: web::Data<TaskRepository>,
    entries: web::Data<TimeEntryRepository>,
) -> Result<HttpResponse> {
    let now = Utc::now();
    let user_id = ctx.user_id();

    let active_tasks = tasks
        .get_user_active_tasks(user_id)
        .await
        .map_err(|e| {
            log::error!("Failed to load dashboard tasks for user {}: {}", user_id, e);
            AppError::from(e)
        })?;

    // the week can start in the previous month
    let since = stats::start_of_week(now).min(stats::start_of_month(now));
    let recent = entries
        .get_user_entries(user_id, Some(since), None)
        .await
        .map_err(AppError::from)?;

    let ids: Vec<i32> = active_tasks.iter().map(|task| task.id).collect();
    let task_entries = entries
        .get_entries_for_tasks(&ids)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(stats::dashboard(
        &active_tasks,
        &recent,
        &task_entries,
        now,
    )))
}

pub async fn time_by_task(
    ctx: UserContext,
    tasks: web::Data<TaskRepository>,
    entries: web::Data<TimeEntryRepository>,
    query: web::Query<ReportRangeQuery>,
) -> Result<HttpResponse> {
    let user_entries = entries
        .get_user_entries(ctx.user_id(), query.start_date, query.end_date)
        .await
        .map_err(AppError::from)?;

    let mut ids: Vec<i32> = user_entries.iter().map(|entry| entry.task_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let entry_tasks = tasks.get_tasks_by_ids(&ids).await.map_err(AppError::from)?;

    Ok(ApiResponse::success(stats::time_by_task(
        &entry_tasks,
        &user_entries,
        Utc::now(),
    )))
}

/// One zero-filled row per day of an inclusive date range
pub async fn daily(
    ctx: UserContext,
    entries: web::Data<TimeEntryRepository>,
    query: web::Query<DailyQuery>,
) -> Result<HttpResponse> {
    let (Some(start), Some(end)) = (query.start_date, query.end_date) else {
        return Err(
            AppError::BadRequest("startDate and endDate are required".to_string()).into(),
        );
    };

    if end < start {
        return Err(AppError::BadRequest("endDate must not be before startDate".to_string()).into());
    }
    if (end - start).num_days() + 1 > stats::MAX_DAILY_RANGE_DAYS {
        return Err(AppError::BadRequest(format!(
            "Date range cannot exceed {} days",
            stats::MAX_DAILY_RANGE_DAYS
        ))
        .into());
    }

    let from = start.and_time(NaiveTime::MIN).and_utc();
    let until = end
        .checked_add_days(Days::new(1))
        .unwrap_or(end)
        .and_time(NaiveTime::MIN)
        .and_utc();

    let user_entries = entries
        .get_user_entries(ctx.user_id(), Some(from), Some(until))
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(stats::daily_totals(
        &user_entries,
        start,
        end,
        Utc::now(),
    )))
}
