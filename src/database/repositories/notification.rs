use chrono::Utc;
use sqlx::PgPool;

use crate::database::{models::NotificationSettings, utils::sql};

const SETTINGS_COLUMNS: &str = r#"
    id,
    enable_daily_report,
    daily_report_time,
    enable_weekly_report,
    weekly_report_day,
    enable_deadline_reminders,
    reminder_hours_before,
    enable_timer_reminders,
    timer_reminder_interval,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct NotificationSettingsRepository {
    pool: PgPool,
}

impl NotificationSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_settings(&self) -> Result<Option<NotificationSettings>, sqlx::Error> {
        sqlx::query_as::<_, NotificationSettings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM notification_settings ORDER BY id LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await
    }

    /// Writes the full row; inserts when `settings.id` is 0
    pub async fn save_settings(
        &self,
        settings: &NotificationSettings,
    ) -> Result<NotificationSettings, sqlx::Error> {
        let now = Utc::now();

        if settings.id == 0 {
            return sqlx::query_as::<_, NotificationSettings>(&sql(&format!(
                r#"
                INSERT INTO
                    notification_settings (
                        enable_daily_report,
                        daily_report_time,
                        enable_weekly_report,
                        weekly_report_day,
                        enable_deadline_reminders,
                        reminder_hours_before,
                        enable_timer_reminders,
                        timer_reminder_interval,
                        created_at,
                        updated_at
                    )
                VALUES
                    (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                RETURNING {SETTINGS_COLUMNS}
                "#
            )))
            .bind(settings.enable_daily_report)
            .bind(&settings.daily_report_time)
            .bind(settings.enable_weekly_report)
            .bind(settings.weekly_report_day)
            .bind(settings.enable_deadline_reminders)
            .bind(settings.reminder_hours_before)
            .bind(settings.enable_timer_reminders)
            .bind(settings.timer_reminder_interval)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await;
        }

        sqlx::query_as::<_, NotificationSettings>(&sql(&format!(
            r#"
            UPDATE notification_settings
            SET
                enable_daily_report = ?,
                daily_report_time = ?,
                enable_weekly_report = ?,
                weekly_report_day = ?,
                enable_deadline_reminders = ?,
                reminder_hours_before = ?,
                enable_timer_reminders = ?,
                timer_reminder_interval = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING {SETTINGS_COLUMNS}
            "#
        )))
        .bind(settings.enable_daily_report)
        .bind(&settings.daily_report_time)
        .bind(settings.enable_weekly_report)
        .bind(settings.weekly_report_day)
        .bind(settings.enable_deadline_reminders)
        .bind(settings.reminder_hours_before)
        .bind(settings.enable_timer_reminders)
        .bind(settings.timer_reminder_interval)
        .bind(now)
        .bind(settings.id)
        .fetch_one(&self.pool)
        .await
    }
}
