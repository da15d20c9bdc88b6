use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub id: i32,
    pub enable_daily_report: bool,
    pub daily_report_time: Option<String>,
    pub enable_weekly_report: bool,
    pub weekly_report_day: Option<i32>,
    pub enable_deadline_reminders: bool,
    pub reminder_hours_before: Option<i32>,
    pub enable_timer_reminders: bool,
    pub timer_reminder_interval: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationSettings {
    /// Values served before anything has been saved; id 0 marks "not persisted"
    pub fn defaults(now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            enable_daily_report: false,
            daily_report_time: Some("18:00".to_string()),
            enable_weekly_report: false,
            weekly_report_day: Some(5),
            enable_deadline_reminders: true,
            reminder_hours_before: Some(24),
            enable_timer_reminders: false,
            timer_reminder_interval: Some(120),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: &NotificationSettingsInput) {
        if let Some(value) = input.enable_daily_report {
            self.enable_daily_report = value;
        }
        if let Some(ref value) = input.daily_report_time {
            self.daily_report_time = Some(value.clone());
        }
        if let Some(value) = input.enable_weekly_report {
            self.enable_weekly_report = value;
        }
        if let Some(value) = input.weekly_report_day {
            self.weekly_report_day = Some(value);
        }
        if let Some(value) = input.enable_deadline_reminders {
            self.enable_deadline_reminders = value;
        }
        if let Some(value) = input.reminder_hours_before {
            self.reminder_hours_before = Some(value);
        }
        if let Some(value) = input.enable_timer_reminders {
            self.enable_timer_reminders = value;
        }
        if let Some(value) = input.timer_reminder_interval {
            self.timer_reminder_interval = Some(value);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettingsInput {
    pub enable_daily_report: Option<bool>,
    pub daily_report_time: Option<String>,
    pub enable_weekly_report: Option<bool>,
    pub weekly_report_day: Option<i32>,
    pub enable_deadline_reminders: Option<bool>,
    pub reminder_hours_before: Option<i32>,
    pub enable_timer_reminders: Option<bool>,
    pub timer_reminder_interval: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_only_touches_present_fields() {
        let mut settings = NotificationSettings::defaults(Utc::now());
        settings.apply(&NotificationSettingsInput {
            enable_daily_report: Some(true),
            daily_report_time: Some("07:30".to_string()),
            ..Default::default()
        });

        assert!(settings.enable_daily_report);
        assert_eq!(settings.daily_report_time.as_deref(), Some("07:30"));
        assert_eq!(settings.weekly_report_day, Some(5));
        assert_eq!(settings.timer_reminder_interval, Some(120));
        assert!(settings.enable_deadline_reminders);
    }
}
