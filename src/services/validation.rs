use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use url::Url;

use crate::database::models::{
    CreateUserInput, NotificationSettingsInput, ProjectInput, ProjectUpdate, SetupInput,
    TaskInput, TaskUpdate, TeamInput, TeamUpdate, UpdateUserInput, WhatsappIntegrationInput,
    WhatsappIntegrationUpdate,
};
use crate::error::{AppError, FieldError};

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MIN_FULL_NAME_LENGTH: usize = 2;
pub const MIN_PHONE_LENGTH: usize = 10;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));
static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("color pattern is valid"));
static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01]?[0-9]|2[0-3]):[0-5][0-9]$").expect("time pattern is valid")
});

/// Collects field errors and reports them together
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

fn min_chars(value: &str, min: usize) -> bool {
    value.trim().chars().count() >= min
}

fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value.trim())
}

pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR.is_match(value)
}

pub fn is_time_of_day(value: &str) -> bool {
    TIME_OF_DAY.is_match(value)
}

pub fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

/// A JSON array of WhatsApp contact ids, e.g. `["5511999999999@c.us"]`
pub fn is_authorized_numbers(value: &str) -> bool {
    serde_json::from_str::<Vec<String>>(value)
        .map(|numbers| numbers.iter().all(|number| number.contains("@c.us")))
        .unwrap_or(false)
}

pub fn validate_password(field: &str, password: &str) -> Result<(), AppError> {
    let mut checks = Checks::new();
    checks.check(
        password.chars().count() >= MIN_PASSWORD_LENGTH,
        field,
        "Password must be at least 6 characters",
    );
    checks.finish()
}

pub fn validate_setup(input: &SetupInput) -> Result<(), AppError> {
    let mut checks = Checks::new();
    checks
        .check(
            min_chars(&input.username, MIN_USERNAME_LENGTH),
            "username",
            "Username must be at least 3 characters",
        )
        .check(is_valid_email(&input.email), "email", "Invalid email address")
        .check(
            min_chars(&input.full_name, MIN_FULL_NAME_LENGTH),
            "fullName",
            "Full name must be at least 2 characters",
        )
        .check(
            input.password.chars().count() >= MIN_PASSWORD_LENGTH,
            "password",
            "Password must be at least 6 characters",
        );
    checks.finish()
}

pub fn validate_new_user(input: &CreateUserInput) -> Result<(), AppError> {
    let mut checks = Checks::new();
    checks
        .check(
            min_chars(&input.username, MIN_USERNAME_LENGTH),
            "username",
            "Username must be at least 3 characters",
        )
        .check(is_valid_email(&input.email), "email", "Invalid email address")
        .check(
            min_chars(&input.full_name, MIN_FULL_NAME_LENGTH),
            "fullName",
            "Full name must be at least 2 characters",
        );
    checks.finish()
}

pub fn validate_user_update(input: &UpdateUserInput) -> Result<(), AppError> {
    let mut checks = Checks::new();
    if let Some(ref email) = input.email {
        checks.check(is_valid_email(email), "email", "Invalid email address");
    }
    if let Some(ref full_name) = input.full_name {
        checks.check(
            min_chars(full_name, MIN_FULL_NAME_LENGTH),
            "fullName",
            "Full name must be at least 2 characters",
        );
    }
    checks.finish()
}

pub fn validate_team(input: &TeamInput) -> Result<(), AppError> {
    let mut checks = Checks::new();
    checks.check(not_blank(&input.name), "name", "Name is required");
    checks.finish()
}

pub fn validate_team_update(input: &TeamUpdate) -> Result<(), AppError> {
    let mut checks = Checks::new();
    if let Some(ref name) = input.name {
        checks.check(not_blank(name), "name", "Name cannot be empty");
    }
    checks.finish()
}

pub fn validate_project(input: &ProjectInput) -> Result<(), AppError> {
    let mut checks = Checks::new();
    checks
        .check(not_blank(&input.name), "name", "Name is required")
        .check(
            input.estimated_hours.is_none_or(|hours| hours >= 0),
            "estimatedHours",
            "Estimated hours cannot be negative",
        );
    checks.finish()
}

pub fn validate_project_update(input: &ProjectUpdate) -> Result<(), AppError> {
    let mut checks = Checks::new();
    if let Some(ref name) = input.name {
        checks.check(not_blank(name), "name", "Name cannot be empty");
    }
    checks.check(
        input.estimated_hours.is_none_or(|hours| hours >= 0),
        "estimatedHours",
        "Estimated hours cannot be negative",
    );
    checks.finish()
}

pub fn validate_task(input: &TaskInput) -> Result<(), AppError> {
    let mut checks = Checks::new();
    checks
        .check(not_blank(&input.name), "name", "Name is required")
        .check(not_blank(&input.source), "source", "Source is required")
        .check(
            input.color.as_deref().is_none_or(is_hex_color),
            "color",
            "Color must be a hex value like #3B82F6",
        )
        .check(
            input.estimated_hours.is_none_or(|hours| hours >= 0),
            "estimatedHours",
            "Estimated hours cannot be negative",
        );
    checks.finish()
}

pub fn validate_task_update(input: &TaskUpdate) -> Result<(), AppError> {
    let mut checks = Checks::new();
    if let Some(ref name) = input.name {
        checks.check(not_blank(name), "name", "Name cannot be empty");
    }
    if let Some(ref source) = input.source {
        checks.check(not_blank(source), "source", "Source cannot be empty");
    }
    checks
        .check(
            input.color.as_deref().is_none_or(is_hex_color),
            "color",
            "Color must be a hex value like #3B82F6",
        )
        .check(
            input.estimated_hours.is_none_or(|hours| hours >= 0),
            "estimatedHours",
            "Estimated hours cannot be negative",
        );
    checks.finish()
}

pub fn validate_item_title(title: &str) -> Result<(), AppError> {
    let mut checks = Checks::new();
    checks.check(not_blank(title), "title", "Title is required");
    checks.finish()
}

/// Checks the ordering of a stopped entry and returns its duration in seconds
pub fn entry_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<i32, AppError> {
    let mut checks = Checks::new();
    checks.check(
        end >= start,
        "endTime",
        "End time must not be before start time",
    );
    checks.finish()?;

    i32::try_from((end - start).num_seconds())
        .map_err(|_| AppError::BadRequest("Time entry is too long".to_string()))
}

fn check_whatsapp_optionals(
    checks: &mut Checks,
    authorized_numbers: Option<&str>,
    response_mode: Option<&str>,
    allowed_group_jid: Option<&str>,
) {
    checks
        .check(
            authorized_numbers.is_none_or(is_authorized_numbers),
            "authorizedNumbers",
            "Authorized numbers must be a JSON array of ids containing @c.us",
        )
        .check(
            response_mode.is_none_or(|mode| matches!(mode, "individual" | "group")),
            "responseMode",
            "Response mode must be 'individual' or 'group'",
        )
        .check(
            allowed_group_jid.is_none_or(|jid| jid.ends_with("@g.us")),
            "allowedGroupJid",
            "Group id must end with @g.us",
        );
}

pub fn validate_whatsapp(input: &WhatsappIntegrationInput) -> Result<(), AppError> {
    let mut checks = Checks::new();
    checks
        .check(
            not_blank(&input.instance_name),
            "instanceName",
            "Instance name is required",
        )
        .check(is_http_url(&input.api_url), "apiUrl", "API URL must be a valid URL")
        .check(not_blank(&input.api_key), "apiKey", "API key is required")
        .check(
            min_chars(&input.phone_number, MIN_PHONE_LENGTH),
            "phoneNumber",
            "Phone number must be at least 10 characters",
        );
    check_whatsapp_optionals(
        &mut checks,
        input.authorized_numbers.as_deref(),
        input.response_mode.as_deref(),
        input.allowed_group_jid.as_deref(),
    );
    checks.finish()
}

pub fn validate_whatsapp_update(input: &WhatsappIntegrationUpdate) -> Result<(), AppError> {
    let mut checks = Checks::new();
    if let Some(ref name) = input.instance_name {
        checks.check(not_blank(name), "instanceName", "Instance name cannot be empty");
    }
    if let Some(ref api_url) = input.api_url {
        checks.check(is_http_url(api_url), "apiUrl", "API URL must be a valid URL");
    }
    if let Some(ref api_key) = input.api_key {
        checks.check(not_blank(api_key), "apiKey", "API key cannot be empty");
    }
    if let Some(ref phone) = input.phone_number {
        checks.check(
            min_chars(phone, MIN_PHONE_LENGTH),
            "phoneNumber",
            "Phone number must be at least 10 characters",
        );
    }
    check_whatsapp_optionals(
        &mut checks,
        input.authorized_numbers.as_deref(),
        input.response_mode.as_deref(),
        input.allowed_group_jid.as_deref(),
    );
    checks.finish()
}

pub fn validate_notification_settings(input: &NotificationSettingsInput) -> Result<(), AppError> {
    let mut checks = Checks::new();
    checks
        .check(
            input.daily_report_time.as_deref().is_none_or(is_time_of_day),
            "dailyReportTime",
            "Time must use the HH:MM format",
        )
        .check(
            input.weekly_report_day.is_none_or(|day| (0..=6).contains(&day)),
            "weeklyReportDay",
            "Day must be between 0 and 6",
        )
        .check(
            input
                .reminder_hours_before
                .is_none_or(|hours| (1..=168).contains(&hours)),
            "reminderHoursBefore",
            "Reminder must be between 1 and 168 hours",
        )
        .check(
            input
                .timer_reminder_interval
                .is_none_or(|minutes| (5..=480).contains(&minutes)),
            "timerReminderInterval",
            "Interval must be between 5 and 480 minutes",
        );
    checks.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(result: Result<(), AppError>) -> Vec<String> {
        match result {
            Err(AppError::Validation(errors)) => errors.into_iter().map(|e| e.field).collect(),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(()) => Vec::new(),
        }
    }

    #[test]
    fn entry_duration_requires_ordered_times() {
        let start = DateTime::parse_from_rfc3339("2025-06-18T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let end = start + chrono::Duration::minutes(90);

        assert_eq!(entry_duration(start, end).unwrap(), 5400);
        assert_eq!(entry_duration(start, start).unwrap(), 0);
        assert!(matches!(
            entry_duration(end, start),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("not an email"));
    }

    #[test]
    fn colors_must_be_six_digit_hex() {
        assert!(is_hex_color("#3B82F6"));
        assert!(is_hex_color("#abcdef"));
        assert!(!is_hex_color("#FFF"));
        assert!(!is_hex_color("3B82F6"));
    }

    #[test]
    fn report_times() {
        assert!(is_time_of_day("18:00"));
        assert!(is_time_of_day("7:05"));
        assert!(!is_time_of_day("24:00"));
        assert!(!is_time_of_day("12:60"));
    }

    #[test]
    fn api_urls_must_be_http() {
        assert!(is_http_url("https://evolution.example.com"));
        assert!(is_http_url("http://localhost:8080/api"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("not a url"));
    }

    #[test]
    fn authorized_numbers_json() {
        assert!(is_authorized_numbers(r#"["5511999999999@c.us"]"#));
        assert!(is_authorized_numbers("[]"));
        assert!(!is_authorized_numbers(r#"["5511999999999"]"#));
        assert!(!is_authorized_numbers("5511999999999@c.us"));
    }

    #[test]
    fn setup_reports_every_bad_field() {
        let result = validate_setup(&SetupInput {
            username: "ab".to_string(),
            email: "bad".to_string(),
            full_name: "A".to_string(),
            password: "123".to_string(),
        });
        assert_eq!(
            fields(result),
            vec!["username", "email", "fullName", "password"]
        );
    }

    #[test]
    fn task_requires_name_and_source() {
        let result = validate_task(&TaskInput {
            name: "  ".to_string(),
            source: String::new(),
            color: Some("blue".to_string()),
            ..Default::default()
        });
        assert_eq!(fields(result), vec!["name", "source", "color"]);
    }

    #[test]
    fn valid_task_passes() {
        let result = validate_task(&TaskInput {
            name: "Review".to_string(),
            source: "manual".to_string(),
            estimated_hours: Some(2),
            ..Default::default()
        });
        assert!(result.is_ok());
    }

    #[test]
    fn notification_ranges() {
        let result = validate_notification_settings(&NotificationSettingsInput {
            daily_report_time: Some("25:00".to_string()),
            weekly_report_day: Some(7),
            reminder_hours_before: Some(0),
            timer_reminder_interval: Some(481),
            ..Default::default()
        });
        assert_eq!(
            fields(result),
            vec![
                "dailyReportTime",
                "weeklyReportDay",
                "reminderHoursBefore",
                "timerReminderInterval"
            ]
        );

        let ok = validate_notification_settings(&NotificationSettingsInput {
            weekly_report_day: Some(0),
            reminder_hours_before: Some(168),
            timer_reminder_interval: Some(5),
            ..Default::default()
        });
        assert!(ok.is_ok());
    }

    #[test]
    fn whatsapp_group_mode_fields() {
        let result = validate_whatsapp(&WhatsappIntegrationInput {
            instance_name: "main".to_string(),
            api_url: "https://evolution.example.com".to_string(),
            api_key: "secret".to_string(),
            phone_number: "5511999999999".to_string(),
            is_active: None,
            webhook_url: None,
            authorized_numbers: None,
            restrict_to_numbers: None,
            allowed_group_jid: Some("12345".to_string()),
            response_mode: Some("broadcast".to_string()),
        });
        assert_eq!(fields(result), vec!["responseMode", "allowedGroupJid"]);
    }
}
