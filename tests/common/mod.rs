#![allow(dead_code, unused_macros)]

use actix_web::{body::MessageBody, dev::ServiceResponse, test};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::env;

use timeflow::handlers::shared::ApiResponse;
use timeflow::{AppState, Config};

pub const TEST_DATABASE_ENV: &str = "TEST_DATABASE_URL";

pub fn setup_test_env() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// App state over a pool that never connects; enough for requests rejected
/// before any query runs
pub fn lazy_state() -> AppState {
    setup_test_env();
    let config = Config::test_config();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("test database url parses");
    AppState::new(config, pool)
}

/// Connects to `TEST_DATABASE_URL`, migrates and empties every table.
/// Returns `None` when the variable is unset so database tests can skip.
pub async fn database_state() -> Option<AppState> {
    setup_test_env();
    let url = match env::var(TEST_DATABASE_ENV) {
        Ok(url) => url,
        Err(_) => {
            eprintln!("{} not set, skipping database test", TEST_DATABASE_ENV);
            return None;
        }
    };

    let config = Config {
        database_url: url,
        ..Config::test_config()
    };
    let pool = timeflow::database::init_database(&config)
        .await
        .expect("test database is reachable");
    reset_database(&pool).await;

    Some(AppState::new(config, pool))
}

pub async fn reset_database(pool: &PgPool) {
    sqlx::query(
        r#"
        TRUNCATE
            whatsapp_logs,
            whatsapp_integrations,
            notification_settings,
            time_entries,
            task_items,
            tasks,
            project_teams,
            projects,
            team_managers,
            team_members,
            teams,
            users
        RESTART IDENTITY CASCADE
        "#,
    )
    .execute(pool)
    .await
    .expect("failed to reset test database");
}

/// Builds the full application around an `AppState`
macro_rules! test_app {
    ($state:expr) => {{
        let state = $state.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .configure(move |cfg| state.register(cfg))
                .configure(timeflow::routes::configure),
        )
        .await
    }};
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Reads the envelope and returns `data`, asserting success
pub async fn success_data<T, B>(resp: ServiceResponse<B>) -> T
where
    T: DeserializeOwned,
    B: MessageBody,
{
    let body: ApiResponse<T> = test::read_body_json(resp).await;
    assert!(
        body.success,
        "expected a successful response, got: {:?}",
        body.message
    );
    body.data.expect("successful response carries data")
}

pub async fn json_body<B: MessageBody>(resp: ServiceResponse<B>) -> Value {
    test::read_body_json(resp).await
}
