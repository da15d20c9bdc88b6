use pretty_assertions::assert_eq;
use serial_test::serial;
use std::env;
use timeflow::config::Config;

mod common;

const KEYS: [&str; 9] = [
    "DATABASE_URL",
    "DATABASE_MAX_CONNECTIONS",
    "JWT_SECRET",
    "JWT_EXPIRATION_DAYS",
    "HOST",
    "PORT",
    "ENVIRONMENT",
    "CLIENT_BASE_URL",
    "RESET_TOKEN_TTL_HOURS",
];

/// Runs `f` with the config variables cleared, then restores them
fn with_clean_env(f: impl FnOnce()) {
    let original: Vec<(&str, Option<String>)> =
        KEYS.iter().map(|key| (*key, env::var(key).ok())).collect();

    unsafe {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    f();

    unsafe {
        for (key, value) in original {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }
}

#[test]
#[serial]
fn test_config_defaults() {
    common::setup_test_env();

    with_clean_env(|| {
        let config = Config::from_env_only().unwrap();

        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.jwt_expiration_days, 7);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, "development");
        assert_eq!(config.client_base_url, "http://localhost:5173");
        assert_eq!(config.reset_token_ttl_hours, 24);
        assert!(!config.jwt_secret.is_empty());
    });
}

#[test]
#[serial]
fn test_config_custom_values() {
    with_clean_env(|| {
        unsafe {
            env::set_var("DATABASE_URL", "postgres://db.internal/timeflow");
            env::set_var("DATABASE_MAX_CONNECTIONS", "25");
            env::set_var("JWT_SECRET", "test-secret");
            env::set_var("JWT_EXPIRATION_DAYS", "3");
            env::set_var("HOST", "0.0.0.0");
            env::set_var("PORT", "3000");
            env::set_var("ENVIRONMENT", "production");
            env::set_var("CLIENT_BASE_URL", "https://time.example.com");
            env::set_var("RESET_TOKEN_TTL_HOURS", "2");
        }

        let config = Config::from_env_only().unwrap();

        assert_eq!(config.database_url, "postgres://db.internal/timeflow");
        assert_eq!(config.database_max_connections, 25);
        assert_eq!(config.jwt_secret, "test-secret");
        assert_eq!(config.jwt_expiration_days, 3);
        assert_eq!(config.server_address(), "0.0.0.0:3000");
        assert!(config.is_production());
        assert_eq!(config.client_base_url, "https://time.example.com");
        assert_eq!(config.reset_token_ttl_hours, 2);
    });
}

#[test]
#[serial]
fn test_production_requires_jwt_secret() {
    with_clean_env(|| {
        unsafe {
            env::set_var("ENVIRONMENT", "production");
        }

        assert!(Config::from_env_only().is_err());
    });
}

#[test]
#[serial]
fn test_invalid_numbers_fall_back_to_defaults() {
    with_clean_env(|| {
        unsafe {
            env::set_var("PORT", "invalid_port");
            env::set_var("JWT_EXPIRATION_DAYS", "seven");
        }

        let config = Config::from_env_only().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_expiration_days, 7);
    });
}

#[test]
fn test_environment_detection() {
    let production = Config {
        environment: "production".to_string(),
        ..Config::test_config()
    };
    let development = Config {
        environment: "development".to_string(),
        ..Config::test_config()
    };

    assert!(production.is_production());
    assert!(!production.is_development());
    assert!(development.is_development());
    assert!(!Config::test_config().is_production());
}
