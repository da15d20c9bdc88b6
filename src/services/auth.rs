use anyhow::{Result, anyhow, bail};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::database::models::{
    AuthResponse, ChangePasswordInput, LoginInput, NewUser, RecoverPasswordInput,
    ResetPasswordInput, SetupInput, SetupResponse, User, UserRole,
};
use crate::database::repositories::UserRepository;
use crate::error::AppError;

pub const API_KEY_PREFIX: &str = "pont_";
const API_KEY_LENGTH: usize = 32;
const RESET_TOKEN_LENGTH: usize = 64;
const RECOVERY_KEY_GROUPS: usize = 4;
const RECOVERY_KEY_GROUP_LENGTH: usize = 5;
const RECOVERY_KEY_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32, // user id
    pub username: String,
    pub role: UserRole,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> i32 {
        self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

fn random_alphanumeric(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// `pont_` followed by 32 alphanumerics
pub fn generate_api_key() -> String {
    format!("{}{}", API_KEY_PREFIX, random_alphanumeric(API_KEY_LENGTH))
}

/// Four dash-separated groups of five uppercase alphanumerics
pub fn generate_recovery_key() -> String {
    let mut rng = rand::rng();
    (0..RECOVERY_KEY_GROUPS)
        .map(|_| {
            (0..RECOVERY_KEY_GROUP_LENGTH)
                .map(|_| {
                    RECOVERY_KEY_CHARSET[rng.random_range(0..RECOVERY_KEY_CHARSET.len())] as char
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

pub fn generate_reset_token() -> String {
    random_alphanumeric(RESET_TOKEN_LENGTH)
}

pub fn hash_password(password: &str) -> Result<String> {
    Ok(hash(password, DEFAULT_COST)?)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    Ok(verify(password, password_hash)?)
}

#[derive(Clone)]
pub struct AuthService {
    user_repository: UserRepository,
    config: Config,
}

impl AuthService {
    pub fn new(config: Config, user_repository: UserRepository) -> Self {
        Self {
            user_repository,
            config,
        }
    }

    pub fn generate_token(&self, user: &User) -> Result<String> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::days(self.config.jwt_expiration_days))
            .ok_or_else(|| anyhow!("Token expiration overflow"))?
            .timestamp() as usize;

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            exp: expiration,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )?;

        Ok(token)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(token_data.claims)
    }

    /// A fresh reset token and its expiry
    pub fn new_reset_token(&self) -> (String, DateTime<Utc>) {
        (
            generate_reset_token(),
            Utc::now() + Duration::hours(self.config.reset_token_ttl_hours),
        )
    }

    pub async fn is_initialized(&self) -> Result<bool> {
        Ok(self.user_repository.count_users().await? > 0)
    }

    /// Creates the first administrator. Refused once any user exists.
    pub async fn setup(&self, input: SetupInput) -> Result<SetupResponse> {
        if self.is_initialized().await? {
            bail!(AppError::Conflict(
                "System is already initialized".to_string()
            ));
        }

        let recovery_key = generate_recovery_key();
        let user = self
            .user_repository
            .create_first_user(&NewUser {
                username: input.username.trim().to_string(),
                password_hash: hash_password(&input.password)?,
                email: input.email.trim().to_string(),
                full_name: input.full_name.trim().to_string(),
                role: UserRole::Admin,
                must_reset_password: false,
                reset_token: None,
                reset_token_expiry: None,
                api_key: Some(generate_api_key()),
                recovery_key_hash: Some(hash_password(&recovery_key)?),
            })
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::Conflict("System is already initialized".to_string()))?;

        log::info!("Initial administrator {} created", user.username);

        let token = self.generate_token(&user)?;
        Ok(SetupResponse {
            token,
            user: user.into(),
            recovery_key,
        })
    }

    pub async fn login(&self, input: LoginInput) -> Result<AuthResponse> {
        let user = self
            .user_repository
            .find_by_username_or_email(input.username.trim())
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

        if !verify_password(&input.password, &user.password)? {
            log::warn!("Failed login attempt for user {}", user.id);
            bail!(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        if !user.is_active {
            log::warn!("Login attempt for deactivated user {}", user.id);
            bail!(AppError::Unauthorized("Account is deactivated".to_string()));
        }

        self.user_repository.touch_last_login(user.id).await?;

        let token = self.generate_token(&user)?;
        let must_reset_password = user.must_reset_password;
        Ok(AuthResponse {
            token,
            user: user.into(),
            must_reset_password,
        })
    }

    /// The current password is only optional while a reset is pending
    pub async fn change_password(&self, user: &User, input: &ChangePasswordInput) -> Result<()> {
        if !user.must_reset_password {
            let current = input
                .current_password
                .as_deref()
                .ok_or_else(|| AppError::validation("currentPassword", "Current password is required"))?;

            if !verify_password(current, &user.password)? {
                bail!(AppError::BadRequest(
                    "Current password is incorrect".to_string()
                ));
            }
        }

        self.user_repository
            .update_password(user.id, &hash_password(&input.new_password)?)
            .await?;

        log::info!("Password changed for user {}", user.id);
        Ok(())
    }

    pub async fn reset_password(&self, input: &ResetPasswordInput) -> Result<()> {
        let user = self
            .user_repository
            .find_by_reset_token(&input.token)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

        self.user_repository
            .update_password(user.id, &hash_password(&input.new_password)?)
            .await?;

        log::info!("Password reset completed for user {}", user.id);
        Ok(())
    }

    /// Sets a new password with the recovery key, then rotates the key.
    /// Returns the replacement key.
    pub async fn recover(&self, input: &RecoverPasswordInput) -> Result<String> {
        let rejected = || AppError::Unauthorized("Invalid recovery credentials".to_string());

        let user = self
            .user_repository
            .find_by_username_or_email(input.username_or_email.trim())
            .await?
            .ok_or_else(rejected)?;

        let stored = user.recovery_key.as_deref().ok_or_else(rejected)?;
        if !verify_password(input.recovery_key.trim(), stored)? {
            log::warn!("Invalid recovery key presented for user {}", user.id);
            bail!(rejected());
        }

        let recovery_key = generate_recovery_key();
        self.user_repository
            .recover_account(
                user.id,
                &hash_password(&input.new_password)?,
                &hash_password(&recovery_key)?,
            )
            .await?;
        log::info!("Account recovered for user {}", user.id);

        Ok(recovery_key)
    }

    pub async fn regenerate_api_key(&self, user_id: i32) -> Result<String> {
        let api_key = generate_api_key();
        self.user_repository.set_api_key(user_id, &api_key).await?;
        Ok(api_key)
    }

    pub async fn regenerate_recovery_key(&self, user_id: i32) -> Result<String> {
        let recovery_key = generate_recovery_key();
        self.user_repository
            .set_recovery_key(user_id, &hash_password(&recovery_key)?)
            .await?;
        Ok(recovery_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlx::postgres::PgPoolOptions;

    fn service() -> AuthService {
        let config = Config::test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("lazy pool");
        AuthService::new(config, UserRepository::new(pool))
    }

    fn user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: 42,
            username: "ada".to_string(),
            password: String::new(),
            email: "ada@example.com".to_string(),
            full_name: "Ada Lovelace".to_string(),
            role,
            is_active: true,
            must_reset_password: false,
            reset_token: None,
            reset_token_expiry: None,
            last_login: None,
            api_key: None,
            recovery_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn api_key_has_prefix_and_length() {
        let key = generate_api_key();
        assert!(key.starts_with("pont_"));
        assert_eq!(key.len(), API_KEY_PREFIX.len() + API_KEY_LENGTH);
        assert!(key[API_KEY_PREFIX.len()..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn recovery_key_format() {
        let key = generate_recovery_key();
        let groups: Vec<&str> = key.split('-').collect();
        assert_eq!(groups.len(), 4);
        for group in groups {
            assert_eq!(group.len(), 5);
            assert!(group
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn reset_tokens_are_long_and_distinct() {
        let first = generate_reset_token();
        let second = generate_reset_token();
        assert_eq!(first.len(), 64);
        assert_ne!(first, second);
    }

    #[test]
    fn password_hash_round_trip() {
        let hashed = hash_password("secret1").unwrap();
        assert!(verify_password("secret1", &hashed).unwrap());
        assert!(!verify_password("secret2", &hashed).unwrap());
    }

    #[actix_web::test]
    async fn token_carries_identity_and_role() {
        let service = service();
        let token = service.generate_token(&user(UserRole::Admin)).unwrap();
        let claims = service.verify_token(&token).unwrap();

        assert_eq!(claims.user_id(), 42);
        assert_eq!(claims.username, "ada");
        assert!(claims.is_admin());
    }

    #[actix_web::test]
    async fn tampered_token_is_rejected() {
        let service = service();
        let token = service.generate_token(&user(UserRole::User)).unwrap();
        let tampered = format!("{}x", token);
        assert!(service.verify_token(&tampered).is_err());
    }

    #[actix_web::test]
    async fn reset_token_expiry_uses_configured_ttl() {
        let service = service();
        let before = Utc::now();
        let (token, expiry) = service.new_reset_token();

        assert_eq!(token.len(), 64);
        assert!(expiry >= before + Duration::hours(24));
        assert!(expiry <= Utc::now() + Duration::hours(24));
    }
}
