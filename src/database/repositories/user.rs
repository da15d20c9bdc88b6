use chrono::Utc;
use sqlx::{PgExecutor, PgPool};

use crate::database::{
    models::{NewUser, UpdateUserInput, User},
    utils::sql,
};

/// Serializes first-time setup across connections
const SETUP_LOCK_KEY: i64 = 0x7469_6d65_666c_6f77;

const USER_COLUMNS: &str = r#"
    id,
    username,
    password,
    email,
    full_name,
    role,
    is_active,
    must_reset_password,
    reset_token,
    reset_token_expiry,
    last_login,
    api_key,
    recovery_key,
    created_at,
    updated_at
"#;

/// Same columns qualified with the `u` alias, for joins
pub(crate) const PREFIXED_USER_COLUMNS: &str = r#"
    u.id,
    u.username,
    u.password,
    u.email,
    u.full_name,
    u.role,
    u.is_active,
    u.must_reset_password,
    u.reset_token,
    u.reset_token_expiry,
    u.last_login,
    u.api_key,
    u.recovery_key,
    u.created_at,
    u.updated_at
"#;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn count_users(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, sqlx::Error> {
        insert_user(&self.pool, user).await
    }

    /// Inserts `user` only while the table is empty. `None` means someone else
    /// already completed setup.
    pub async fn create_first_user(&self, user: &NewUser) -> Result<Option<User>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SETUP_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            return Ok(None);
        }

        let created = insert_user(&mut *tx, user).await?;
        tx.commit().await?;

        Ok(Some(created))
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&sql(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Case-insensitive lookup on username or email
    pub async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&sql(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE LOWER(username) = LOWER(?) OR LOWER(email) = LOWER(?)
            ORDER BY id
            LIMIT 1
            "#
        )))
        .bind(identifier)
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
    }

    /// Only active users can authenticate with a key
    pub async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&sql(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE api_key = ? AND is_active = TRUE"
        )))
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await
    }

    /// Unexpired reset tokens only
    pub async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&sql(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE reset_token = ? AND reset_token_expiry > ?
            "#
        )))
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_all_users(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY full_name, id"
        ))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn update_user(
        &self,
        id: i32,
        input: &UpdateUserInput,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&sql(&format!(
            r#"
            UPDATE users
            SET
                full_name = COALESCE(?, full_name),
                email = COALESCE(?, email),
                role = COALESCE(?, role),
                is_active = COALESCE(?, is_active),
                updated_at = ?
            WHERE
                id = ?
            RETURNING {USER_COLUMNS}
            "#
        )))
        .bind(&input.full_name)
        .bind(&input.email)
        .bind(input.role)
        .bind(input.is_active)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&sql("DELETE FROM users WHERE id = ?"))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets a new password hash and clears any pending reset state
    pub async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), sqlx::Error> {
        sqlx::query(&sql(r#"
            UPDATE users
            SET
                password = ?,
                must_reset_password = FALSE,
                reset_token = NULL,
                reset_token_expiry = NULL,
                updated_at = ?
            WHERE
                id = ?
        "#))
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_api_key(&self, id: i32, api_key: &str) -> Result<(), sqlx::Error> {
        sqlx::query(&sql(
            "UPDATE users SET api_key = ?, updated_at = ? WHERE id = ?",
        ))
        .bind(api_key)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_recovery_key(&self, id: i32, recovery_key_hash: &str) -> Result<(), sqlx::Error> {
        sqlx::query(&sql(
            "UPDATE users SET recovery_key = ?, updated_at = ? WHERE id = ?",
        ))
        .bind(recovery_key_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// New password and new recovery key in one statement
    pub async fn recover_account(
        &self,
        id: i32,
        password_hash: &str,
        recovery_key_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(&sql(r#"
            UPDATE users
            SET
                password = ?,
                recovery_key = ?,
                must_reset_password = FALSE,
                reset_token = NULL,
                reset_token_expiry = NULL,
                updated_at = ?
            WHERE
                id = ?
        "#))
        .bind(password_hash)
        .bind(recovery_key_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn touch_last_login(&self, id: i32) -> Result<(), sqlx::Error> {
        sqlx::query(&sql("UPDATE users SET last_login = ? WHERE id = ?"))
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

pub async fn insert_user<'e>(
    executor: impl PgExecutor<'e>,
    user: &NewUser,
) -> Result<User, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, User>(&sql(&format!(
        r#"
        INSERT INTO
            users (
                username,
                password,
                email,
                full_name,
                role,
                must_reset_password,
                reset_token,
                reset_token_expiry,
                api_key,
                recovery_key,
                created_at,
                updated_at
            )
        VALUES
            (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    )))
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(&user.email)
    .bind(&user.full_name)
    .bind(user.role)
    .bind(user.must_reset_password)
    .bind(&user.reset_token)
    .bind(user.reset_token_expiry)
    .bind(&user.api_key)
    .bind(&user.recovery_key_hash)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await
}
