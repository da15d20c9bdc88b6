use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::{
    models::{Team, TeamInput, TeamManager, TeamMember, TeamRole, TeamUpdate, User, UserInfo},
    repositories::user::PREFIXED_USER_COLUMNS,
    utils::sql,
};

#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_all_teams(&self) -> Result<Vec<Team>, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            r#"
            SELECT
                id,
                name,
                description,
                is_active,
                created_at,
                updated_at
            FROM
                teams
            ORDER BY
                name
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_team_by_id(&self, id: i32) -> Result<Option<Team>, sqlx::Error> {
        sqlx::query_as::<_, Team>(&sql(r#"
            SELECT
                id,
                name,
                description,
                is_active,
                created_at,
                updated_at
            FROM
                teams
            WHERE
                id = ?
        "#))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Teams where the user is a member or a manager
    pub async fn get_user_teams(&self, user_id: i32) -> Result<Vec<Team>, sqlx::Error> {
        sqlx::query_as::<_, Team>(&sql(r#"
            SELECT DISTINCT
                t.id,
                t.name,
                t.description,
                t.is_active,
                t.created_at,
                t.updated_at
            FROM
                teams t
                LEFT JOIN team_members tm ON tm.team_id = t.id AND tm.user_id = ?
                LEFT JOIN team_managers tg ON tg.team_id = t.id AND tg.user_id = ?
            WHERE
                tm.id IS NOT NULL OR tg.id IS NOT NULL
            ORDER BY
                t.name
        "#))
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_managed_teams(&self, user_id: i32) -> Result<Vec<Team>, sqlx::Error> {
        sqlx::query_as::<_, Team>(&sql(r#"
            SELECT
                t.id,
                t.name,
                t.description,
                t.is_active,
                t.created_at,
                t.updated_at
            FROM
                teams t
                INNER JOIN team_managers tg ON tg.team_id = t.id
            WHERE
                tg.user_id = ?
            ORDER BY
                t.name
        "#))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_managed_team_ids(&self, user_id: i32) -> Result<Vec<i32>, sqlx::Error> {
        sqlx::query_scalar(&sql(
            "SELECT team_id FROM team_managers WHERE user_id = ? ORDER BY team_id",
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn update_team(
        &self,
        id: i32,
        input: &TeamUpdate,
    ) -> Result<Option<Team>, sqlx::Error> {
        sqlx::query_as::<_, Team>(&sql(r#"
            UPDATE teams
            SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                is_active = COALESCE(?, is_active),
                updated_at = ?
            WHERE
                id = ?
            RETURNING
                id,
                name,
                description,
                is_active,
                created_at,
                updated_at
        "#))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.is_active)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Member rows joined with their public user view
    pub async fn get_team_member_users(&self, team_id: i32) -> Result<Vec<UserInfo>, sqlx::Error> {
        self.team_users("team_members", team_id).await
    }

    pub async fn get_team_manager_users(
        &self,
        team_id: i32,
    ) -> Result<Vec<UserInfo>, sqlx::Error> {
        self.team_users("team_managers", team_id).await
    }

    async fn team_users(&self, table: &str, team_id: i32) -> Result<Vec<UserInfo>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&sql(&format!(
            r#"
            SELECT {PREFIXED_USER_COLUMNS}
            FROM
                users u
                INNER JOIN {table} x ON x.user_id = u.id
            WHERE
                x.team_id = ?
            ORDER BY
                u.full_name
            "#
        )))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users.into_iter().map(UserInfo::from).collect())
    }

    /// Adding an existing member returns the existing row
    pub async fn add_team_member(
        &self,
        team_id: i32,
        user_id: i32,
    ) -> Result<TeamMember, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query(&sql(r#"
            INSERT INTO team_members (team_id, user_id, joined_at)
            VALUES (?, ?, ?)
            ON CONFLICT (team_id, user_id) DO NOTHING
        "#))
        .bind(team_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        sqlx::query_as::<_, TeamMember>(&sql(r#"
            SELECT id, team_id, user_id, joined_at
            FROM team_members
            WHERE team_id = ? AND user_id = ?
        "#))
        .bind(team_id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn remove_team_member(&self, team_id: i32, user_id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&sql(
            "DELETE FROM team_members WHERE team_id = ? AND user_id = ?",
        ))
        .bind(team_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn add_team_manager(
        &self,
        team_id: i32,
        user_id: i32,
    ) -> Result<TeamManager, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query(&sql(r#"
            INSERT INTO team_managers (team_id, user_id, assigned_at)
            VALUES (?, ?, ?)
            ON CONFLICT (team_id, user_id) DO NOTHING
        "#))
        .bind(team_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        sqlx::query_as::<_, TeamManager>(&sql(r#"
            SELECT id, team_id, user_id, assigned_at
            FROM team_managers
            WHERE team_id = ? AND user_id = ?
        "#))
        .bind(team_id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn remove_team_manager(
        &self,
        team_id: i32,
        user_id: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&sql(
            "DELETE FROM team_managers WHERE team_id = ? AND user_id = ?",
        ))
        .bind(team_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_team_role(&self, team_id: i32, user_id: i32) -> Result<TeamRole, sqlx::Error> {
        let (is_member, is_manager): (bool, bool) = sqlx::query_as(&sql(r#"
            SELECT
                EXISTS (SELECT 1 FROM team_members WHERE team_id = ? AND user_id = ?),
                EXISTS (SELECT 1 FROM team_managers WHERE team_id = ? AND user_id = ?)
        "#))
        .bind(team_id)
        .bind(user_id)
        .bind(team_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(TeamRole {
            is_member,
            is_manager,
        })
    }
}

// Transactional steps

pub async fn insert_team(
    tx: &mut Transaction<'_, Postgres>,
    input: &TeamInput,
) -> Result<Team, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, Team>(&sql(r#"
        INSERT INTO
            teams (
                name,
                description,
                is_active,
                created_at,
                updated_at
            )
        VALUES
            (?, ?, ?, ?, ?)
        RETURNING
            id,
            name,
            description,
            is_active,
            created_at,
            updated_at
    "#))
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.is_active.unwrap_or(true))
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_member(
    tx: &mut Transaction<'_, Postgres>,
    team_id: i32,
    user_id: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(&sql(r#"
        INSERT INTO team_members (team_id, user_id, joined_at)
        VALUES (?, ?, ?)
        ON CONFLICT (team_id, user_id) DO NOTHING
    "#))
    .bind(team_id)
    .bind(user_id)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn insert_manager(
    tx: &mut Transaction<'_, Postgres>,
    team_id: i32,
    user_id: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(&sql(r#"
        INSERT INTO team_managers (team_id, user_id, assigned_at)
        VALUES (?, ?, ?)
        ON CONFLICT (team_id, user_id) DO NOTHING
    "#))
    .bind(team_id)
    .bind(user_id)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Replaces every manager assignment of a user
pub async fn replace_managed_teams(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i32,
    team_ids: &[i32],
) -> Result<(), sqlx::Error> {
    sqlx::query(&sql("DELETE FROM team_managers WHERE user_id = ?"))
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    for team_id in team_ids {
        insert_manager(tx, *team_id, user_id).await?;
    }

    Ok(())
}

/// Deletes a team with its memberships, manager rows and project bindings
pub async fn delete_team_cascade(
    tx: &mut Transaction<'_, Postgres>,
    team_id: i32,
) -> Result<bool, sqlx::Error> {
    for statement in [
        "DELETE FROM team_members WHERE team_id = ?",
        "DELETE FROM team_managers WHERE team_id = ?",
        "DELETE FROM project_teams WHERE team_id = ?",
    ] {
        sqlx::query(&sql(statement))
            .bind(team_id)
            .execute(&mut **tx)
            .await?;
    }

    let result = sqlx::query(&sql("DELETE FROM teams WHERE id = ?"))
        .bind(team_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected() > 0)
}
