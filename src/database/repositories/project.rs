use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::{
    models::{Project, ProjectInput, ProjectTeam, ProjectTeamAccess, ProjectUpdate, Team},
    utils::sql,
};

const PROJECT_COLUMNS: &str = r#"
    id,
    name,
    description,
    is_personal,
    estimated_hours,
    deadline,
    owner_id,
    is_active,
    created_at,
    updated_at
"#;

const PREFIXED_PROJECT_COLUMNS: &str = r#"
    p.id,
    p.name,
    p.description,
    p.is_personal,
    p.estimated_hours,
    p.deadline,
    p.owner_id,
    p.is_active,
    p.created_at,
    p.updated_at
"#;

#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_project_by_id(&self, id: i32) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&sql(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_personal_project(&self, user_id: i32) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&sql(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner_id = ? AND is_personal = TRUE"
        )))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Inserts the personal project unless the user already has one.
    /// Returns true when a row was created.
    pub async fn insert_personal_project(
        &self,
        user_id: i32,
        name: &str,
        description: &str,
    ) -> Result<bool, sqlx::Error> {
        let now = Utc::now();
        let result = sqlx::query(&sql(r#"
            INSERT INTO
                projects (
                    name,
                    description,
                    is_personal,
                    owner_id,
                    is_active,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, TRUE, ?, TRUE, ?, ?)
            ON CONFLICT (owner_id) WHERE is_personal DO NOTHING
        "#))
        .bind(name)
        .bind(description)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Active projects the user owns or reaches through a team, personal first
    pub async fn get_projects_for_user(&self, user_id: i32) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&sql(&format!(
            r#"
            SELECT {PREFIXED_PROJECT_COLUMNS}
            FROM
                projects p
            WHERE
                p.is_active = TRUE
                AND (
                    p.owner_id = ?
                    OR EXISTS (
                        SELECT 1
                        FROM project_teams pt
                        WHERE pt.project_id = p.id
                          AND (
                            EXISTS (SELECT 1 FROM team_members tm WHERE tm.team_id = pt.team_id AND tm.user_id = ?)
                            OR EXISTS (SELECT 1 FROM team_managers tg WHERE tg.team_id = pt.team_id AND tg.user_id = ?)
                          )
                    )
                )
            ORDER BY
                p.is_personal DESC,
                p.name
            "#
        )))
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_all_projects(&self) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY is_personal DESC, name"
        ))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_projects_for_team(&self, team_id: i32) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&sql(&format!(
            r#"
            SELECT {PREFIXED_PROJECT_COLUMNS}
            FROM
                projects p
                INNER JOIN project_teams pt ON pt.project_id = p.id
            WHERE
                pt.team_id = ?
                AND p.is_active = TRUE
            ORDER BY
                p.name
            "#
        )))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn update_project(
        &self,
        id: i32,
        input: &ProjectUpdate,
    ) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&sql(&format!(
            r#"
            UPDATE projects
            SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                estimated_hours = COALESCE(?, estimated_hours),
                deadline = COALESCE(?, deadline),
                is_active = COALESCE(?, is_active),
                updated_at = ?
            WHERE
                id = ?
            RETURNING {PROJECT_COLUMNS}
            "#
        )))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.estimated_hours)
        .bind(input.deadline)
        .bind(input.is_active)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn deactivate_project(&self, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&sql(
            "UPDATE projects SET is_active = FALSE, updated_at = ? WHERE id = ?",
        ))
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_project_teams(&self, project_id: i32) -> Result<Vec<Team>, sqlx::Error> {
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
                INNER JOIN project_teams pt ON pt.team_id = t.id
            WHERE
                pt.project_id = ?
            ORDER BY
                t.name
        "#))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Binding twice returns the existing row
    pub async fn bind_project_to_team(
        &self,
        project_id: i32,
        team_id: i32,
    ) -> Result<ProjectTeam, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let binding = insert_binding(&mut tx, project_id, team_id).await?;
        tx.commit().await?;

        Ok(binding)
    }

    pub async fn unbind_project_from_team(
        &self,
        project_id: i32,
        team_id: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&sql(
            "DELETE FROM project_teams WHERE project_id = ? AND team_id = ?",
        ))
        .bind(project_id)
        .bind(team_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The user's membership and management across the teams bound to a project
    pub async fn get_team_access(
        &self,
        project_id: i32,
        user_id: i32,
    ) -> Result<ProjectTeamAccess, sqlx::Error> {
        let (is_member, is_manager): (bool, bool) = sqlx::query_as(&sql(r#"
            SELECT
                EXISTS (
                    SELECT 1
                    FROM project_teams pt
                    INNER JOIN team_members tm ON tm.team_id = pt.team_id
                    WHERE pt.project_id = ? AND tm.user_id = ?
                ),
                EXISTS (
                    SELECT 1
                    FROM project_teams pt
                    INNER JOIN team_managers tg ON tg.team_id = pt.team_id
                    WHERE pt.project_id = ? AND tg.user_id = ?
                )
        "#))
        .bind(project_id)
        .bind(user_id)
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ProjectTeamAccess {
            is_member,
            is_manager,
        })
    }
}

// Transactional steps

pub async fn insert_project(
    tx: &mut Transaction<'_, Postgres>,
    input: &ProjectInput,
    owner_id: Option<i32>,
) -> Result<Project, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, Project>(&sql(&format!(
        r#"
        INSERT INTO
            projects (
                name,
                description,
                is_personal,
                estimated_hours,
                deadline,
                owner_id,
                is_active,
                created_at,
                updated_at
            )
        VALUES
            (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {PROJECT_COLUMNS}
        "#
    )))
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.is_personal)
    .bind(input.estimated_hours)
    .bind(input.deadline)
    .bind(owner_id)
    .bind(input.is_active.unwrap_or(true))
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_binding(
    tx: &mut Transaction<'_, Postgres>,
    project_id: i32,
    team_id: i32,
) -> Result<ProjectTeam, sqlx::Error> {
    sqlx::query(&sql(r#"
        INSERT INTO project_teams (project_id, team_id, assigned_at)
        VALUES (?, ?, ?)
        ON CONFLICT (project_id, team_id) DO NOTHING
    "#))
    .bind(project_id)
    .bind(team_id)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    sqlx::query_as::<_, ProjectTeam>(&sql(r#"
        SELECT id, project_id, team_id, assigned_at
        FROM project_teams
        WHERE project_id = ? AND team_id = ?
    "#))
    .bind(project_id)
    .bind(team_id)
    .fetch_one(&mut **tx)
    .await
}
