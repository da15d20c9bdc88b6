use anyhow::{Result, anyhow};

use crate::database::models::{Project, RepairSummary, User};
use crate::database::repositories::{ProjectRepository, TaskRepository, UserRepository};

pub const PERSONAL_PROJECT_DESCRIPTION: &str = "Your space for personal and private tasks";

pub fn personal_project_name(user: &User) -> String {
    format!("Personal Project - {}", user.first_name())
}

/// Personal-project auto-provisioning and the orphan-task repair routine
#[derive(Clone)]
pub struct ProvisioningService {
    users: UserRepository,
    projects: ProjectRepository,
    tasks: TaskRepository,
}

impl ProvisioningService {
    pub fn new(users: UserRepository, projects: ProjectRepository, tasks: TaskRepository) -> Self {
        Self {
            users,
            projects,
            tasks,
        }
    }

    /// Returns the user's personal project, creating it on first use.
    /// The flag is true when this call created it.
    pub async fn ensure_personal_project(&self, user: &User) -> Result<(Project, bool)> {
        if let Some(project) = self.projects.get_personal_project(user.id).await? {
            return Ok((project, false));
        }

        // a concurrent request may win the insert; the unique index keeps one row
        let created = self
            .projects
            .insert_personal_project(
                user.id,
                &personal_project_name(user),
                PERSONAL_PROJECT_DESCRIPTION,
            )
            .await?;

        if created {
            log::info!("Created personal project for user {}", user.id);
        }

        let project = self
            .projects
            .get_personal_project(user.id)
            .await?
            .ok_or_else(|| anyhow!("Personal project missing for user {}", user.id))?;

        Ok((project, created))
    }

    pub async fn migrate_orphan_tasks(&self, user_id: i32, project_id: i32) -> Result<u64> {
        let migrated = self.tasks.migrate_orphan_tasks(user_id, project_id).await?;
        if migrated > 0 {
            log::info!(
                "Moved {} orphan tasks of user {} into project {}",
                migrated,
                user_id,
                project_id
            );
        }
        Ok(migrated)
    }

    /// Ensures every user has a personal project and moves their orphan tasks into it
    pub async fn repair_all(&self) -> Result<RepairSummary> {
        let mut summary = RepairSummary::default();

        for user in self.users.get_all_users().await? {
            let (project, created) = self.ensure_personal_project(&user).await?;
            if created {
                summary.projects_created += 1;
            }
            summary.tasks_migrated += self.migrate_orphan_tasks(user.id, project.id).await?;
            summary.users_processed += 1;
        }

        log::info!(
            "Orphan repair finished: {} users, {} projects created, {} tasks migrated",
            summary.users_processed,
            summary.projects_created,
            summary.tasks_migrated
        );

        Ok(summary)
    }
}
