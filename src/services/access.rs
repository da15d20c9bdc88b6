//! Ownership and role checks. The pure predicates take everything they need as
//! arguments; the async helpers load team standing from the database first.

use crate::database::models::{Project, ProjectTeamAccess, Task, TeamRole, TimeEntry, User};
use crate::database::repositories::{ProjectRepository, TeamRepository};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions {
    pub view: bool,
    pub edit: bool,
}

pub fn can_view_project(user: &User, project: &Project, access: ProjectTeamAccess) -> bool {
    user.is_admin()
        || project.owner_id == Some(user.id)
        || access.is_member
        || access.is_manager
}

pub fn can_edit_project(user: &User, project: &Project, access: ProjectTeamAccess) -> bool {
    user.is_admin() || project.owner_id == Some(user.id) || access.is_manager
}

pub fn can_view_team(user: &User, role: TeamRole) -> bool {
    user.is_admin() || role.is_member || role.is_manager
}

pub fn can_manage_team(user: &User, role: TeamRole) -> bool {
    user.is_admin() || role.is_manager
}

/// `project` is the permission set on the task's project, if it has one
pub fn task_permissions(user: &User, task: &Task, project: Option<Permissions>) -> Permissions {
    let project = project.unwrap_or_default();
    let privileged = user.is_admin() || task.user_id == user.id;
    Permissions {
        view: privileged || project.view,
        edit: privileged || project.edit,
    }
}

pub fn can_access_entry(user: &User, entry: &TimeEntry) -> bool {
    user.is_admin() || entry.user_id == user.id
}

/// Resolves view and edit rights on a project, skipping the team lookup when
/// the caller is an admin or the owner
pub async fn project_permissions(
    projects: &ProjectRepository,
    user: &User,
    project: &Project,
) -> Result<Permissions, AppError> {
    if user.is_admin() || project.owner_id == Some(user.id) {
        return Ok(Permissions {
            view: true,
            edit: true,
        });
    }

    let access = projects.get_team_access(project.id, user.id).await?;
    Ok(Permissions {
        view: can_view_project(user, project, access),
        edit: can_edit_project(user, project, access),
    })
}

/// Loads the task's project and derives the caller's rights on the task
pub async fn task_access(
    projects: &ProjectRepository,
    user: &User,
    task: &Task,
) -> Result<Permissions, AppError> {
    let project = match task.project_id {
        Some(project_id) => match projects.get_project_by_id(project_id).await? {
            Some(project) => Some(project_permissions(projects, user, &project).await?),
            None => None,
        },
        None => None,
    };

    Ok(task_permissions(user, task, project))
}

pub async fn team_role(
    teams: &TeamRepository,
    user: &User,
    team_id: i32,
) -> Result<TeamRole, AppError> {
    if user.is_admin() {
        return Ok(TeamRole {
            is_member: true,
            is_manager: true,
        });
    }

    Ok(teams.get_team_role(team_id, user.id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::UserRole;
    use chrono::Utc;

    fn user(id: i32, role: UserRole) -> User {
        let now = Utc::now();
        User {
            id,
            username: format!("user{}", id),
            password: String::new(),
            email: format!("user{}@example.com", id),
            full_name: "Test User".to_string(),
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

    fn project(owner_id: Option<i32>, is_personal: bool) -> Project {
        let now = Utc::now();
        Project {
            id: 7,
            name: "Website".to_string(),
            description: None,
            is_personal,
            estimated_hours: None,
            deadline: None,
            owner_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn task(user_id: i32) -> Task {
        Task {
            id: 3,
            name: "Write docs".to_string(),
            description: None,
            color: "#3B82F6".to_string(),
            estimated_hours: None,
            deadline: None,
            is_active: true,
            is_completed: false,
            completed_at: None,
            created_at: Utc::now(),
            source: "manual".to_string(),
            user_id,
            project_id: Some(7),
        }
    }

    const NONE: ProjectTeamAccess = ProjectTeamAccess {
        is_member: false,
        is_manager: false,
    };
    const MEMBER: ProjectTeamAccess = ProjectTeamAccess {
        is_member: true,
        is_manager: false,
    };
    const MANAGER: ProjectTeamAccess = ProjectTeamAccess {
        is_member: true,
        is_manager: true,
    };

    #[test]
    fn owner_can_view_and_edit_own_project() {
        let owner = user(1, UserRole::User);
        let project = project(Some(1), true);
        assert!(can_view_project(&owner, &project, NONE));
        assert!(can_edit_project(&owner, &project, NONE));
    }

    #[test]
    fn strangers_cannot_see_personal_projects() {
        let stranger = user(2, UserRole::User);
        let project = project(Some(1), true);
        assert!(!can_view_project(&stranger, &project, NONE));
        assert!(!can_edit_project(&stranger, &project, NONE));
    }

    #[test]
    fn team_members_view_but_do_not_edit() {
        let member = user(2, UserRole::User);
        let project = project(Some(1), false);
        assert!(can_view_project(&member, &project, MEMBER));
        assert!(!can_edit_project(&member, &project, MEMBER));
    }

    #[test]
    fn team_managers_edit_bound_projects() {
        let manager = user(3, UserRole::User);
        let project = project(Some(1), false);
        assert!(can_edit_project(&manager, &project, MANAGER));
    }

    #[test]
    fn admins_bypass_project_rules() {
        let admin = user(9, UserRole::Admin);
        let project = project(None, false);
        assert!(can_view_project(&admin, &project, NONE));
        assert!(can_edit_project(&admin, &project, NONE));
    }

    #[test]
    fn team_roles() {
        let someone = user(2, UserRole::User);
        let member = TeamRole {
            is_member: true,
            is_manager: false,
        };
        assert!(can_view_team(&someone, member));
        assert!(!can_manage_team(&someone, member));
        assert!(!can_view_team(&someone, TeamRole::default()));
        assert!(can_manage_team(&user(1, UserRole::Admin), TeamRole::default()));
    }

    #[test]
    fn task_creator_keeps_access_without_project_rights() {
        let creator = user(5, UserRole::User);
        let permissions = task_permissions(&creator, &task(5), Some(Permissions::default()));
        assert!(permissions.view && permissions.edit);
    }

    #[test]
    fn task_access_follows_project_for_others() {
        let viewer = user(6, UserRole::User);
        let permissions = task_permissions(
            &viewer,
            &task(5),
            Some(Permissions {
                view: true,
                edit: false,
            }),
        );
        assert!(permissions.view);
        assert!(!permissions.edit);

        let outsider = task_permissions(&viewer, &task(5), None);
        assert!(!outsider.view);
    }

    #[test]
    fn entries_belong_to_their_user() {
        let entry = TimeEntry {
            id: 1,
            task_id: 3,
            start_time: Utc::now(),
            end_time: None,
            duration: None,
            is_running: true,
            notes: None,
            created_at: Utc::now(),
            user_id: 5,
        };
        assert!(can_access_entry(&user(5, UserRole::User), &entry));
        assert!(!can_access_entry(&user(6, UserRole::User), &entry));
        assert!(can_access_entry(&user(1, UserRole::Admin), &entry));
    }
}
