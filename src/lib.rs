pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

use actix_web::web;
use sqlx::PgPool;

pub use config::Config;
use database::repositories::{
    NotificationSettingsRepository, ProjectRepository, TaskItemRepository, TaskRepository,
    TeamRepository, TimeEntryRepository, UserRepository, WhatsappRepository,
};
use handlers::shared::{json_error_handler, path_error_handler, query_error_handler};
pub use services::{AuthService, ProvisioningService};

/// Shared state handed to every worker
#[derive(Clone)]
pub struct AppState {
    pub config: web::Data<Config>,
    pub pool: web::Data<PgPool>,
    pub auth_service: web::Data<AuthService>,
    pub provisioning: web::Data<ProvisioningService>,
    pub users: web::Data<UserRepository>,
    pub teams: web::Data<TeamRepository>,
    pub projects: web::Data<ProjectRepository>,
    pub tasks: web::Data<TaskRepository>,
    pub task_items: web::Data<TaskItemRepository>,
    pub time_entries: web::Data<TimeEntryRepository>,
    pub whatsapp: web::Data<WhatsappRepository>,
    pub notifications: web::Data<NotificationSettingsRepository>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Self {
        let users = UserRepository::new(pool.clone());
        let projects = ProjectRepository::new(pool.clone());
        let tasks = TaskRepository::new(pool.clone());

        Self {
            auth_service: web::Data::new(AuthService::new(config.clone(), users.clone())),
            provisioning: web::Data::new(ProvisioningService::new(
                users.clone(),
                projects.clone(),
                tasks.clone(),
            )),
            teams: web::Data::new(TeamRepository::new(pool.clone())),
            task_items: web::Data::new(TaskItemRepository::new(pool.clone())),
            time_entries: web::Data::new(TimeEntryRepository::new(pool.clone())),
            whatsapp: web::Data::new(WhatsappRepository::new(pool.clone())),
            notifications: web::Data::new(NotificationSettingsRepository::new(pool.clone())),
            users: web::Data::new(users),
            projects: web::Data::new(projects),
            tasks: web::Data::new(tasks),
            config: web::Data::new(config),
            pool: web::Data::new(pool),
        }
    }

    /// Registers app data and the JSON/query error envelopes
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.config.clone())
            .app_data(self.pool.clone())
            .app_data(self.auth_service.clone())
            .app_data(self.provisioning.clone())
            .app_data(self.users.clone())
            .app_data(self.teams.clone())
            .app_data(self.projects.clone())
            .app_data(self.tasks.clone())
            .app_data(self.task_items.clone())
            .app_data(self.time_entries.clone())
            .app_data(self.whatsapp.clone())
            .app_data(self.notifications.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler));
    }
}
