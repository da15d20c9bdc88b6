use actix_web::web;

pub mod admin;
pub mod auth;
pub mod notifications;
pub mod projects;
pub mod reports;
pub mod tasks;
pub mod teams;
pub mod time_entries;
pub mod users;
pub mod whatsapp;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(auth::configure)
            .configure(users::configure)
            .configure(teams::configure)
            .configure(projects::configure)
            .configure(tasks::configure)
            .configure(time_entries::configure)
            .configure(reports::configure)
            .configure(whatsapp::configure)
            .configure(notifications::configure)
            .configure(admin::configure),
    );
}
