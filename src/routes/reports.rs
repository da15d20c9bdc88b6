use actix_web::web;

use crate::handlers::reports;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/reports")
            .route("/dashboard", web::get().to(reports::dashboard))
            .route("/time-by-task", web::get().to(reports::time_by_task))
            .route("/daily", web::get().to(reports::daily)),
    );
}
