use actix_web::web;

use crate::handlers::notifications;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/notification-settings")
            .route(web::get().to(notifications::get_settings))
            .route(web::put().to(notifications::update_settings)),
    );
}
