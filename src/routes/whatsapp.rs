use actix_web::web;

use crate::handlers::whatsapp;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/whatsapp")
            .route("/integration", web::get().to(whatsapp::get_integration))
            .route("/integration", web::post().to(whatsapp::create_integration))
            .route(
                "/integration/{id}",
                web::put().to(whatsapp::update_integration),
            )
            .route(
                "/integration/{id}",
                web::delete().to(whatsapp::delete_integration),
            )
            .route("/logs", web::get().to(whatsapp::get_logs)),
    );
}
