use actix_web::web;

use crate::handlers::auth;
use crate::middleware::AuthRateLimiter;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/status", web::get().to(auth::status))
            .route("/setup", web::post().to(auth::setup))
            .service(
                web::resource("/login")
                    .wrap(AuthRateLimiter::login())
                    .route(web::post().to(auth::login)),
            )
            .route("/me", web::get().to(auth::me))
            .route("/change-password", web::post().to(auth::change_password))
            .route("/reset-password", web::post().to(auth::reset_password))
            .service(
                web::resource("/recover")
                    .wrap(AuthRateLimiter::recovery())
                    .route(web::post().to(auth::recover)),
            )
            .route("/api-key", web::post().to(auth::regenerate_api_key))
            .route("/recovery-key", web::post().to(auth::regenerate_recovery_key)),
    );
}
