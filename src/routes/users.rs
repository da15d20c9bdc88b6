use actix_web::web;

use crate::handlers::users;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::get().to(users::list_users))
            .route("", web::post().to(users::create_user))
            .route("/{id}", web::get().to(users::get_user))
            .route("/{id}", web::put().to(users::update_user))
            .route("/{id}", web::delete().to(users::delete_user))
            .route(
                "/{id}/managed-teams",
                web::get().to(users::get_managed_teams),
            )
            .route(
                "/{id}/managed-teams",
                web::put().to(users::update_managed_teams),
            ),
    );
}
