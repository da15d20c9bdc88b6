use actix_web::web;

use crate::handlers::teams;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/teams")
            .route("", web::get().to(teams::list_teams))
            .route("", web::post().to(teams::create_team))
            .route("/managed", web::get().to(teams::managed_teams))
            .route("/{id}", web::get().to(teams::get_team))
            .route("/{id}", web::put().to(teams::update_team))
            .route("/{id}", web::delete().to(teams::delete_team))
            .route("/{id}/members", web::get().to(teams::get_members))
            .route("/{id}/members", web::post().to(teams::add_member))
            .route(
                "/{id}/members/{user_id}",
                web::delete().to(teams::remove_member),
            )
            .route("/{id}/managers", web::get().to(teams::get_managers))
            .route("/{id}/managers", web::post().to(teams::add_manager))
            .route(
                "/{id}/managers/{user_id}",
                web::delete().to(teams::remove_manager),
            )
            .route("/{id}/projects", web::get().to(teams::get_team_projects)),
    );
}
