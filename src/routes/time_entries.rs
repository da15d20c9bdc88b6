use actix_web::web;

use crate::handlers::time_entries;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/time-entries")
            .route("", web::get().to(time_entries::list_entries))
            .route("", web::post().to(time_entries::create_entry))
            .route("", web::delete().to(time_entries::delete_all_entries))
            .route("/running", web::get().to(time_entries::running_entries))
            .route("/start", web::post().to(time_entries::start_timer))
            .route(
                "/task/{task_id}",
                web::get().to(time_entries::task_entries),
            )
            .route("/{id}", web::get().to(time_entries::get_entry))
            .route("/{id}", web::put().to(time_entries::update_entry))
            .route("/{id}", web::delete().to(time_entries::delete_entry))
            .route("/{id}/stop", web::post().to(time_entries::stop_timer)),
    );
}
