use actix_web::web;

use crate::handlers::{task_items, tasks};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tasks")
            .route("", web::get().to(tasks::list_tasks))
            .route("", web::post().to(tasks::create_task))
            .route("/{id}", web::get().to(tasks::get_task))
            .route("/{id}", web::put().to(tasks::update_task))
            .route("/{id}", web::delete().to(tasks::delete_task))
            .route("/{id}/complete", web::post().to(tasks::complete_task))
            .route("/{id}/reopen", web::post().to(tasks::reopen_task))
            .route("/{id}/items", web::get().to(task_items::list_items))
            .route("/{id}/items", web::post().to(task_items::create_item))
            .route(
                "/{id}/items/complete-all",
                web::post().to(task_items::complete_all_items),
            ),
    )
    .service(
        web::scope("/task-items")
            .route("/{id}", web::put().to(task_items::update_item))
            .route("/{id}", web::delete().to(task_items::delete_item)),
    );
}
