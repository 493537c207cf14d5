//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;

use actix_web::web;

/// Configure all application routes.
///
/// Fixed `/posts/...` segments are registered before `/posts/{id}` so they
/// are never captured as an id.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("", web::post().to(posts::create))
                    .route("/mine", web::get().to(posts::mine))
                    .route("/tags", web::get().to(posts::tags))
                    .route("/tag/{tag}", web::get().to(posts::by_tag))
                    .route("/publish", web::post().to(posts::publish))
                    .route("/{id}/draft", web::put().to(posts::update_draft))
                    .route("/{id}/status", web::patch().to(posts::set_status))
                    .route("/{id}", web::get().to(posts::get))
                    .route("/{id}", web::patch().to(posts::update))
                    .route("/{id}", web::delete().to(posts::delete)),
            ),
    );
}
