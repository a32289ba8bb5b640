//! Route configuration
//!
//! Centralized route setup; each domain configures its own scope. Auth
//! routes are public (logout included, so it stays idempotent with any token
//! state); user and status scopes sit behind the guard.

use actix_web::web;

use crate::handlers;
use crate::middleware::AuthGuard;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health::health_check))
        .service(
            web::scope("/api")
                .configure(auth_routes)
                .configure(user_routes)
                .configure(status_routes),
        );
}

fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(handlers::auth::signup))
            .route("/login", web::post().to(handlers::auth::login))
            .route("/refresh", web::post().to(handlers::auth::refresh))
            .route("/logout", web::post().to(handlers::auth::logout)),
    );
}

fn user_routes(cfg: &mut web::ServiceConfig) {
    // "/me" is registered before "/{id}" so it never matches as an id.
    cfg.service(
        web::scope("/users")
            .wrap(AuthGuard)
            .route("/me", web::get().to(handlers::users::get_me))
            .route("/me", web::patch().to(handlers::users::update_me))
            .route("", web::get().to(handlers::users::list_users))
            .route("", web::post().to(handlers::users::create_user))
            .route("/{id}", web::get().to(handlers::users::get_user))
            .route("/{id}", web::patch().to(handlers::users::update_user))
            .route("/{id}", web::delete().to(handlers::users::delete_user)),
    );
}

fn status_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/statuses")
            .wrap(AuthGuard)
            .route("", web::get().to(handlers::statuses::list_statuses))
            .route("", web::post().to(handlers::statuses::create_status))
            .route("/{id}", web::get().to(handlers::statuses::get_status))
            .route("/{id}", web::patch().to(handlers::statuses::update_status))
            .route("/{id}", web::delete().to(handlers::statuses::delete_status)),
    );
}
