pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod security;
pub mod services;

use std::sync::Arc;

use db::{StatusStore, UserStore};
use security::TokenService;
use services::{AuthService, IdentityProvider};

/// Shared per-process state, built once at startup and handed to actix as
/// `web::Data`. Stores and the provider are trait objects so tests can wire
/// in-memory substitutes.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub statuses: Arc<dyn StatusStore>,
    pub tokens: TokenService,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        statuses: Arc<dyn StatusStore>,
        provider: Arc<dyn IdentityProvider>,
        tokens: TokenService,
    ) -> Self {
        let auth = AuthService::new(Arc::clone(&users), provider, tokens.clone());
        AppState {
            users,
            statuses,
            tokens,
            auth,
        }
    }
}
