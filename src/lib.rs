pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rest;

use sqlx::sqlite::SqlitePool;

use crate::auth::tokens::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &config::Config) -> Self {
        Self {
            db,
            tokens: TokenService::new(
                &config.jwt_secret,
                config.access_token_ttl,
                config.refresh_token_ttl,
            ),
        }
    }
}

pub fn app(state: AppState) -> axum::Router {
    rest::router(state)
}
