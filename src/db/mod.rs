use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod status_store;
pub mod user_store;

pub use status_store::{PgStatusStore, StatusStore};
pub use user_store::{PgUserStore, UserStore};

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
