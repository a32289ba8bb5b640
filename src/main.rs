use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use status_service::config::Config;
use status_service::db::{self, PgStatusStore, PgUserStore};
use status_service::openapi::ApiDoc;
use status_service::routes::configure_routes;
use status_service::security::{RevocationSet, TokenService};
use status_service::services::GoTrueClient;
use status_service::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.app.env,
        "starting status-service"
    );

    let pool = db::create_pool(&config.database.url, config.database.max_connections)
        .await
        .context("failed to connect to database")?;

    db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;
    tracing::info!("database migrations applied");

    let revocations = Arc::new(RevocationSet::new());
    let tokens = TokenService::new(&config.jwt, revocations);
    let provider = Arc::new(GoTrueClient::new(&config.provider));
    tracing::info!(provider_url = %config.provider.base_url, "identity provider client ready");

    let state = AppState::new(
        Arc::new(PgUserStore::new(pool.clone())),
        Arc::new(PgStatusStore::new(pool)),
        provider,
        tokens,
    );

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!(address = %bind_address, "starting HTTP server");

    let cors_config = config.cors.clone();
    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in cors_config.allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors
            .allow_any_method()
            .allow_any_header()
            .max_age(cors_config.max_age as usize);

        let openapi_doc = ApiDoc::openapi();

        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api/openapi.json", openapi_doc.clone()),
            )
            .configure(configure_routes)
    })
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {bind_address}"))?
    .run()
    .await
    .context("server error")
}
