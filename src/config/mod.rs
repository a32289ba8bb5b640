use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// External identity provider endpoint and credentials.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    /// Forwarded to the provider on signup for email confirmation links.
    pub email_redirect_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_ttl: i64,
    pub refresh_token_ttl: i64,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins; "*" allows any origin.
    pub allowed_origins: String,
    pub max_age: u64,
}

// Default value functions
fn default_app_env() -> String {
    "development".to_string()
}

fn default_app_host() -> String {
    "0.0.0.0".to_string()
}

fn default_app_port() -> u16 {
    8080
}

fn default_db_max_connections() -> u32 {
    20
}

fn default_jwt_access_ttl() -> i64 {
    900 // 15 minutes
}

fn default_jwt_refresh_ttl() -> i64 {
    604800 // 7 days
}

fn default_cors_allowed_origins() -> String {
    "*".to_string()
}

fn default_cors_max_age() -> u64 {
    3600 // 1 hour
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let app = AppConfig {
            env: env::var("APP_ENV").unwrap_or_else(|_| default_app_env()),
            host: env::var("APP_HOST").unwrap_or_else(|_| default_app_host()),
            port: env::var("APP_PORT")
                .unwrap_or_else(|_| default_app_port().to_string())
                .parse()
                .unwrap_or_else(|_| default_app_port()),
        };

        let database = DatabaseConfig {
            url: require("DATABASE_URL")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| default_db_max_connections().to_string())
                .parse()
                .unwrap_or_else(|_| default_db_max_connections()),
        };

        let provider = ProviderConfig {
            base_url: require("IDENTITY_PROVIDER_URL")?,
            api_key: require("IDENTITY_PROVIDER_API_KEY")?,
            email_redirect_url: env::var("EMAIL_REDIRECT_URL").ok(),
        };

        let jwt = JwtConfig {
            secret: require("JWT_SECRET")?,
            access_token_ttl: env::var("JWT_ACCESS_TOKEN_TTL")
                .unwrap_or_else(|_| default_jwt_access_ttl().to_string())
                .parse()
                .unwrap_or_else(|_| default_jwt_access_ttl()),
            refresh_token_ttl: env::var("JWT_REFRESH_TOKEN_TTL")
                .unwrap_or_else(|_| default_jwt_refresh_ttl().to_string())
                .parse()
                .unwrap_or_else(|_| default_jwt_refresh_ttl()),
        };

        let cors = CorsConfig {
            allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| default_cors_allowed_origins()),
            max_age: env::var("CORS_MAX_AGE")
                .unwrap_or_else(|_| default_cors_max_age().to_string())
                .parse()
                .unwrap_or_else(|_| default_cors_max_age()),
        };

        Ok(Config {
            app,
            database,
            provider,
            jwt,
            cors,
        })
    }
}
