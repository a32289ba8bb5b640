use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Identity provider rejected the request: {0}")]
    ProviderRejected(String),

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token malformed")]
    TokenMalformed,

    #[error("Token purpose mismatch")]
    TokenPurposeMismatch,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Account is deactivated")]
    AccountInactive,

    #[error("Insufficient permissions: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Directory error: {0}")]
    Directory(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Machine-readable code carried in every error body.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::ProviderRejected(_) => "PROVIDER_REJECTED",
            ApiError::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::TokenExpired => "TOKEN_EXPIRED",
            ApiError::TokenMalformed => "TOKEN_MALFORMED",
            ApiError::TokenPurposeMismatch => "TOKEN_PURPOSE_MISMATCH",
            ApiError::TokenRevoked => "TOKEN_REVOKED",
            ApiError::AccountInactive => "ACCOUNT_INACTIVE",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Directory(_) => "DIRECTORY_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Stable machine-readable error code
    #[schema(example = "TOKEN_EXPIRED")]
    pub error: String,
    /// Human-readable description
    pub message: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ProviderRejected(_) => StatusCode::BAD_REQUEST,
            ApiError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::TokenExpired => StatusCode::UNAUTHORIZED,
            ApiError::TokenMalformed => StatusCode::UNAUTHORIZED,
            ApiError::TokenPurposeMismatch => StatusCode::UNAUTHORIZED,
            ApiError::TokenRevoked => StatusCode::UNAUTHORIZED,
            ApiError::AccountInactive => StatusCode::FORBIDDEN,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        HttpResponse::build(status_code).json(ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
        })
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}
