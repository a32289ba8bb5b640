/// Auth route handlers: the HTTP face of the auth bridge.
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::Result;
use crate::middleware::bearer_token;
use crate::models::UserResponse;
use crate::AppState;

/// Header carrying the identity provider's own session token on logout.
pub const EXTERNAL_SESSION_HEADER: &str = "X-External-Session-Token";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(email)]
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1, max = 120))]
    #[schema(example = "Alice")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Profile created; no tokens until login", body = UserResponse),
        (status = 400, description = "Invalid input or provider rejection", body = ErrorResponse),
        (status = 502, description = "Identity provider unavailable", body = ErrorResponse)
    )
)]
pub async fn signup(
    state: web::Data<AppState>,
    payload: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    let email = payload.email.trim().to_lowercase();
    let name = payload.name.trim().to_string();
    let request = SignupRequest {
        email,
        password: payload.password.clone(),
        name,
    };
    request.validate()?;

    let user = state
        .auth
        .signup(&request.email, &request.password, &request.name)
        .await?;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access/refresh pair issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account deactivated", body = ErrorResponse)
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let email = payload.email.trim().to_lowercase();
    let request = LoginRequest {
        email,
        password: payload.password.clone(),
    };
    request.validate()?;

    let pair = state.auth.login(&request.email, &request.password).await?;

    Ok(HttpResponse::Ok().json(pair))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Rotated access/refresh pair", body = TokenResponse),
        (status = 401, description = "Expired, malformed, revoked, or wrong-purpose token", body = ErrorResponse),
        (status = 403, description = "Account deactivated or subject missing", body = ErrorResponse)
    )
)]
pub async fn refresh(
    state: web::Data<AppState>,
    payload: web::Json<RefreshRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let pair = state.auth.refresh(payload.refresh_token.trim()).await?;

    Ok(HttpResponse::Ok().json(pair))
}

/// Not behind the guard: logout must succeed with any token state, including
/// expired or already-revoked ones.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 204, description = "Logged out; always succeeds regardless of token state")
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let access_token = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token);

    let external_token = req
        .headers()
        .get(EXTERNAL_SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty());

    state.auth.logout(access_token, external_token).await;

    HttpResponse::NoContent().finish()
}
