/// User directory route handlers. `/me` routes are self-service; everything
/// else on the collection is admin-only.
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, Result};
use crate::handlers::page_bounds;
use crate::middleware::{require_admin, AuthenticatedUser};
use crate::models::{NewUser, UserPatch, UserResponse};
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct PageQuery {
    /// 1-based page number
    pub page: Option<i64>,
    /// Page size, clamped to 1..=50
    pub size: Option<i64>,
}

/// Admin-created directory record. No password: the identity provider owns
/// credentials, and the provider id is linked when this email first logs in.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(PageQuery),
    responses(
        (status = 200, description = "Users, newest first", body = [UserResponse]),
        (status = 403, description = "Admin privileges required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    require_admin(&auth.user)?;

    let (limit, offset) = page_bounds(query.page, query.size);
    let users = state.users.list(limit, offset).await?;

    Ok(HttpResponse::Ok().json(users.into_iter().map(UserResponse::from).collect::<Vec<_>>()))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Directory record created", body = UserResponse),
        (status = 403, description = "Admin privileges required", body = ErrorResponse),
        (status = 409, description = "Email already taken", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    payload: web::Json<CreateUserRequest>,
) -> Result<HttpResponse> {
    require_admin(&auth.user)?;

    let email = payload.email.trim().to_lowercase();
    let name = payload.name.trim().to_string();
    let request = CreateUserRequest {
        email,
        name,
        is_admin: payload.is_admin,
        is_active: payload.is_active,
    };
    request.validate()?;

    if state.users.find_by_email(&request.email).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "user with email {} already exists",
            request.email
        )));
    }

    let user = state
        .users
        .create(NewUser {
            provider_user_id: None,
            email: request.email,
            display_name: request.name,
            is_active: request.is_active,
            is_admin: request.is_admin,
        })
        .await?;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Acting user's profile", body = UserResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(auth: AuthenticatedUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(UserResponse::from(auth.user)))
}

#[utoipa::path(
    patch,
    path = "/api/users/me",
    tag = "Users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_me(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    payload: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    let request = UpdateProfileRequest {
        name: payload.name.as_deref().map(|name| name.trim().to_string()),
    };
    request.validate()?;

    // Self-service updates touch the display name only; flags are admin's.
    let user = state
        .users
        .update(
            auth.id(),
            UserPatch {
                display_name: request.name,
                ..UserPatch::default()
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", auth.id())))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 403, description = "Admin privileges required", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    require_admin(&auth.user)?;

    let id = path.into_inner();
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = AdminUpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 403, description = "Admin privileges required", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    payload: web::Json<AdminUpdateUserRequest>,
) -> Result<HttpResponse> {
    require_admin(&auth.user)?;

    let request = AdminUpdateUserRequest {
        name: payload.name.as_deref().map(|name| name.trim().to_string()),
        is_active: payload.is_active,
        is_admin: payload.is_admin,
    };
    request.validate()?;

    let id = path.into_inner();
    let user = state
        .users
        .update(
            id,
            UserPatch {
                display_name: request.name,
                is_active: request.is_active,
                is_admin: request.is_admin,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Deletes the local record only; the provider account is untouched.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin privileges required", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    require_admin(&auth.user)?;

    let id = path.into_inner();
    if !state.users.delete(id).await? {
        return Err(ApiError::NotFound(format!("user {id} not found")));
    }

    Ok(HttpResponse::NoContent().finish())
}
