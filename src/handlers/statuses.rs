/// Status CRUD handlers. Every item operation goes through the
/// owner-or-admin check; listing is scoped to the requester unless admin.
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{ApiError, Result};
use crate::handlers::page_bounds;
use crate::middleware::{require_owner_or_admin, AuthenticatedUser};
use crate::models::{NewStatus, Status, StatusFilter, StatusPatch, StatusResponse, StatusState};
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatusListQuery {
    /// Narrow to a single state
    pub state: Option<StatusState>,
    /// 1-based page number
    pub page: Option<i64>,
    /// Page size, clamped to 1..=50
    pub size: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStatusRequest {
    #[validate(length(min = 1, max = 200))]
    #[schema(example = "Investigate login latency")]
    pub title: String,
    pub description: Option<String>,
    pub state: Option<StatusState>,
}

/// Partial update. Absent and `null` fields are both "unchanged"; clearing
/// the description means sending an empty string.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub state: Option<StatusState>,
}

#[utoipa::path(
    get,
    path = "/api/statuses",
    tag = "Statuses",
    params(StatusListQuery),
    responses(
        (status = 200, description = "Own statuses (admins see all), newest first", body = [StatusResponse])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_statuses(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    query: web::Query<StatusListQuery>,
) -> Result<HttpResponse> {
    let filter = StatusFilter {
        owner: (!auth.is_admin()).then(|| auth.id()),
        state: query.state,
    };
    let (limit, offset) = page_bounds(query.page, query.size);

    let statuses = state.statuses.list(filter, limit, offset).await?;

    Ok(HttpResponse::Ok().json(
        statuses
            .into_iter()
            .map(StatusResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/statuses",
    tag = "Statuses",
    request_body = CreateStatusRequest,
    responses(
        (status = 201, description = "Status created, owned by the requester", body = StatusResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_status(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    payload: web::Json<CreateStatusRequest>,
) -> Result<HttpResponse> {
    let request = CreateStatusRequest {
        title: payload.title.trim().to_string(),
        description: payload.description.clone(),
        state: payload.state,
    };
    request.validate()?;

    let status = state
        .statuses
        .create(NewStatus {
            title: request.title,
            description: request.description,
            state: request.state.unwrap_or_default(),
            owner_user_id: auth.id(),
        })
        .await?;

    Ok(HttpResponse::Created().json(StatusResponse::from(status)))
}

#[utoipa::path(
    get,
    path = "/api/statuses/{id}",
    tag = "Statuses",
    params(("id" = i64, Path, description = "Status id")),
    responses(
        (status = 200, description = "Status record", body = StatusResponse),
        (status = 403, description = "Not the owner and not admin", body = ErrorResponse),
        (status = 404, description = "No such status", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_status(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let status = owned_status(&state, &auth, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(StatusResponse::from(status)))
}

#[utoipa::path(
    patch,
    path = "/api/statuses/{id}",
    tag = "Statuses",
    params(("id" = i64, Path, description = "Status id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated status", body = StatusResponse),
        (status = 403, description = "Not the owner and not admin", body = ErrorResponse),
        (status = 404, description = "No such status", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_status(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    path: web::Path<i64>,
    payload: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse> {
    let request = UpdateStatusRequest {
        title: payload.title.as_deref().map(|title| title.trim().to_string()),
        description: payload.description.clone(),
        state: payload.state,
    };
    request.validate()?;

    let id = path.into_inner();
    let status = owned_status(&state, &auth, id).await?;

    let updated = state
        .statuses
        .update(
            status.id,
            StatusPatch {
                title: request.title,
                description: request.description,
                state: request.state,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("status {id} not found")))?;

    Ok(HttpResponse::Ok().json(StatusResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/statuses/{id}",
    tag = "Statuses",
    params(("id" = i64, Path, description = "Status id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner and not admin", body = ErrorResponse),
        (status = 404, description = "No such status", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_status(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let status = owned_status(&state, &auth, id).await?;

    if !state.statuses.delete(status.id).await? {
        return Err(ApiError::NotFound(format!("status {id} not found")));
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Fetches the record and applies the ownership check. 404 before 403: a
/// missing resource is not an authorization question.
async fn owned_status(
    state: &web::Data<AppState>,
    auth: &AuthenticatedUser,
    id: i64,
) -> Result<Status> {
    let status = state
        .statuses
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("status {id} not found")))?;

    require_owner_or_admin(&auth.user, status.owner_user_id)?;

    Ok(status)
}
