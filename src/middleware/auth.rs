/// Authorization guard.
///
/// Per-request state machine: bearer extraction, token validation, subject
/// resolution, active check. Handlers see the resolved [`AuthenticatedUser`];
/// the ownership/admin decision itself is a pair of pure functions so it can
/// be unit-tested without a request in sight.
use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use uuid::Uuid;

use crate::error::{ApiError, Result as ApiResult};
use crate::models::User;
use crate::security::TokenPurpose;
use crate::AppState;

/// The acting user, resolved by [`AuthGuard`] and stored in request
/// extensions for handler extraction.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
}

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin
    }
}

/// Admin-only operations (user listing, admin user management).
pub fn require_admin(actor: &User) -> ApiResult<()> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden("admin privileges required".to_string()))
    }
}

/// Resource-scoped operations: the requester must own the resource or carry
/// the admin flag.
pub fn require_owner_or_admin(actor: &User, owner_user_id: Uuid) -> ApiResult<()> {
    if actor.is_admin || actor.id == owner_user_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "you do not own this resource".to_string(),
        ))
    }
}

/// Pulls the bearer token out of an Authorization header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware factory wrapping guarded scopes.
pub struct AuthGuard;

impl<S, B> Transform<S, ServiceRequest> for AuthGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthGuardService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthGuardService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            // Rejections are answered here as full responses so the error
            // body reaches the client no matter how the app is driven.
            match resolve_actor(&req).await {
                Ok(user) => {
                    req.extensions_mut().insert(AuthenticatedUser { user });
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(reason) => {
                    let response = reason.error_response().map_into_right_body();
                    Ok(req.into_response(response))
                }
            }
        })
    }
}

/// Runs the per-request state machine: bearer extraction, token validation,
/// subject resolution, active check.
async fn resolve_actor(req: &ServiceRequest) -> ApiResult<User> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Internal("application state missing".to_string()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or(ApiError::Unauthenticated)?;

    let claims = state.tokens.validate(token, TokenPurpose::Access)?;

    let subject = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::TokenMalformed)?;

    let user = state
        .users
        .find_by_id(subject)
        .await?
        .ok_or_else(|| ApiError::Forbidden("token subject no longer exists".to_string()))?;

    if !user.is_active {
        return Err(ApiError::AccountInactive);
    }

    Ok(user)
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(auth) => ready(Ok(auth)),
            None => ready(Err(ApiError::Unauthenticated.into())),
        }
    }
}
