/// OpenAPI documentation for the status service
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Status Service API",
        description = "Ownership-scoped status tracking behind a dual-token auth bridge: \
                       identity verification is delegated to an external provider, API access \
                       is authorized by service-issued tokens",
        license(name = "MIT")
    ),
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::signup,
        crate::handlers::auth::login,
        crate::handlers::auth::refresh,
        crate::handlers::auth::logout,
        crate::handlers::users::list_users,
        crate::handlers::users::create_user,
        crate::handlers::users::get_me,
        crate::handlers::users::update_me,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::statuses::list_statuses,
        crate::handlers::statuses::create_status,
        crate::handlers::statuses::get_status,
        crate::handlers::statuses::update_status,
        crate::handlers::statuses::delete_status,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::handlers::health::HealthResponse,
        crate::handlers::auth::SignupRequest,
        crate::handlers::auth::LoginRequest,
        crate::handlers::auth::RefreshRequest,
        crate::handlers::users::CreateUserRequest,
        crate::handlers::users::UpdateProfileRequest,
        crate::handlers::users::AdminUpdateUserRequest,
        crate::handlers::statuses::CreateStatusRequest,
        crate::handlers::statuses::UpdateStatusRequest,
        crate::models::UserResponse,
        crate::models::StatusResponse,
        crate::models::StatusState,
        crate::security::TokenResponse,
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Auth", description = "Signup, login, token refresh, and logout"),
        (name = "Users", description = "User directory and self-service profile"),
        (name = "Statuses", description = "Ownership-scoped status records"),
    )
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
