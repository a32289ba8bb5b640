pub mod auth;

pub use auth::{
    bearer_token, require_admin, require_owner_or_admin, AuthGuard, AuthenticatedUser,
};
