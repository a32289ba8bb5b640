pub mod auth;
pub mod provider;

pub use auth::AuthService;
pub use provider::{GoTrueClient, IdentityProvider, ProviderIdentity, ProviderSession};
