/// Auth bridge: translates between the external identity provider's sessions
/// and the service's own signed tokens.
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::UserStore;
use crate::error::{ApiError, Result};
use crate::models::{NewUser, User};
use crate::security::{Claims, TokenPurpose, TokenResponse, TokenService};
use crate::services::provider::IdentityProvider;

/// Orchestrates signup/login/refresh/logout across the identity provider,
/// the user directory, and the token service. Credentials are forwarded to
/// the provider and never stored locally.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    provider: Arc<dyn IdentityProvider>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        provider: Arc<dyn IdentityProvider>,
        tokens: TokenService,
    ) -> Self {
        AuthService {
            users,
            provider,
            tokens,
        }
    }

    /// Registers credentials with the provider, then creates (or reuses) the
    /// local directory record. No tokens are issued: the provider may still
    /// require email confirmation.
    ///
    /// Local creation is idempotent by email, so a retry after a directory
    /// failure reuses the provider account instead of duplicating it.
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> Result<User> {
        let identity = self.provider.signup(email, password, name).await?;

        // Provider succeeded; a directory failure past this point is the
        // documented partial-failure state, surfaced as 500 and retryable.
        if let Some(existing) = self.users.find_by_email(email).await? {
            let user = if existing.provider_user_id.is_none() {
                self.users.link_provider_id(existing.id, &identity.id).await?
            } else {
                existing
            };
            info!(user_id = %user.id, "signup reused existing directory record");
            return Ok(user);
        }

        let user = self
            .users
            .create(NewUser {
                provider_user_id: Some(identity.id),
                email: email.to_string(),
                display_name: name.to_string(),
                is_active: true,
                is_admin: false,
            })
            .await?;

        info!(user_id = %user.id, "signup created directory record");
        Ok(user)
    }

    /// Verifies credentials against the provider, resolves the local user,
    /// and mints a fresh internal token pair.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse> {
        let session = self.provider.password_grant(email, password).await?;
        let user = self.resolve_identity(&session.identity.id, email).await?;

        if !user.is_active {
            warn!(user_id = %user.id, "login refused for deactivated account");
            return Err(ApiError::AccountInactive);
        }

        info!(user_id = %user.id, "login issued token pair");
        self.tokens.issue_pair(&user)
    }

    /// Validates a refresh token, re-reads the user so flag changes since
    /// mint time are honored, revokes the presented token (rotation), and
    /// mints a new pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        let claims = self.tokens.validate(refresh_token, TokenPurpose::Refresh)?;
        let user = self.subject_user(&claims).await?;

        if !user.is_active {
            return Err(ApiError::AccountInactive);
        }

        self.tokens.revoke(&claims);
        debug!(user_id = %user.id, "refresh rotated token pair");
        self.tokens.issue_pair(&user)
    }

    /// Best-effort logout, idempotent from the caller's perspective.
    ///
    /// A still-valid access token has its id denylisted until its own expiry;
    /// tokens that no longer validate are ignored. An external session token,
    /// when supplied, is forwarded to the provider's revoke endpoint; revoke
    /// failures are logged and swallowed.
    pub async fn logout(&self, access_token: Option<&str>, external_token: Option<&str>) {
        if let Some(token) = access_token {
            match self.tokens.validate(token, TokenPurpose::Access) {
                Ok(claims) => {
                    self.tokens.revoke(&claims);
                    info!(subject = %claims.sub, "access token revoked on logout");
                }
                Err(reason) => {
                    debug!(%reason, "logout presented an unusable access token");
                }
            }
        }

        if let Some(token) = external_token {
            if let Err(reason) = self.provider.revoke(token).await {
                warn!(%reason, "provider session revoke failed; continuing logout");
            }
        }
    }

    /// Resolves a provider identity to the local record: provider id first,
    /// then email (linking the provider id onto a record that lacks one),
    /// creating the record when neither matches.
    async fn resolve_identity(&self, provider_user_id: &str, email: &str) -> Result<User> {
        if let Some(user) = self.users.find_by_provider_id(provider_user_id).await? {
            return Ok(user);
        }

        if let Some(user) = self.users.find_by_email(email).await? {
            debug!(user_id = %user.id, "linking provider identity to existing record");
            return self.users.link_provider_id(user.id, provider_user_id).await;
        }

        self.users
            .create(NewUser {
                provider_user_id: Some(provider_user_id.to_string()),
                email: email.to_string(),
                display_name: email.to_string(),
                is_active: true,
                is_admin: false,
            })
            .await
    }

    async fn subject_user(&self, claims: &Claims) -> Result<User> {
        let subject = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::TokenMalformed)?;
        self.users
            .find_by_id(subject)
            .await?
            .ok_or_else(|| ApiError::Forbidden("token subject no longer exists".to_string()))
    }
}
