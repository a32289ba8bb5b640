/// Identity provider client.
///
/// The external auth service is the system of record for credentials; this
/// module only forwards signup/login/revoke calls and maps the provider's
/// response shapes into internal outcomes. Nothing provider-specific leaks
/// past this boundary.
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::config::ProviderConfig;
use crate::error::{ApiError, Result};

/// Provider calls are synchronous request-scoped I/O with a fixed timeout;
/// failures surface immediately, no retries.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(15);

/// The provider's view of a user, reduced to what the directory needs.
#[derive(Debug, Clone)]
pub struct ProviderIdentity {
    pub id: String,
    pub email: String,
}

/// Outcome of a successful password grant. `session_token` is the provider's
/// own access token, opaque to this service.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub identity: ProviderIdentity,
    pub session_token: String,
}

/// Seam between the auth bridge and the external auth service. The HTTP
/// implementation is [`GoTrueClient`]; tests substitute a mock.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register credentials with the provider. 4xx responses (duplicate or
    /// invalid credentials) map to `ProviderRejected`.
    async fn signup(&self, email: &str, password: &str, name: &str) -> Result<ProviderIdentity>;

    /// Verify credentials via the password grant. 4xx responses map to
    /// `InvalidCredentials`.
    async fn password_grant(&self, email: &str, password: &str) -> Result<ProviderSession>;

    /// Revoke the provider's own session token.
    async fn revoke(&self, session_token: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignupMetadata<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email_redirect_to: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SignupMetadata<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct PasswordGrantRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct PasswordGrantResponse {
    access_token: String,
    user: ProviderUser,
}

/// HTTP client for a GoTrue-style auth API.
#[derive(Clone)]
pub struct GoTrueClient {
    base_url: String,
    api_key: String,
    email_redirect_url: Option<String>,
    http: Client,
}

impl GoTrueClient {
    pub fn new(config: &ProviderConfig) -> Self {
        GoTrueClient {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            email_redirect_url: config.email_redirect_url.clone(),
            http: Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Reduce a provider 4xx body to a single message: `msg`,
    /// `error_description`, then `error`, first present wins.
    fn rejection_message(body: &str) -> String {
        if let Ok(value) = serde_json::from_str::<Value>(body) {
            for field in ["msg", "error_description", "error"] {
                if let Some(message) = value.get(field).and_then(Value::as_str) {
                    return message.to_string();
                }
            }
        }
        "request rejected".to_string()
    }
}

#[async_trait::async_trait]
impl IdentityProvider for GoTrueClient {
    async fn signup(&self, email: &str, password: &str, name: &str) -> Result<ProviderIdentity> {
        let url = self.endpoint("/auth/v1/signup");
        debug!(url = %url, email = %email, "forwarding signup to identity provider");

        let response = self
            .http
            .post(&url)
            .timeout(PROVIDER_TIMEOUT)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&SignupRequest {
                email,
                password,
                data: SignupMetadata { name },
                email_redirect_to: self.email_redirect_url.as_deref(),
            })
            .send()
            .await
            .map_err(|e| ApiError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::ProviderUnavailable(e.to_string()))?;

        if status.is_client_error() {
            return Err(ApiError::ProviderRejected(Self::rejection_message(&body)));
        }
        if !status.is_success() {
            error!(status = %status, "identity provider signup failed");
            return Err(ApiError::ProviderUnavailable(format!(
                "signup returned {status}"
            )));
        }

        // The success body is either the user object itself or an envelope
        // `{user: {...}, session: ...}` when the provider auto-confirms.
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ApiError::ProviderUnavailable(format!("unparseable signup body: {e}")))?;
        let user_value = value.get("user").cloned().unwrap_or(value);
        let user: ProviderUser = serde_json::from_value(user_value)
            .map_err(|e| ApiError::ProviderUnavailable(format!("unexpected signup body: {e}")))?;

        Ok(ProviderIdentity {
            id: user.id,
            email: user.email,
        })
    }

    async fn password_grant(&self, email: &str, password: &str) -> Result<ProviderSession> {
        let url = self.endpoint("/auth/v1/token?grant_type=password");
        debug!(email = %email, "forwarding password grant to identity provider");

        let response = self
            .http
            .post(&url)
            .timeout(PROVIDER_TIMEOUT)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&PasswordGrantRequest { email, password })
            .send()
            .await
            .map_err(|e| ApiError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            debug!(reason = %Self::rejection_message(&body), "password grant rejected");
            return Err(ApiError::InvalidCredentials);
        }
        if !status.is_success() {
            error!(status = %status, "identity provider password grant failed");
            return Err(ApiError::ProviderUnavailable(format!(
                "password grant returned {status}"
            )));
        }

        let grant: PasswordGrantResponse = response
            .json()
            .await
            .map_err(|e| ApiError::ProviderUnavailable(format!("unexpected grant body: {e}")))?;

        Ok(ProviderSession {
            identity: ProviderIdentity {
                id: grant.user.id,
                email: grant.user.email,
            },
            session_token: grant.access_token,
        })
    }

    async fn revoke(&self, session_token: &str) -> Result<()> {
        let url = self.endpoint("/auth/v1/logout");

        let response = self
            .http
            .post(&url)
            .timeout(PROVIDER_TIMEOUT)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {session_token}"))
            .send()
            .await
            .map_err(|e| ApiError::ProviderUnavailable(e.to_string()))?;

        // 200 and 204 both mean revoked.
        match response.status().as_u16() {
            200 | 204 => Ok(()),
            other => Err(ApiError::ProviderUnavailable(format!(
                "revoke returned {other}"
            ))),
        }
    }
}
