use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::ApiError;
use crate::models::User;
use crate::security::revocation::RevocationSet;

/// What a token is allowed to be used for. Checked on every validation; a
/// token never carries both purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Access,
    Refresh,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Access => "access",
            TokenPurpose::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: local user id
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Purpose: access or refresh
    pub token_type: TokenPurpose,
    /// Admin flag at mint time
    pub is_admin: bool,
    /// Unique token id, the revocation key
    pub jti: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Mints and validates the service's own signed tokens, independent of the
/// identity provider. HS256 over the configured secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: i64,
    refresh_ttl: i64,
    revocations: Arc<RevocationSet>,
}

impl TokenService {
    pub fn new(config: &JwtConfig, revocations: Arc<RevocationSet>) -> Self {
        TokenService {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
            revocations,
        }
    }

    /// Signs a token for `subject` with the given purpose and lifetime.
    pub fn mint(
        &self,
        subject: Uuid,
        is_admin: bool,
        purpose: TokenPurpose,
        ttl_secs: i64,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
            token_type: purpose,
            is_admin,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
    }

    /// Fresh access/refresh pair bound to the user's current id and admin
    /// flag, with OAuth-style metadata.
    pub fn issue_pair(&self, user: &User) -> Result<TokenResponse, ApiError> {
        let access_token = self.mint(user.id, user.is_admin, TokenPurpose::Access, self.access_ttl)?;
        let refresh_token =
            self.mint(user.id, user.is_admin, TokenPurpose::Refresh, self.refresh_ttl)?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl,
        })
    }

    /// Checks signature, expiry (`now < exp`, zero leeway), purpose, and the
    /// revocation set. Each failure mode is a distinct error so callers can
    /// react differently.
    pub fn validate(&self, token: &str, expected: TokenPurpose) -> Result<Claims, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => ApiError::TokenExpired,
                _ => ApiError::TokenMalformed,
            }
        })?;

        let claims = data.claims;
        if claims.token_type != expected {
            return Err(ApiError::TokenPurposeMismatch);
        }
        if self.revocations.contains(&claims.jti) {
            return Err(ApiError::TokenRevoked);
        }

        Ok(claims)
    }

    /// Denylists the claims' token id until the token's own expiry.
    pub fn revoke(&self, claims: &Claims) {
        self.revocations.insert(&claims.jti, claims.exp);
    }
}
