//! Shared test harness: in-memory stores, a scriptable identity provider
//! mock, and an [`AppState`] wired from them so the full route tree runs
//! without a database or network.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use status_service::config::JwtConfig;
use status_service::db::{StatusStore, UserStore};
use status_service::error::{ApiError, Result};
use status_service::models::{
    NewStatus, NewUser, Status, StatusFilter, StatusPatch, User, UserPatch,
};
use status_service::security::{RevocationSet, TokenService};
use status_service::services::{IdentityProvider, ProviderIdentity, ProviderSession};
use status_service::AppState;

#[derive(Default)]
pub struct MemUserStore {
    users: Mutex<Vec<User>>,
}

impl MemUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed record directly, bypassing the store interface.
    pub fn seed(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn all(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    /// Flip flags the way an out-of-band admin action would, without going
    /// through the API under test.
    pub fn set_flags(&self, id: Uuid, is_active: Option<bool>, is_admin: Option<bool>) {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|user| user.id == id)
            .expect("seeded user");
        if let Some(active) = is_active {
            user.is_active = active;
        }
        if let Some(admin) = is_admin {
            user.is_admin = admin;
        }
        user.updated_at = Utc::now();
    }
}

#[async_trait]
impl UserStore for MemUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|user| user.email == new_user.email) {
            return Err(ApiError::Conflict(format!(
                "user with email {} already exists",
                new_user.email
            )));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            provider_user_id: new_user.provider_user_id,
            email: new_user.email,
            display_name: new_user.display_name,
            is_active: new_user.is_active,
            is_admin: new_user.is_admin,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_provider_id(&self, provider_user_id: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.provider_user_id.as_deref() == Some(provider_user_id))
            .cloned())
    }

    async fn link_provider_id(&self, id: Uuid, provider_user_id: &str) -> Result<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
        user.provider_user_id = Some(provider_user_id.to_string());
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let mut users = self.users.lock().unwrap().clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|user| user.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.display_name {
            user.display_name = name;
        }
        if let Some(active) = patch.is_active {
            user.is_active = active;
        }
        if let Some(admin) = patch.is_admin {
            user.is_admin = admin;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|user| user.id != id);
        Ok(users.len() < before)
    }
}

#[derive(Default)]
pub struct MemStatusStore {
    statuses: Mutex<Vec<Status>>,
    next_id: AtomicUsize,
}

impl MemStatusStore {
    pub fn new() -> Self {
        MemStatusStore {
            statuses: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
        }
    }
}

#[async_trait]
impl StatusStore for MemStatusStore {
    async fn create(&self, new_status: NewStatus) -> Result<Status> {
        let now = Utc::now();
        let status = Status {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) as i64,
            title: new_status.title,
            description: new_status.description,
            state: new_status.state,
            owner_user_id: new_status.owner_user_id,
            created_at: now,
            updated_at: now,
        };
        self.statuses.lock().unwrap().push(status.clone());
        Ok(status)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Status>> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .iter()
            .find(|status| status.id == id)
            .cloned())
    }

    async fn list(&self, filter: StatusFilter, limit: i64, offset: i64) -> Result<Vec<Status>> {
        let mut statuses: Vec<Status> = self
            .statuses
            .lock()
            .unwrap()
            .iter()
            .filter(|status| filter.owner.map_or(true, |owner| status.owner_user_id == owner))
            .filter(|status| filter.state.map_or(true, |state| status.state == state))
            .cloned()
            .collect();
        statuses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(statuses
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn update(&self, id: i64, patch: StatusPatch) -> Result<Option<Status>> {
        let mut statuses = self.statuses.lock().unwrap();
        let Some(status) = statuses.iter_mut().find(|status| status.id == id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            status.title = title;
        }
        if let Some(description) = patch.description {
            status.description = Some(description);
        }
        if let Some(state) = patch.state {
            status.state = state;
        }
        status.updated_at = Utc::now();
        Ok(Some(status.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut statuses = self.statuses.lock().unwrap();
        let before = statuses.len();
        statuses.retain(|status| status.id != id);
        Ok(statuses.len() < before)
    }
}

/// Scriptable identity provider standing in for the external auth service.
#[derive(Default)]
pub struct MockProvider {
    credentials: Mutex<HashMap<String, (String, String)>>,
    pub revoke_calls: AtomicUsize,
    pub fail_revoke: AtomicBool,
    pub unavailable: AtomicBool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register credentials the mock will accept, returning the provider-side
    /// user id.
    pub fn accept(&self, email: &str, password: &str) -> String {
        let provider_id = format!("prov-{}", Uuid::new_v4());
        self.credentials.lock().unwrap().insert(
            email.to_string(),
            (password.to_string(), provider_id.clone()),
        );
        provider_id
    }

    pub fn revoke_count(&self) -> usize {
        self.revoke_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn signup(&self, email: &str, password: &str, _name: &str) -> Result<ProviderIdentity> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ApiError::ProviderUnavailable("connection refused".into()));
        }
        let mut credentials = self.credentials.lock().unwrap();
        if credentials.contains_key(email) {
            return Err(ApiError::ProviderRejected("User already registered".into()));
        }
        let provider_id = format!("prov-{}", Uuid::new_v4());
        credentials.insert(email.to_string(), (password.to_string(), provider_id.clone()));
        Ok(ProviderIdentity {
            id: provider_id,
            email: email.to_string(),
        })
    }

    async fn password_grant(&self, email: &str, password: &str) -> Result<ProviderSession> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ApiError::ProviderUnavailable("connection refused".into()));
        }
        let credentials = self.credentials.lock().unwrap();
        match credentials.get(email) {
            Some((expected, provider_id)) if expected == password => Ok(ProviderSession {
                identity: ProviderIdentity {
                    id: provider_id.clone(),
                    email: email.to_string(),
                },
                session_token: format!("ext-session-{}", Uuid::new_v4()),
            }),
            _ => Err(ApiError::InvalidCredentials),
        }
    }

    async fn revoke(&self, _session_token: &str) -> Result<()> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_revoke.load(Ordering::SeqCst) {
            return Err(ApiError::ProviderUnavailable("revoke failed".into()));
        }
        Ok(())
    }
}

/// Everything a test needs: the state handed to the app plus direct handles
/// for out-of-band manipulation.
pub struct TestContext {
    pub state: actix_web::web::Data<AppState>,
    pub users: Arc<MemUserStore>,
    pub statuses: Arc<MemStatusStore>,
    pub provider: Arc<MockProvider>,
    pub tokens: TokenService,
}

impl TestContext {
    pub fn new() -> Self {
        let users = Arc::new(MemUserStore::new());
        let statuses = Arc::new(MemStatusStore::new());
        let provider = Arc::new(MockProvider::new());
        let tokens = TokenService::new(
            &JwtConfig {
                secret: "integration-test-secret".to_string(),
                access_token_ttl: 900,
                refresh_token_ttl: 604800,
            },
            Arc::new(RevocationSet::new()),
        );

        let state = actix_web::web::Data::new(AppState::new(
            Arc::clone(&users) as Arc<dyn UserStore>,
            Arc::clone(&statuses) as Arc<dyn StatusStore>,
            Arc::clone(&provider) as Arc<dyn IdentityProvider>,
            tokens.clone(),
        ));

        TestContext {
            state,
            users,
            statuses,
            provider,
            tokens,
        }
    }

    /// Seed a directory record plus matching provider credentials, as if the
    /// user had signed up earlier.
    pub fn seed_user(&self, email: &str, password: &str, name: &str, is_admin: bool) -> User {
        let provider_id = self.provider.accept(email, password);
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            provider_user_id: Some(provider_id),
            email: email.to_string(),
            display_name: name.to_string(),
            is_active: true,
            is_admin,
            created_at: now,
            updated_at: now,
        };
        self.users.seed(user.clone());
        user
    }

    /// Mint a valid access token directly, skipping the login round-trip.
    pub fn access_token(&self, user: &User) -> String {
        self.tokens
            .issue_pair(user)
            .expect("token pair")
            .access_token
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the full application route tree around the context's state.
#[macro_export]
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.state.clone())
                .configure(status_service::routes::configure_routes),
        )
        .await
    };
}
