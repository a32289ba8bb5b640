use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle state of a status record. Stored as the `status_state` Postgres
/// enum; serialized in snake_case on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "status_state", rename_all = "snake_case")]
pub enum StatusState {
    Open,
    InProgress,
    Closed,
}

impl Default for StatusState {
    fn default() -> Self {
        StatusState::Open
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Status {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub state: StatusState,
    pub owner_user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStatus {
    pub title: String,
    pub description: Option<String>,
    pub state: StatusState,
    pub owner_user_id: Uuid,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct StatusPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub state: Option<StatusState>,
}

/// List scoping. `owner` is set for non-admin callers so they only ever see
/// their own records.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusFilter {
    pub owner: Option<Uuid>,
    pub state: Option<StatusState>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub state: StatusState,
    pub owner_user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Status> for StatusResponse {
    fn from(status: Status) -> Self {
        StatusResponse {
            id: status.id,
            title: status.title,
            description: status.description,
            state: status.state,
            owner_user_id: status.owner_user_id,
            created_at: status.created_at,
            updated_at: status.updated_at,
        }
    }
}
