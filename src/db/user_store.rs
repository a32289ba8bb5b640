/// User directory operations backed by Postgres.
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::{NewUser, User, UserPatch};

/// Storage seam for the user directory. The Postgres implementation is the
/// production one; tests substitute an in-memory store.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new directory record. Fails with `Conflict` when the email or
    /// provider id is already taken.
    async fn create(&self, new_user: NewUser) -> Result<User>;

    /// Find user by local id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Find user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Find user by the identity provider's own id
    async fn find_by_provider_id(&self, provider_user_id: &str) -> Result<Option<User>>;

    /// Attach a provider id to an existing record, returning the updated row
    async fn link_provider_id(&self, id: Uuid, provider_user_id: &str) -> Result<User>;

    /// List users newest-first with pagination
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>>;

    /// Apply a partial update; `None` when no such user exists
    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>>;

    /// Hard delete; `false` when no such user exists
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        PgUserStore { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, provider_user_id, email, display_name, is_active, is_admin, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.provider_user_id)
        .bind(&new_user.email)
        .bind(&new_user.display_name)
        .bind(new_user.is_active)
        .bind(new_user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                ApiError::Conflict(format!("user with email {} already exists", new_user.email))
            }
            other => ApiError::from(other),
        })?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_provider_id(&self, provider_user_id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE provider_user_id = $1")
            .bind(provider_user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn link_provider_id(&self, id: Uuid, provider_user_id: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET provider_user_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(provider_user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;

        Ok(user)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT *
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                display_name = COALESCE($2, display_name),
                is_active = COALESCE($3, is_active),
                is_admin = COALESCE($4, is_admin),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.display_name)
        .bind(patch.is_active)
        .bind(patch.is_admin)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
