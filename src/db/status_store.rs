/// Status record operations backed by Postgres.
use sqlx::PgPool;

use crate::error::Result;
use crate::models::{NewStatus, Status, StatusFilter, StatusPatch};

/// Storage seam for status records, mirroring [`crate::db::UserStore`].
#[async_trait::async_trait]
pub trait StatusStore: Send + Sync {
    /// Insert a new status owned by the given user
    async fn create(&self, new_status: NewStatus) -> Result<Status>;

    /// Find status by id
    async fn find_by_id(&self, id: i64) -> Result<Option<Status>>;

    /// List statuses newest-first, narrowed by the filter's owner and state
    async fn list(&self, filter: StatusFilter, limit: i64, offset: i64) -> Result<Vec<Status>>;

    /// Apply a partial update; `None` when no such status exists
    async fn update(&self, id: i64, patch: StatusPatch) -> Result<Option<Status>>;

    /// Hard delete; `false` when no such status exists
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[derive(Clone)]
pub struct PgStatusStore {
    pool: PgPool,
}

impl PgStatusStore {
    pub fn new(pool: PgPool) -> Self {
        PgStatusStore { pool }
    }
}

#[async_trait::async_trait]
impl StatusStore for PgStatusStore {
    async fn create(&self, new_status: NewStatus) -> Result<Status> {
        let status = sqlx::query_as::<_, Status>(
            r#"
            INSERT INTO statuses (title, description, state, owner_user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(&new_status.title)
        .bind(&new_status.description)
        .bind(new_status.state)
        .bind(new_status.owner_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(status)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Status>> {
        let status = sqlx::query_as::<_, Status>("SELECT * FROM statuses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(status)
    }

    async fn list(&self, filter: StatusFilter, limit: i64, offset: i64) -> Result<Vec<Status>> {
        let statuses = sqlx::query_as::<_, Status>(
            r#"
            SELECT *
            FROM statuses
            WHERE ($1::uuid IS NULL OR owner_user_id = $1)
              AND ($2::status_state IS NULL OR state = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.owner)
        .bind(filter.state)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(statuses)
    }

    async fn update(&self, id: i64, patch: StatusPatch) -> Result<Option<Status>> {
        let status = sqlx::query_as::<_, Status>(
            r#"
            UPDATE statuses
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                state = COALESCE($4, state),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.state)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM statuses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
