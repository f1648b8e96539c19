//! PostgreSQL implementation of SessionStore
//!
//! Every mutation is a targeted single-column UPDATE, so concurrent writers
//! touching different fields of the same session never overwrite each other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use tavola_core::entities::Session;
use tavola_core::error::DomainError;
use tavola_core::traits::{RepoResult, SessionStore};
use tavola_core::value_objects::{SessionId, UserId};

use crate::models::SessionModel;

use super::error::{map_db_error, map_unique_violation, session_not_found};

/// PostgreSQL implementation of SessionStore
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Create a new PgSessionStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    async fn insert(&self, session: &Session) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO sessions (id, user_id, tenant_id, fingerprint, created_at, last_activity_at, revoked, revoked_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(session.id.as_uuid())
        .bind(session.user_id.as_uuid())
        .bind(session.tenant_id.as_uuid())
        .bind(&session.fingerprint)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .bind(session.revoked)
        .bind(session.revoked_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::SessionAlreadyExists(session.id)))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: SessionId) -> RepoResult<Option<Session>> {
        let result = sqlx::query_as::<_, SessionModel>(
            r"
            SELECT id, user_id, tenant_id, fingerprint, created_at, last_activity_at, revoked, revoked_at
            FROM sessions
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Session::from))
    }

    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: UserId) -> RepoResult<Vec<Session>> {
        let result = sqlx::query_as::<_, SessionModel>(
            r"
            SELECT id, user_id, tenant_id, fingerprint, created_at, last_activity_at, revoked, revoked_at
            FROM sessions
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.into_iter().map(Session::from).collect())
    }

    #[instrument(skip(self))]
    async fn touch(&self, id: SessionId, at: DateTime<Utc>) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE sessions
            SET last_activity_at = GREATEST(last_activity_at, $2)
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(session_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke(&self, id: SessionId, at: DateTime<Utc>) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE sessions
            SET revoked = TRUE, revoked_at = $2
            WHERE id = $1 AND NOT revoked
            ",
        )
        .bind(id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        // Revoking an already-revoked session is a no-op, but the session
        // has to exist
        if result.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, bool>(
                r"SELECT EXISTS(SELECT 1 FROM sessions WHERE id = $1)",
            )
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

            if !exists {
                return Err(session_not_found(id));
            }
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke_all_for_user(
        &self,
        user_id: UserId,
        keep: Option<SessionId>,
        at: DateTime<Utc>,
    ) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE sessions
            SET revoked = TRUE, revoked_at = $3
            WHERE user_id = $1 AND NOT revoked AND ($2::uuid IS NULL OR id <> $2)
            ",
        )
        .bind(user_id.as_uuid())
        .bind(keep.map(|k| k.as_uuid()))
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn revoke_idle_since(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE sessions
            SET revoked = TRUE, revoked_at = NOW()
            WHERE NOT revoked AND last_activity_at < $1
            ",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgSessionStore>();
    }
}
