//! PostgreSQL implementation of TokenFamilyStore
//!
//! The rotation is a single conditional UPDATE keyed on the expected jti.
//! Row-level locking inside PostgreSQL guarantees exactly one winner under
//! concurrent refreshes of the same token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use tavola_core::entities::TokenFamily;
use tavola_core::error::DomainError;
use tavola_core::traits::{RepoResult, RotationOutcome, TokenFamilyStore};
use tavola_core::value_objects::{FamilyId, SessionId, UserId};

use crate::models::TokenFamilyModel;

use super::error::{family_not_found, map_db_error, map_unique_violation};

/// PostgreSQL implementation of TokenFamilyStore
#[derive(Clone)]
pub struct PgTokenFamilyStore {
    pool: PgPool,
}

impl PgTokenFamilyStore {
    /// Create a new PgTokenFamilyStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: FamilyId) -> RepoResult<Option<TokenFamilyModel>> {
        sqlx::query_as::<_, TokenFamilyModel>(
            r"
            SELECT id, user_id, session_id, tenant_id, current_jti, fingerprint, created_at, rotated_at, revoked
            FROM token_families
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }
}

#[async_trait]
impl TokenFamilyStore for PgTokenFamilyStore {
    #[instrument(skip(self, family), fields(family_id = %family.id))]
    async fn insert(&self, family: &TokenFamily) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO token_families (id, user_id, session_id, tenant_id, current_jti, fingerprint, created_at, rotated_at, revoked)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(family.id.as_uuid())
        .bind(family.user_id.as_uuid())
        .bind(family.session_id.as_uuid())
        .bind(family.tenant_id.as_uuid())
        .bind(family.current_jti)
        .bind(&family.fingerprint)
        .bind(family.created_at)
        .bind(family.rotated_at)
        .bind(family.revoked)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::FamilyAlreadyExists(family.id)))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: FamilyId) -> RepoResult<Option<TokenFamily>> {
        Ok(self.fetch(id).await?.map(TokenFamily::from))
    }

    #[instrument(skip(self, expected, next))]
    async fn rotate_jti(
        &self,
        id: FamilyId,
        expected: Uuid,
        next: Uuid,
        at: DateTime<Utc>,
    ) -> RepoResult<RotationOutcome> {
        let result = sqlx::query(
            r"
            UPDATE token_families
            SET current_jti = $3, rotated_at = $4
            WHERE id = $1 AND current_jti = $2 AND NOT revoked
            ",
        )
        .bind(id.as_uuid())
        .bind(expected)
        .bind(next)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 1 {
            return Ok(RotationOutcome::Rotated);
        }

        // The swap missed; read the row to tell why
        let family = self.fetch(id).await?.ok_or_else(|| family_not_found(id))?;
        if family.revoked {
            Ok(RotationOutcome::FamilyRevoked)
        } else {
            Ok(RotationOutcome::Mismatch {
                actual: family.current_jti,
            })
        }
    }

    #[instrument(skip(self))]
    async fn revoke(&self, id: FamilyId) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE token_families SET revoked = TRUE WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(family_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke_all_for_user(&self, user_id: UserId) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE token_families SET revoked = TRUE WHERE user_id = $1 AND NOT revoked
            ",
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn revoke_for_session(&self, session_id: SessionId) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE token_families SET revoked = TRUE WHERE session_id = $1 AND NOT revoked
            ",
        )
        .bind(session_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
