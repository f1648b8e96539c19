//! PostgreSQL implementation of AuditLogStore

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use tavola_core::entities::{AuditLogEntry, Severity};
use tavola_core::traits::{AuditLogStore, AuditQuery, RepoResult};

use crate::models::AuditLogModel;

use super::error::map_db_error;

/// PostgreSQL implementation of AuditLogStore
#[derive(Clone)]
pub struct PgAuditLogStore {
    pool: PgPool,
}

impl PgAuditLogStore {
    /// Create a new PgAuditLogStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Severities at or above `min`, as their stored string forms
fn severities_from(min: Severity) -> Vec<String> {
    Severity::ALL
        .iter()
        .filter(|s| **s >= min)
        .map(ToString::to_string)
        .collect()
}

#[async_trait]
impl AuditLogStore for PgAuditLogStore {
    #[instrument(skip(self, entry), fields(action = %entry.action, severity = %entry.severity))]
    async fn append(&self, entry: &AuditLogEntry) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO audit_log (id, tenant_id, user_id, action, severity, details, ip, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(entry.id)
        .bind(entry.tenant_id.map(|t| t.as_uuid()))
        .bind(entry.user_id.map(|u| u.as_uuid()))
        .bind(&entry.action)
        .bind(entry.severity.as_str())
        .bind(&entry.details)
        .bind(&entry.ip)
        .bind(&entry.user_agent)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, query))]
    async fn query(&self, query: &AuditQuery) -> RepoResult<Vec<AuditLogEntry>> {
        let severities = query.min_severity.map(severities_from);

        let rows = sqlx::query_as::<_, AuditLogModel>(
            r"
            SELECT id, tenant_id, user_id, action, severity, details, ip, user_agent, created_at
            FROM audit_log
            WHERE ($1::uuid IS NULL OR tenant_id = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
              AND ($3::text IS NULL OR position($3 IN action) > 0)
              AND ($4::text[] IS NULL OR severity = ANY($4))
              AND ($5::timestamptz IS NULL OR created_at >= $5)
              AND ($6::timestamptz IS NULL OR created_at <= $6)
            ORDER BY created_at DESC
            LIMIT $7 OFFSET $8
            ",
        )
        .bind(query.tenant_id.map(|t| t.as_uuid()))
        .bind(query.user_id.map(|u| u.as_uuid()))
        .bind(query.action_contains.as_deref())
        .bind(severities)
        .bind(query.from)
        .bind(query.to)
        .bind(i64::from(query.limit))
        .bind(i64::from(query.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(AuditLogEntry::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM audit_log WHERE created_at < $1
            ",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
