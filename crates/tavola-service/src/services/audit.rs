//! Audit logging service
//!
//! Writes security events to the append-only audit log and serves the
//! read side (paged queries, the security event feed, retention purges).
//!
//! Writes are fire-and-forget: an unavailable audit store must never fail
//! the operation being audited, so failures are logged and swallowed.

use chrono::Utc;
use serde_json::Value;
use tavola_core::entities::{AuditLogEntry, Severity};
use tavola_core::traits::AuditQuery;
use tavola_core::value_objects::TenantId;
use tracing::{error, info, instrument, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Where a request came from, for audit attribution
#[derive(Debug, Clone, Default)]
pub struct RequestOrigin {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

const REDACTED: &str = "[REDACTED]";

/// Field name fragments whose values never reach the audit log
const SENSITIVE_MARKERS: [&str; 5] = ["password", "token", "secret", "key", "hash"];

fn is_sensitive(field: &str) -> bool {
    let lower = field.to_lowercase();
    SENSITIVE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Replace sensitive values in `details`, recursing through objects and
/// arrays. Matching is on field names, not values.
fn redact_in_place(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (field, entry) in map.iter_mut() {
                if is_sensitive(field) {
                    *entry = Value::String(REDACTED.to_string());
                } else {
                    redact_in_place(entry);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact_in_place(item);
            }
        }
        _ => {}
    }
}

/// Audit logging service
pub struct AuditService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuditService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Record one event.
    ///
    /// Details are redacted before the write. Store failures are swallowed
    /// after a log line; critical events additionally go to the error log
    /// so they surface even if the audit store is down.
    pub async fn log(&self, mut entry: AuditLogEntry) {
        redact_in_place(&mut entry.details);

        if entry.severity == Severity::Critical {
            error!(
                action = %entry.action,
                tenant_id = ?entry.tenant_id,
                user_id = ?entry.user_id,
                "Critical security event"
            );
        }

        if let Err(e) = self.ctx.audit_log().append(&entry).await {
            warn!(action = %entry.action, error = %e, "Failed to persist audit entry");
        }
    }

    /// Page through the log, newest first.
    ///
    /// The page size is clamped to the configured maximum; a zero or
    /// missing limit means one full page.
    #[instrument(skip(self, query))]
    pub async fn query(&self, mut query: AuditQuery) -> ServiceResult<Vec<AuditLogEntry>> {
        let cap = self.ctx.audit_config().max_page_size;
        query.limit = if query.limit == 0 {
            cap
        } else {
            query.limit.min(cap)
        };

        Ok(self.ctx.audit_log().query(&query).await?)
    }

    /// High and critical events for a tenant over the trailing `hours`
    #[instrument(skip(self))]
    pub async fn security_events(
        &self,
        tenant_id: TenantId,
        hours: u32,
    ) -> ServiceResult<Vec<AuditLogEntry>> {
        let query = AuditQuery {
            tenant_id: Some(tenant_id),
            min_severity: Some(Severity::High),
            from: Some(Utc::now() - chrono::Duration::hours(i64::from(hours))),
            limit: self.ctx.audit_config().max_page_size,
            ..AuditQuery::default()
        };

        Ok(self.ctx.audit_log().query(&query).await?)
    }

    /// Delete entries older than the configured retention.
    /// Returns how many were removed.
    #[instrument(skip(self))]
    pub async fn purge_expired(&self) -> ServiceResult<u64> {
        let cutoff =
            Utc::now() - chrono::Duration::days(i64::from(self.ctx.audit_config().retention_days));
        let purged = self.ctx.audit_log().purge_older_than(cutoff).await?;

        if purged > 0 {
            info!(purged, "Purged audit entries past retention");
        }
        Ok(purged)
    }
}
