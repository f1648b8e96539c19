//! Audit log entity <-> model mapper

use tavola_core::entities::{AuditLogEntry, Severity};
use tavola_core::error::DomainError;
use tavola_core::value_objects::{TenantId, UserId};

use crate::models::AuditLogModel;

impl TryFrom<AuditLogModel> for AuditLogEntry {
    type Error = DomainError;

    fn try_from(model: AuditLogModel) -> Result<Self, Self::Error> {
        let severity: Severity = model.severity.parse().map_err(|_| {
            DomainError::DatabaseError(format!("invalid severity value: {}", model.severity))
        })?;

        Ok(AuditLogEntry {
            id: model.id,
            tenant_id: model.tenant_id.map(TenantId::from),
            user_id: model.user_id.map(UserId::from),
            action: model.action,
            severity,
            details: model.details,
            ip: model.ip,
            user_agent: model.user_agent,
            created_at: model.created_at,
        })
    }
}
