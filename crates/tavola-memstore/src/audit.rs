//! In-process audit log
//!
//! Append-only vector behind a read-write lock. Queries scan; the memory
//! backend is for development and tests, where logs stay small.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tavola_core::entities::AuditLogEntry;
use tavola_core::traits::{AuditLogStore, AuditQuery, RepoResult};

/// Audit log store backed by an in-process vector
pub struct MemoryAuditLogStore {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl MemoryAuditLogStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for MemoryAuditLogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryAuditLogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAuditLogStore")
            .field("entries", &self.len())
            .finish()
    }
}

fn matches(entry: &AuditLogEntry, query: &AuditQuery) -> bool {
    if let Some(tenant_id) = query.tenant_id {
        if entry.tenant_id != Some(tenant_id) {
            return false;
        }
    }
    if let Some(user_id) = query.user_id {
        if entry.user_id != Some(user_id) {
            return false;
        }
    }
    if let Some(fragment) = &query.action_contains {
        if !entry.action.contains(fragment.as_str()) {
            return false;
        }
    }
    if let Some(min) = query.min_severity {
        if entry.severity < min {
            return false;
        }
    }
    if let Some(from) = query.from {
        if entry.created_at < from {
            return false;
        }
    }
    if let Some(to) = query.to {
        if entry.created_at > to {
            return false;
        }
    }
    true
}

#[async_trait]
impl AuditLogStore for MemoryAuditLogStore {
    async fn append(&self, entry: &AuditLogEntry) -> RepoResult<()> {
        self.entries.write().push(entry.clone());
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> RepoResult<Vec<AuditLogEntry>> {
        let entries = self.entries.read();
        let mut hits: Vec<AuditLogEntry> = entries
            .iter()
            .filter(|e| matches(e, query))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(hits
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.created_at >= cutoff);
        Ok((before - entries.len()) as u64)
    }
}
