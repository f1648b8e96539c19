//! In-process fixed-window rate limit counters

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tavola_core::traits::{RateLimitStore, RepoResult, WindowCount};

use crate::window::WindowSlot;

/// Rate limit counters backed by a concurrent map.
///
/// Each key owns one fixed window. The increment mutates the slot while the
/// entry is locked, so the count can never understate concurrent traffic.
pub struct MemoryRateLimitStore {
    windows: DashMap<String, WindowSlot>,
}

impl MemoryRateLimitStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Drop windows that have already reset
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let before = self.windows.len();
        self.windows.retain(|_, slot| slot.reset_at > now);
        before - self.windows.len()
    }
}

impl Default for MemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryRateLimitStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRateLimitStore")
            .field("windows", &self.windows.len())
            .finish()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn increment(&self, key: &str, window: Duration) -> RepoResult<WindowCount> {
        let now = Utc::now();
        let mut slot = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| WindowSlot::open(now, window));

        let count = slot.bump(now, window);
        Ok(WindowCount {
            count,
            reset_at: slot.reset_at,
        })
    }
}
