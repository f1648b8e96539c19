//! Fixed-window counter slot shared by the rate-limit and OTP stores

use chrono::{DateTime, Duration as ChronoDuration, Utc};

/// One fixed counting window.
///
/// Mutation happens while the owning map entry is locked, which is what
/// makes the bump atomic.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WindowSlot {
    pub count: u64,
    pub reset_at: DateTime<Utc>,
}

impl WindowSlot {
    /// An empty window expiring `window` from `now`
    pub(crate) fn open(now: DateTime<Utc>, window: std::time::Duration) -> Self {
        Self {
            count: 0,
            reset_at: now + to_chrono(window),
        }
    }

    /// Count one event, rolling the window over first if it has expired.
    /// Returns the new count.
    pub(crate) fn bump(&mut self, now: DateTime<Utc>, window: std::time::Duration) -> u64 {
        if now >= self.reset_at {
            self.count = 0;
            self.reset_at = now + to_chrono(window);
        }
        self.count += 1;
        self.count
    }
}

fn to_chrono(window: std::time::Duration) -> ChronoDuration {
    ChronoDuration::from_std(window).unwrap_or(ChronoDuration::MAX)
}
