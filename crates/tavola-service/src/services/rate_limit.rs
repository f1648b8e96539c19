//! Rate limiting service
//!
//! Fixed-window counters over the rate limit store. Each use case gets its
//! own key prefix and quota; the store guarantees the increment is atomic,
//! so concurrent callers over the limit are all denied.

use chrono::{DateTime, Utc};
use tavola_common::config::RateQuota;
use tavola_core::value_objects::{FamilyId, UserId};
use tracing::{debug, instrument, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Outcome of one rate limit check
#[derive(Debug, Clone, Copy)]
pub struct RateCheck {
    /// Whether the request is within quota
    pub allowed: bool,
    /// The quota's request ceiling
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the current window closes
    pub reset_at: DateTime<Utc>,
}

impl RateCheck {
    /// Seconds until the window resets, never zero.
    ///
    /// Used for `Retry-After`; a denied caller always waits at least a
    /// second.
    #[must_use]
    pub fn retry_after_secs(&self) -> u64 {
        let secs = (self.reset_at - Utc::now()).num_seconds();
        u64::try_from(secs.max(1)).unwrap_or(1)
    }
}

/// Rate limiting service
pub struct RateLimitService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RateLimitService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Count this request against `key` and report whether it fits the quota.
    ///
    /// The increment happens regardless of the outcome, so a denied caller
    /// keeps pushing its own reset further only in the sense of consuming
    /// nothing: the window deadline is pinned by the first request.
    #[instrument(skip(self, quota), fields(max = quota.max_requests))]
    pub async fn check(&self, key: &str, quota: RateQuota) -> ServiceResult<RateCheck> {
        let window = std::time::Duration::from_secs(quota.window_seconds);
        let count = self.ctx.rate_limits().increment(key, window).await?;

        let allowed = count.count <= u64::from(quota.max_requests);
        let remaining = u64::from(quota.max_requests).saturating_sub(count.count);

        if allowed {
            debug!(key, count = count.count, "Rate limit check passed");
        } else {
            warn!(key, count = count.count, max = quota.max_requests, "Rate limit exceeded");
        }

        Ok(RateCheck {
            allowed,
            limit: quota.max_requests,
            remaining: u32::try_from(remaining).unwrap_or(u32::MAX),
            reset_at: count.reset_at,
        })
    }
}

// Key builders. Every use case gets its own prefix so quotas never collide.

/// Login attempts, keyed by phone and source address
#[must_use]
pub fn login_key(phone: &str, ip: &str) -> String {
    format!("login:{phone}:{ip}")
}

/// OTP code requests, keyed by phone
#[must_use]
pub fn otp_request_key(phone: &str) -> String {
    format!("otp:request:{phone}")
}

/// OTP verification attempts, keyed by phone
#[must_use]
pub fn otp_verify_key(phone: &str) -> String {
    format!("otp:verify:{phone}")
}

/// Refresh rotations, keyed by token family
#[must_use]
pub fn refresh_key(family_id: FamilyId) -> String {
    format!("refresh:{family_id}")
}

/// Authenticated traffic, keyed by user
#[must_use]
pub fn user_key(user_id: UserId) -> String {
    format!("user:{user_id}")
}
