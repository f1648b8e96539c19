//! One-time code service
//!
//! Issues and verifies short-lived 6-digit codes for login, phone
//! verification, and password reset. Codes are stored as sha-256 hashes
//! and are single use. Abuse controls: one live code per phone+purpose,
//! a rolling generation cap, and a 24-hour block after too many wrong
//! attempts.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use tavola_common::AppError;
use tavola_core::entities::{AuditLogEntry, OtpPurpose, OtpRecord, Severity};
use tavola_core::{normalize_phone, DomainError};
use tracing::{debug, info, instrument, warn};

use super::audit::AuditService;
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use crate::dto::OtpRequestedResponse;

/// Delivery boundary for one-time codes.
///
/// The real transport (SMS gateway) lives behind this trait; the service
/// only decides when a code goes out.
#[async_trait]
pub trait OtpSender: Send + Sync {
    /// Deliver `code` to `phone`
    async fn send(&self, phone: &str, code: &str) -> anyhow::Result<()>;
}

/// Development sender that writes codes to the log instead of sending them
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingOtpSender;

#[async_trait]
impl OtpSender for LoggingOtpSender {
    async fn send(&self, phone: &str, code: &str) -> anyhow::Result<()> {
        info!(phone, code, "OTP code issued (logging sender)");
        Ok(())
    }
}

fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:06}")
}

fn seconds_until(deadline: DateTime<Utc>) -> u64 {
    let secs = (deadline - Utc::now()).num_seconds();
    u64::try_from(secs.max(1)).unwrap_or(1)
}

/// One-time code service
pub struct OtpService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> OtpService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Issue a code for `phone` and hand it to the delivery channel.
    ///
    /// The generation counter is bumped before anything else happens, so
    /// a failed delivery still counts against the hourly cap.
    #[instrument(skip(self, phone))]
    pub async fn generate(
        &self,
        phone: &str,
        purpose: OtpPurpose,
    ) -> ServiceResult<OtpRequestedResponse> {
        let phone = normalize_phone(phone)?;
        let now = Utc::now();

        self.ensure_not_blocked(&phone, now).await?;

        if let Some(existing) = self.ctx.otp_codes().find(&phone, purpose).await? {
            if !existing.is_expired(now) {
                return Err(ServiceError::App(AppError::OtpActive {
                    retry_after_secs: seconds_until(existing.expires_at),
                }));
            }
        }

        let generated = self
            .ctx
            .otp_codes()
            .record_generation(&phone, std::time::Duration::from_secs(3600))
            .await?;
        if generated > u64::from(self.ctx.otp_config().max_per_hour) {
            return Err(self.block_phone(&phone, "generation cap exceeded").await?);
        }

        let code = generate_code();
        let ttl = self.ctx.otp_config().code_ttl_seconds;
        let record = OtpRecord::new(
            phone.clone(),
            purpose,
            hash_code(&code),
            now + Duration::seconds(i64::try_from(ttl).unwrap_or(600)),
        );
        self.ctx.otp_codes().put(&record).await?;

        self.ctx
            .otp_sender()
            .send(&phone, &code)
            .await
            .map_err(|e| ServiceError::internal(format!("OTP delivery failed: {e}")))?;

        debug!(purpose = purpose.as_str(), "OTP code generated");
        AuditService::new(self.ctx)
            .log(
                AuditLogEntry::new("otp.requested", Severity::Low)
                    .with_details(serde_json::json!({ "purpose": purpose.as_str() })),
            )
            .await;

        Ok(OtpRequestedResponse {
            phone,
            expires_in: ttl,
        })
    }

    /// Check `code` against the stored hash.
    ///
    /// Returns the normalized phone on success so callers can complete a
    /// login without re-normalizing. The record is deleted on success;
    /// codes are single use.
    #[instrument(skip(self, phone, code))]
    pub async fn verify(
        &self,
        phone: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> ServiceResult<String> {
        let phone = normalize_phone(phone)?;
        let now = Utc::now();

        self.ensure_not_blocked(&phone, now).await?;

        let Some(record) = self.ctx.otp_codes().find(&phone, purpose).await? else {
            return Err(ServiceError::App(AppError::OtpExpired));
        };
        if record.is_expired(now) {
            self.ctx.otp_codes().delete(&phone, purpose).await?;
            return Err(ServiceError::App(AppError::OtpExpired));
        }

        if record.code_hash != hash_code(code) {
            // The record can expire between find and increment; report that
            // the same way as a missing code
            let attempts = self
                .ctx
                .otp_codes()
                .increment_attempts(&phone, purpose)
                .await
                .map_err(|e| match e {
                    DomainError::OtpNotFound => ServiceError::App(AppError::OtpExpired),
                    other => ServiceError::Domain(other),
                })?;
            let max = self.ctx.otp_config().max_verify_attempts;

            if attempts >= max {
                self.ctx.otp_codes().delete(&phone, purpose).await?;
                return Err(self.block_phone(&phone, "verification attempts exhausted").await?);
            }
            return Err(ServiceError::App(AppError::OtpInvalid {
                remaining_attempts: max - attempts,
            }));
        }

        self.ctx.otp_codes().delete(&phone, purpose).await?;

        AuditService::new(self.ctx)
            .log(
                AuditLogEntry::new("otp.verified", Severity::Low)
                    .with_details(serde_json::json!({ "purpose": purpose.as_str() })),
            )
            .await;

        Ok(phone)
    }

    async fn ensure_not_blocked(&self, phone: &str, now: DateTime<Utc>) -> ServiceResult<()> {
        if let Some(until) = self.ctx.otp_codes().blocked_until(phone).await? {
            if until > now {
                return Err(ServiceError::App(AppError::OtpBlocked {
                    retry_after_secs: seconds_until(until),
                }));
            }
        }
        Ok(())
    }

    /// Block the phone and produce the error the caller reports
    async fn block_phone(&self, phone: &str, reason: &str) -> ServiceResult<ServiceError> {
        let hours = self.ctx.otp_config().block_hours;
        let until = Utc::now() + Duration::hours(i64::try_from(hours).unwrap_or(24));
        self.ctx.otp_codes().block(phone, until).await?;

        warn!(reason, "Phone blocked for OTP");
        AuditService::new(self.ctx)
            .log(
                AuditLogEntry::new("otp.blocked", Severity::High)
                    .with_details(serde_json::json!({ "reason": reason })),
            )
            .await;

        Ok(ServiceError::App(AppError::OtpBlocked {
            retry_after_secs: seconds_until(until),
        }))
    }
}
