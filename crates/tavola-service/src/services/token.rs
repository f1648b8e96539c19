//! Token service
//!
//! Issues access/refresh pairs, validates access tokens against the
//! revocation set and session state, and rotates refresh tokens with
//! family-based reuse detection.
//!
//! Every refresh token belongs to a family that remembers the jti it
//! most recently issued. Rotation swaps that jti atomically; a presented
//! token that loses the swap was already used once, which is treated as
//! theft and cuts off everything the account had open.

use chrono::Utc;
use tavola_common::{AppError, Claims, TokenIdentity, TokenPair};
use tavola_core::entities::{AuditLogEntry, Session, Severity, TokenFamily, User};
use tavola_core::traits::RotationOutcome;
use tavola_core::value_objects::{FamilyId, SessionId, UserId};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::audit::AuditService;
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// A freshly minted pair and the family that will track its refresh side
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub tokens: TokenPair,
    pub family_id: FamilyId,
    pub session_id: SessionId,
}

/// Token service
pub struct TokenService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> TokenService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Mint a pair for a fresh login, opening a new token family.
    ///
    /// The family records the refresh jti before the pair leaves this
    /// function, so a rotation can never race the issue.
    #[instrument(skip(self, user, session), fields(user_id = %user.id, session_id = %session.id))]
    pub async fn issue(&self, user: &User, session: &Session) -> ServiceResult<IssuedTokens> {
        let access_jti = Uuid::new_v4();
        let refresh_jti = Uuid::new_v4();

        let family = TokenFamily::new(
            user.id,
            session.id,
            user.tenant_id,
            refresh_jti,
            session.fingerprint.clone(),
        );
        self.ctx.families().insert(&family).await?;

        let identity = TokenIdentity {
            user_id: user.id,
            tenant_id: user.tenant_id,
            role: user.role,
            session_id: session.id,
            family_id: family.id,
            fingerprint: session.fingerprint.clone(),
        };
        let tokens = self.ctx.jwt().issue_pair(&identity, access_jti, refresh_jti)?;

        info!(family_id = %family.id, "Token pair issued");
        Ok(IssuedTokens {
            tokens,
            family_id: family.id,
            session_id: session.id,
        })
    }

    /// Validate an access token end to end.
    ///
    /// Checks signature, expiry, and type tag, then the jti against the
    /// revocation set, then the owning session's revoked flag. Revocation
    /// wins over validity.
    #[instrument(skip_all)]
    pub async fn validate_access(&self, token: &str) -> ServiceResult<Claims> {
        let claims = self.ctx.jwt().decode_access_token(token)?;

        let jti = claims.token_id()?;
        if self.ctx.revocations().is_revoked(jti).await? {
            return Err(ServiceError::App(AppError::TokenRevoked));
        }

        let session = self
            .ctx
            .sessions()
            .find_by_id(claims.session_id()?)
            .await?
            .ok_or(ServiceError::App(AppError::TokenRevoked))?;
        if !session.is_live() {
            return Err(ServiceError::App(AppError::TokenRevoked));
        }

        Ok(claims)
    }

    /// Rotate a refresh token.
    ///
    /// The compare-and-swap on the family's current jti linearizes
    /// concurrent rotations of the same token: exactly one caller wins,
    /// every other one lands on the reuse path.
    #[instrument(skip_all)]
    pub async fn rotate(
        &self,
        refresh_token: &str,
        fingerprint: Option<&str>,
    ) -> ServiceResult<IssuedTokens> {
        let claims = self.ctx.jwt().decode_refresh_token(refresh_token)?;
        let presented_jti = claims.token_id()?;
        let family_id = claims.family_id()?;
        let user_id = claims.user_id()?;

        let family = self
            .ctx
            .families()
            .find_by_id(family_id)
            .await?
            .ok_or(ServiceError::App(AppError::InvalidToken))?;
        if family.revoked {
            return Err(ServiceError::App(AppError::TokenRevoked));
        }

        // A changed fingerprint is recorded, not enforced; legitimate
        // clients lose their signals too often for it to revoke anything
        if family.fingerprint.is_some() && family.fingerprint.as_deref() != fingerprint {
            warn!(family_id = %family_id, "Fingerprint changed between rotations");
            AuditService::new(self.ctx)
                .log(
                    AuditLogEntry::new("token.fingerprint_mismatch", Severity::High)
                        .with_tenant(family.tenant_id)
                        .with_user(user_id)
                        .with_details(serde_json::json!({
                            "family_id": family_id.to_string(),
                            "session_id": family.session_id.to_string(),
                        })),
                )
                .await;
        }

        let next_jti = Uuid::new_v4();
        let outcome = self
            .ctx
            .families()
            .rotate_jti(family_id, presented_jti, next_jti, Utc::now())
            .await?;

        match outcome {
            RotationOutcome::Rotated => {}
            RotationOutcome::Mismatch { .. } => {
                self.reuse_cascade(presented_jti, &claims, &family).await?;
                return Err(ServiceError::App(AppError::ReuseDetected));
            }
            RotationOutcome::FamilyRevoked => {
                return Err(ServiceError::App(AppError::TokenRevoked));
            }
        }

        // The consumed jti must never rotate again
        self.ctx
            .revocations()
            .revoke(presented_jti, claims.remaining_lifetime())
            .await?;

        // Re-read the user so a role change takes effect at rotation
        let user = self
            .ctx
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::App(AppError::InvalidToken))?;

        let identity = TokenIdentity {
            user_id,
            tenant_id: family.tenant_id,
            role: user.role,
            session_id: family.session_id,
            family_id,
            fingerprint: family.fingerprint.clone(),
        };
        let tokens = self
            .ctx
            .jwt()
            .issue_pair(&identity, Uuid::new_v4(), next_jti)?;

        AuditService::new(self.ctx)
            .log(
                AuditLogEntry::new("token.rotated", Severity::Low)
                    .with_tenant(family.tenant_id)
                    .with_user(user_id)
                    .with_details(serde_json::json!({
                        "family_id": family_id.to_string(),
                    })),
            )
            .await;

        Ok(IssuedTokens {
            tokens,
            family_id,
            session_id: family.session_id,
        })
    }

    /// A presented jti that lost the swap was already consumed once.
    /// Everything the account had open is cut off: every family, every
    /// session, and the presented token itself.
    async fn reuse_cascade(
        &self,
        presented_jti: Uuid,
        claims: &Claims,
        family: &TokenFamily,
    ) -> ServiceResult<()> {
        let user_id = family.user_id;
        let now = Utc::now();

        let families = self.ctx.families().revoke_all_for_user(user_id).await?;
        let sessions = self
            .ctx
            .sessions()
            .revoke_all_for_user(user_id, None, now)
            .await?;
        self.ctx
            .revocations()
            .revoke(presented_jti, claims.remaining_lifetime())
            .await?;

        warn!(
            user_id = %user_id,
            family_id = %family.id,
            revoked_sessions = sessions,
            revoked_families = families,
            "Refresh token reuse detected"
        );

        AuditService::new(self.ctx)
            .log(
                AuditLogEntry::new("token.reuse_detected", Severity::Critical)
                    .with_tenant(family.tenant_id)
                    .with_user(user_id)
                    .with_details(serde_json::json!({
                        "family_id": family.id.to_string(),
                        "revoked_sessions": sessions,
                        "revoked_families": families,
                    })),
            )
            .await;

        Ok(())
    }

    /// Revoke one session and every token family bound to it
    #[instrument(skip(self))]
    pub async fn revoke_session(&self, session_id: SessionId) -> ServiceResult<()> {
        self.ctx.sessions().revoke(session_id, Utc::now()).await?;
        self.ctx.families().revoke_for_session(session_id).await?;
        Ok(())
    }

    /// Revoke a user's sessions, keeping `keep` when given.
    /// Returns how many sessions were revoked.
    #[instrument(skip(self))]
    pub async fn revoke_all_sessions(
        &self,
        user_id: UserId,
        keep: Option<SessionId>,
    ) -> ServiceResult<u64> {
        let revoked = self
            .ctx
            .sessions()
            .revoke_all_for_user(user_id, keep, Utc::now())
            .await?;

        match keep {
            None => {
                self.ctx.families().revoke_all_for_user(user_id).await?;
            }
            Some(kept) => {
                for session in self.ctx.sessions().find_by_user(user_id).await? {
                    if session.id != kept {
                        self.ctx.families().revoke_for_session(session.id).await?;
                    }
                }
            }
        }

        Ok(revoked)
    }
}
