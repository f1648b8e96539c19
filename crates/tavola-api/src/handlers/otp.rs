//! One-time code handlers
//!
//! Requesting a code and verifying it. Both endpoints are rate limited
//! per phone on top of the OTP service's own generation and attempt
//! caps; a verified login-purpose code completes a full login.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use tavola_core::entities::OtpPurpose;
use tavola_core::normalize_phone;
use tavola_core::value_objects::TenantId;
use tavola_service::dto::{OtpRequest, OtpVerifiedResponse, OtpVerifyRequest};
use tavola_service::services::rate_limit::{otp_request_key, otp_verify_key};
use tavola_service::{AccountService, OtpService, RateLimitService};

use crate::extractors::{ClientOrigin, ValidatedJson};
use crate::middleware::guard;
use crate::response::{ApiError, ApiResult, Limited};
use crate::state::AppState;

/// Request a one-time code
///
/// POST /auth/otp/request
pub async fn request_code(
    State(state): State<AppState>,
    client: ClientOrigin,
    ValidatedJson(request): ValidatedJson<OtpRequest>,
) -> ApiResult<Response> {
    let ctx = state.service_context();
    let phone = normalize_phone(&request.phone)?;

    let check = RateLimitService::new(ctx)
        .check(&otp_request_key(&phone), ctx.rate_quotas().otp_request)
        .await?;
    if !check.allowed {
        guard::audit_rate_limited(ctx, &client.origin, "otp_request", None, None).await;
        return Err(ApiError::RateLimited(check));
    }

    let response = OtpService::new(ctx).generate(&phone, request.purpose).await?;
    Ok(Limited(check, Json(response)).into_response())
}

/// Verify a one-time code.
///
/// A login-purpose code signs the caller in and returns a token pair;
/// any other purpose just confirms the code was right.
///
/// POST /auth/otp/verify
pub async fn verify_code(
    State(state): State<AppState>,
    client: ClientOrigin,
    ValidatedJson(request): ValidatedJson<OtpVerifyRequest>,
) -> ApiResult<Response> {
    let ctx = state.service_context();
    let phone = normalize_phone(&request.phone)?;

    let check = RateLimitService::new(ctx)
        .check(&otp_verify_key(&phone), ctx.rate_quotas().otp_verify)
        .await?;
    if !check.allowed {
        guard::audit_rate_limited(ctx, &client.origin, "otp_verify", None, None).await;
        return Err(ApiError::RateLimited(check));
    }

    let verified_phone = OtpService::new(ctx)
        .verify(&phone, request.purpose, &request.code)
        .await?;

    if request.purpose == OtpPurpose::Login {
        let response = AccountService::new(ctx)
            .login_with_otp(
                TenantId::from(request.tenant_id),
                &verified_phone,
                client.fingerprint,
                &client.origin,
            )
            .await?;
        return Ok(Limited(check, Json(response)).into_response());
    }

    Ok(Limited(check, Json(OtpVerifiedResponse { verified: true })).into_response())
}
