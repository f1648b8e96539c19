//! # tavola-service
//!
//! Application layer: authentication, authorization, rate limiting, OTP,
//! audit logging, and background maintenance, plus the request/response
//! DTOs. Services borrow a shared [`services::ServiceContext`] and stay
//! stateless themselves.

pub mod dto;
pub mod services;

pub use services::{
    AccountService, AuditService, AuthContext, IssuedTokens, LoggingOtpSender, OtpSender,
    OtpService, RateCheck, RateLimitService, RbacService, RequestOrigin, ResourceRef,
    ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult, SweepReport, Sweeper,
    TokenService,
};
