//! Request and response DTOs
//!
//! Requests carry `validator` rules and are checked at the extractor
//! boundary. Responses own their wire shape so entities never serialize
//! directly.

pub mod requests;
pub mod responses;

pub use requests::{
    AuditLogQuery, ChangeRoleRequest, LoginRequest, OtpRequest, OtpVerifyRequest, RefreshRequest,
    RegisterRequest, SecurityEventsQuery,
};

pub use responses::{
    AuditLogResponse, AuthResponse, HealthResponse, OtpRequestedResponse, OtpVerifiedResponse,
    PurgedResponse, ReadinessResponse, RevokedSessionsResponse, RoleChangedResponse,
    SessionResponse, TokenResponse, UserResponse,
};
