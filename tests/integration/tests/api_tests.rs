//! API integration tests
//!
//! Every test spawns a real server on the in-process storage backend and
//! drives it over HTTP. No external services are required.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use integration_tests::{assert_json, assert_status, fixtures::*, TestServer};
use reqwest::{Response, StatusCode};
use tavola_core::value_objects::{Role, TenantId};
use uuid::Uuid;

/// Register a fresh customer in a fresh tenant
async fn register(server: &TestServer) -> (RegisterRequest, AuthResponse) {
    let request = RegisterRequest::unique(Uuid::new_v4());
    let response = server
        .post("/api/v1/auth/register", &request)
        .await
        .unwrap();
    let auth: AuthResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    (request, auth)
}

/// Seed a user with `role` directly and log them in over HTTP
async fn seed_and_login(server: &TestServer, tenant: TenantId, role: Role) -> AuthResponse {
    let password = "seeded-password-1";
    let user = server.seed_user(tenant, role, password).await.unwrap();

    let login = LoginRequest {
        tenant_id: tenant.as_uuid(),
        phone: user.phone.clone(),
        password: password.to_string(),
    };
    let response = server.post("/api/v1/auth/login", &login).await.unwrap();
    assert_json(response, StatusCode::OK).await.unwrap()
}

fn header(response: &Response, name: &str) -> String {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_else(|| panic!("missing header {name}"))
        .to_string()
}

async fn error_body(response: Response) -> ErrorDetail {
    let body: ErrorResponse = response.json().await.unwrap();
    assert!(!body.success);
    body.error
}

// ============================================================================
// Health Checks
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/health").await.expect("Request failed");
    let health: HealthResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_health_ready_on_memory_backend() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/health/ready").await.expect("Request failed");
    let ready: ReadinessResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(ready.ready);
    assert!(ready.database);
    assert!(ready.cache);
}

// ============================================================================
// Registration and Login
// ============================================================================

#[tokio::test]
async fn test_register_user() {
    let server = TestServer::start().await.expect("Failed to start server");
    let request = RegisterRequest::unique(Uuid::new_v4());

    let response = server
        .post("/api/v1/auth/register", &request)
        .await
        .unwrap();
    let auth: AuthResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    assert_eq!(auth.user.phone, request.phone);
    assert_eq!(auth.user.tenant_id, request.tenant_id);
    assert_eq!(auth.user.role, "customer");
    assert_eq!(auth.token_type, "Bearer");
    assert!(!auth.access_token.is_empty());
    assert!(!auth.refresh_token.is_empty());
}

#[tokio::test]
async fn test_register_duplicate_phone() {
    let server = TestServer::start().await.expect("Failed to start server");
    let request = RegisterRequest::unique(Uuid::new_v4());

    server
        .post("/api/v1/auth/register", &request)
        .await
        .unwrap();

    let response = server
        .post("/api/v1/auth/register", &request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error = error_body(response).await;
    assert_eq!(error.code, "PHONE_ALREADY_EXISTS");
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut request = RegisterRequest::unique(Uuid::new_v4());
    request.password = "short".to_string();

    let response = server
        .post("/api/v1/auth/register", &request)
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

#[tokio::test]
async fn test_login_sets_rate_limit_headers() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (register_req, _) = register(&server).await;

    let login = LoginRequest::from_register(&register_req);
    let response = server.post("/api/v1/auth/login", &login).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "x-ratelimit-limit"), "5");
    assert_eq!(header(&response, "x-ratelimit-remaining"), "4");
    header(&response, "x-ratelimit-reset")
        .parse::<u64>()
        .expect("reset is a unix timestamp");

    let auth: AuthResponse = response.json().await.unwrap();
    assert_eq!(auth.user.phone, register_req.phone);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (register_req, _) = register(&server).await;

    let login = LoginRequest::wrong_password(&register_req);
    let response = server.post("/api/v1/auth/login", &login).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error = error_body(response).await;
    assert_eq!(error.code, "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_login_unknown_phone_looks_like_bad_password() {
    let server = TestServer::start().await.expect("Failed to start server");

    let login = LoginRequest {
        tenant_id: Uuid::new_v4(),
        phone: unique_phone(),
        password: "whatever-pass-1".to_string(),
    };
    let response = server.post("/api/v1/auth/login", &login).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error = error_body(response).await;
    assert_eq!(error.code, "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_login_rate_limit_exhaustion() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (register_req, _) = register(&server).await;
    let bad_login = LoginRequest::wrong_password(&register_req);

    // The quota counts attempts, not failures; five misses spend it
    for _ in 0..5 {
        let response = server.post("/api/v1/auth/login", &bad_login).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the correct password is refused now
    let good_login = LoginRequest::from_register(&register_req);
    let response = server
        .post("/api/v1/auth/login", &good_login)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let retry_after: u64 = header(&response, "retry-after").parse().unwrap();
    assert!(retry_after > 0);
    assert_eq!(header(&response, "x-ratelimit-limit"), "5");
    assert_eq!(header(&response, "x-ratelimit-remaining"), "0");

    let error = error_body(response).await;
    assert_eq!(error.code, "RATE_LIMITED");
    assert!(error.retry_after.is_some());
}

// ============================================================================
// Token Refresh and Reuse Detection
// ============================================================================

#[tokio::test]
async fn test_refresh_token_rotation() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register(&server).await;

    let refresh = RefreshRequest {
        refresh_token: auth.refresh_token.clone(),
    };
    let response = server.post("/api/v1/auth/refresh", &refresh).await.unwrap();
    let tokens: TokenResponse = assert_json(response, StatusCode::OK).await.unwrap();

    assert!(!tokens.access_token.is_empty());
    assert_ne!(tokens.refresh_token, auth.refresh_token);

    // The rotated pair works
    let response = server
        .get_auth("/api/v1/sessions", &tokens.access_token)
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_refresh_token_via_header() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register(&server).await;

    // Empty body; the token rides in the header
    let url = format!("{}/api/v1/auth/refresh", server.base_url());
    let response = server
        .client
        .post(&url)
        .header("x-refresh-token", &auth.refresh_token)
        .send()
        .await
        .unwrap();

    let tokens: TokenResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(!tokens.access_token.is_empty());
}

#[tokio::test]
async fn test_refresh_without_token() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .post("/api/v1/auth/refresh", &serde_json::json!({}))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error = error_body(response).await;
    assert_eq!(error.code, "MISSING_TOKEN");
}

/// The full theft scenario: login, rotate once, then replay the consumed
/// refresh token. The replay must cut off every session the account has.
#[tokio::test]
async fn test_refresh_replay_revokes_everything() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register(&server).await;

    // The session works before anything happens
    let response = server
        .get_auth("/api/v1/sessions", &auth.access_token)
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    // Legitimate rotation
    let refresh = RefreshRequest {
        refresh_token: auth.refresh_token.clone(),
    };
    let response = server.post("/api/v1/auth/refresh", &refresh).await.unwrap();
    let rotated: TokenResponse = assert_json(response, StatusCode::OK).await.unwrap();

    // Replaying the consumed token is treated as theft
    let response = server.post("/api/v1/auth/refresh", &refresh).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error = error_body(response).await;
    assert_eq!(error.code, "REUSE_DETECTED");

    // The freshly rotated pair is dead too
    let response = server
        .get_auth("/api/v1/sessions", &rotated.access_token)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let rotated_refresh = RefreshRequest {
        refresh_token: rotated.refresh_token,
    };
    let response = server
        .post("/api/v1/auth/refresh", &rotated_refresh)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error = error_body(response).await;
    assert_eq!(error.code, "TOKEN_REVOKED");
}

// ============================================================================
// Logout and Guard Status Codes
// ============================================================================

#[tokio::test]
async fn test_logout_kills_the_session() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register(&server).await;

    let response = server
        .post_auth("/api/v1/auth/logout", &auth.access_token, &())
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();

    let response = server
        .get_auth("/api/v1/sessions", &auth.access_token)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error = error_body(response).await;
    assert_eq!(error.code, "TOKEN_REVOKED");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/api/v1/sessions").await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error = error_body(response).await;
    assert_eq!(error.code, "MISSING_TOKEN");

    let response = server
        .get_auth("/api/v1/sessions", "not-a-real-token")
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error = error_body(response).await;
    assert_eq!(error.code, "INVALID_TOKEN");
}

#[tokio::test]
async fn test_role_guard_blocks_customer_from_audit() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register(&server).await;

    let response = server
        .get_auth("/api/v1/audit/logs", &auth.access_token)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let error = error_body(response).await;
    assert_eq!(error.code, "INSUFFICIENT_ROLE");
}

#[tokio::test]
async fn test_permission_guard_blocks_courier_from_ordering() {
    let server = TestServer::start().await.expect("Failed to start server");
    let auth = seed_and_login(&server, TenantId::generate(), Role::Courier).await;

    let response = server
        .post_auth(
            "/api/v1/orders",
            &auth.access_token,
            &PlaceOrderRequest::simple(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let error = error_body(response).await;
    assert_eq!(error.code, "INSUFFICIENT_PERMISSION");
}

#[tokio::test]
async fn test_customer_places_order() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register(&server).await;

    let response = server
        .post_auth(
            "/api/v1/orders",
            &auth.access_token,
            &PlaceOrderRequest::simple(),
        )
        .await
        .unwrap();
    let order: OrderPlacedResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    assert_eq!(order.status, "received");
    assert_eq!(order.placed_by, auth.user.id);
}

#[tokio::test]
async fn test_order_without_items_is_rejected() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register(&server).await;

    let empty = PlaceOrderRequest { items: Vec::new() };
    let response = server
        .post_auth("/api/v1/orders", &auth.access_token, &empty)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = error_body(response).await;
    assert_eq!(error.code, "VALIDATION_ERROR");
}

// ============================================================================
// Session Management
// ============================================================================

#[tokio::test]
async fn test_list_sessions_marks_current() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (register_req, _) = register(&server).await;

    let login = LoginRequest::from_register(&register_req);
    let response = server.post("/api/v1/auth/login", &login).await.unwrap();
    let second: AuthResponse = assert_json(response, StatusCode::OK).await.unwrap();

    let response = server
        .get_auth("/api/v1/sessions", &second.access_token)
        .await
        .unwrap();
    let sessions: Vec<SessionResponse> = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions.iter().filter(|s| s.current).count(), 1);
}

#[tokio::test]
async fn test_revoke_one_session() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (register_req, first) = register(&server).await;

    let login = LoginRequest::from_register(&register_req);
    let response = server.post("/api/v1/auth/login", &login).await.unwrap();
    let second: AuthResponse = assert_json(response, StatusCode::OK).await.unwrap();

    let response = server
        .get_auth("/api/v1/sessions", &second.access_token)
        .await
        .unwrap();
    let sessions: Vec<SessionResponse> = assert_json(response, StatusCode::OK).await.unwrap();
    let other = sessions.iter().find(|s| !s.current).expect("other session");

    let response = server
        .delete_auth(
            &format!("/api/v1/sessions/{}", other.id),
            &second.access_token,
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();

    // The revoked session's access token stops working
    let response = server
        .get_auth("/api/v1/sessions", &first.access_token)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revoke_unknown_session() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register(&server).await;

    let response = server
        .delete_auth(
            &format!("/api/v1/sessions/{}", Uuid::new_v4()),
            &auth.access_token,
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server
        .delete_auth("/api/v1/sessions/not-a-uuid", &auth.access_token)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = error_body(response).await;
    assert_eq!(error.code, "INVALID_PATH_PARAMETER");
}

#[tokio::test]
async fn test_revoke_other_sessions_keeps_current() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (register_req, _) = register(&server).await;

    let login = LoginRequest::from_register(&register_req);
    server.post("/api/v1/auth/login", &login).await.unwrap();
    let response = server.post("/api/v1/auth/login", &login).await.unwrap();
    let third: AuthResponse = assert_json(response, StatusCode::OK).await.unwrap();

    let response = server
        .delete_auth("/api/v1/sessions", &third.access_token)
        .await
        .unwrap();
    let revoked: RevokedSessionsResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(revoked.revoked, 2);

    let response = server
        .get_auth("/api/v1/sessions", &third.access_token)
        .await
        .unwrap();
    let sessions: Vec<SessionResponse> = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].current);
}

// ============================================================================
// Destructive Confirmation and Member Administration
// ============================================================================

#[tokio::test]
async fn test_role_change_requires_confirmation_header() {
    let server = TestServer::start().await.expect("Failed to start server");
    let tenant = TenantId::generate();
    let owner = seed_and_login(&server, tenant, Role::Owner).await;

    // A customer target registered over HTTP, same tenant
    let request = RegisterRequest::unique(tenant.as_uuid());
    let response = server
        .post("/api/v1/auth/register", &request)
        .await
        .unwrap();
    let target: AuthResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    let path = format!(
        "/api/v1/tenants/{}/members/{}/role",
        tenant.as_uuid(),
        target.user.id
    );
    let change = ChangeRoleRequest {
        role: "staff".to_string(),
    };

    // Without the header the change is refused and flagged as confirmable
    let response = server
        .put_auth(&path, &owner.access_token, &change)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = error_body(response).await;
    assert_eq!(error.code, "CONFIRMATION_REQUIRED");
    assert_eq!(error.requires_confirmation, Some(true));

    // With the header it goes through and revokes the target's session
    let response = server
        .put_auth_confirmed(&path, &owner.access_token, &change)
        .await
        .unwrap();
    let changed: RoleChangedResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(changed.user_id, target.user.id);
    assert_eq!(changed.role, "staff");
    assert_eq!(changed.revoked_sessions, 1);

    // The target's old token died with the session
    let response = server
        .get_auth("/api/v1/sessions", &target.access_token)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_manager_cannot_manage_customers() {
    let server = TestServer::start().await.expect("Failed to start server");
    let tenant = TenantId::generate();
    let manager = seed_and_login(&server, tenant, Role::Manager).await;

    let request = RegisterRequest::unique(tenant.as_uuid());
    let response = server
        .post("/api/v1/auth/register", &request)
        .await
        .unwrap();
    let target: AuthResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    let path = format!(
        "/api/v1/tenants/{}/members/{}/role",
        tenant.as_uuid(),
        target.user.id
    );
    let change = ChangeRoleRequest {
        role: "staff".to_string(),
    };
    let response = server
        .put_auth_confirmed(&path, &manager.access_token, &change)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let error = error_body(response).await;
    assert_eq!(error.code, "INSUFFICIENT_ROLE");
}

#[tokio::test]
async fn test_role_change_is_tenant_scoped() {
    let server = TestServer::start().await.expect("Failed to start server");
    let tenant = TenantId::generate();
    let owner = seed_and_login(&server, tenant, Role::Owner).await;

    let path = format!(
        "/api/v1/tenants/{}/members/{}/role",
        Uuid::new_v4(),
        Uuid::new_v4()
    );
    let change = ChangeRoleRequest {
        role: "staff".to_string(),
    };
    let response = server
        .put_auth_confirmed(&path, &owner.access_token, &change)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let error = error_body(response).await;
    assert_eq!(error.code, "TENANT_MISMATCH");
}

// ============================================================================
// Audit Trail
// ============================================================================

#[tokio::test]
async fn test_audit_log_query() {
    let server = TestServer::start().await.expect("Failed to start server");
    let tenant = TenantId::generate();
    let owner = seed_and_login(&server, tenant, Role::Owner).await;

    let response = server
        .get_auth("/api/v1/audit/logs", &owner.access_token)
        .await
        .unwrap();
    let entries: Vec<AuditLogResponse> = assert_json(response, StatusCode::OK).await.unwrap();

    // The owner's own login is on record
    assert!(entries.iter().any(|e| e.action == "auth.login"));
    assert!(entries
        .iter()
        .all(|e| e.tenant_id == Some(tenant.as_uuid())));

    // Substring filter on the action name
    let response = server
        .get_auth("/api/v1/audit/logs?action=login", &owner.access_token)
        .await
        .unwrap();
    let filtered: Vec<AuditLogResponse> = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(!filtered.is_empty());
    assert!(filtered.iter().all(|e| e.action.contains("login")));
}

#[tokio::test]
async fn test_security_events_for_manager() {
    let server = TestServer::start().await.expect("Failed to start server");
    let manager = seed_and_login(&server, TenantId::generate(), Role::Manager).await;

    let response = server
        .get_auth("/api/v1/audit/security-events", &manager.access_token)
        .await
        .unwrap();
    let _events: Vec<AuditLogResponse> = assert_json(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_audit_purge_is_owner_only() {
    let server = TestServer::start().await.expect("Failed to start server");
    let tenant = TenantId::generate();
    let manager = seed_and_login(&server, tenant, Role::Manager).await;

    // Confirmation or not, a manager never reaches the purge handler
    let response = server
        .delete_auth_confirmed("/api/v1/audit/retention", &manager.access_token)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let error = error_body(response).await;
    assert_eq!(error.code, "INSUFFICIENT_ROLE");

    let owner = seed_and_login(&server, tenant, Role::Owner).await;

    let response = server
        .delete_auth("/api/v1/audit/retention", &owner.access_token)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = error_body(response).await;
    assert_eq!(error.code, "CONFIRMATION_REQUIRED");

    let response = server
        .delete_auth_confirmed("/api/v1/audit/retention", &owner.access_token)
        .await
        .unwrap();
    let purged: PurgedResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(purged.purged, 0);
}

// ============================================================================
// One-Time Codes
// ============================================================================

#[tokio::test]
async fn test_otp_login_flow() {
    let (server, sender) = TestServer::start_with_otp_capture()
        .await
        .expect("Failed to start server");
    let (register_req, _) = register(&server).await;

    let request = OtpRequest {
        phone: register_req.phone.clone(),
        purpose: "login".to_string(),
    };
    let response = server
        .post("/api/v1/auth/otp/request", &request)
        .await
        .unwrap();
    let issued: OtpRequestedResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(issued.phone, register_req.phone);
    assert_eq!(issued.expires_in, 600);

    let code = sender
        .last_code_for(&register_req.phone)
        .expect("code was delivered");

    let verify = OtpVerifyRequest {
        tenant_id: register_req.tenant_id,
        phone: register_req.phone.clone(),
        purpose: "login".to_string(),
        code,
    };
    let response = server
        .post("/api/v1/auth/otp/verify", &verify)
        .await
        .unwrap();
    let auth: AuthResponse = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(auth.user.phone, register_req.phone);
    assert!(!auth.access_token.is_empty());

    // The code-backed session is a real one
    let response = server
        .get_auth("/api/v1/sessions", &auth.access_token)
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_otp_wrong_code_counts_down() {
    let (server, sender) = TestServer::start_with_otp_capture()
        .await
        .expect("Failed to start server");
    let (register_req, _) = register(&server).await;

    let request = OtpRequest {
        phone: register_req.phone.clone(),
        purpose: "login".to_string(),
    };
    server
        .post("/api/v1/auth/otp/request", &request)
        .await
        .unwrap();

    let code = sender
        .last_code_for(&register_req.phone)
        .expect("code was delivered");
    let wrong = if code.starts_with('9') {
        format!("0{}", &code[1..])
    } else {
        format!("9{}", &code[1..])
    };

    let verify = OtpVerifyRequest {
        tenant_id: register_req.tenant_id,
        phone: register_req.phone.clone(),
        purpose: "login".to_string(),
        code: wrong,
    };
    let response = server
        .post("/api/v1/auth/otp/verify", &verify)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = error_body(response).await;
    assert_eq!(error.code, "OTP_INVALID");
    assert_eq!(error.remaining_attempts, Some(2));
}

#[tokio::test]
async fn test_otp_verify_without_request() {
    let server = TestServer::start().await.expect("Failed to start server");

    let verify = OtpVerifyRequest {
        tenant_id: Uuid::new_v4(),
        phone: unique_phone(),
        purpose: "login".to_string(),
        code: "123456".to_string(),
    };
    let response = server
        .post("/api/v1/auth/otp/verify", &verify)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = error_body(response).await;
    assert_eq!(error.code, "OTP_EXPIRED");
}

#[tokio::test]
async fn test_otp_request_while_code_active() {
    let server = TestServer::start().await.expect("Failed to start server");
    let phone = unique_phone();

    let request = OtpRequest {
        phone: phone.clone(),
        purpose: "phone_verify".to_string(),
    };
    let response = server
        .post("/api/v1/auth/otp/request", &request)
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .post("/api/v1/auth/otp/request", &request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = header(&response, "retry-after").parse().unwrap();
    assert!(retry_after > 0);
    let error = error_body(response).await;
    assert_eq!(error.code, "OTP_ACTIVE");
}

#[tokio::test]
async fn test_otp_phone_verify_purpose_does_not_log_in() {
    let (server, sender) = TestServer::start_with_otp_capture()
        .await
        .expect("Failed to start server");
    let phone = unique_phone();

    let request = OtpRequest {
        phone: phone.clone(),
        purpose: "phone_verify".to_string(),
    };
    server
        .post("/api/v1/auth/otp/request", &request)
        .await
        .unwrap();
    let code = sender.last_code_for(&phone).expect("code was delivered");

    let verify = OtpVerifyRequest {
        tenant_id: Uuid::new_v4(),
        phone,
        purpose: "phone_verify".to_string(),
        code,
    };
    let response = server
        .post("/api/v1/auth/otp/verify", &verify)
        .await
        .unwrap();
    let verified: OtpVerifiedResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(verified.verified);
}
