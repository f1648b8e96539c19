//! JWT utilities for authentication
//!
//! Provides token encoding, decoding, and validation using the `jsonwebtoken`
//! crate. Every token carries the full authorization identity (user, tenant,
//! role, session, family) plus a unique jti, so the guard pipeline never
//! needs a user lookup to authorize a request.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tavola_core::value_objects::{FamilyId, Role, SessionId, TenantId, UserId};
use uuid::Uuid;

use crate::error::AppError;

/// Token type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Tenant the token is scoped to
    pub tid: String,
    /// Role at issue time
    pub role: Role,
    /// Session the token belongs to
    pub sid: String,
    /// Refresh-token family
    pub fam: String,
    /// Unique token id
    pub jti: String,
    /// Issuer
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
    /// Device fingerprint digest captured at issue time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fp: Option<String>,
}

impl Claims {
    /// Get the subject as a typed user id
    ///
    /// # Errors
    /// Returns an error if the subject is not a UUID
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.sub.parse().map_err(|_| AppError::InvalidToken)
    }

    /// Get the tenant id
    ///
    /// # Errors
    /// Returns an error if the claim is not a UUID
    pub fn tenant_id(&self) -> Result<TenantId, AppError> {
        self.tid.parse().map_err(|_| AppError::InvalidToken)
    }

    /// Get the session id
    ///
    /// # Errors
    /// Returns an error if the claim is not a UUID
    pub fn session_id(&self) -> Result<SessionId, AppError> {
        self.sid.parse().map_err(|_| AppError::InvalidToken)
    }

    /// Get the token family id
    ///
    /// # Errors
    /// Returns an error if the claim is not a UUID
    pub fn family_id(&self) -> Result<FamilyId, AppError> {
        self.fam.parse().map_err(|_| AppError::InvalidToken)
    }

    /// Get the unique token id
    ///
    /// # Errors
    /// Returns an error if the claim is not a UUID
    pub fn token_id(&self) -> Result<Uuid, AppError> {
        self.jti.parse().map_err(|_| AppError::InvalidToken)
    }

    /// Check if the token is expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Check if this is an access token
    #[must_use]
    pub fn is_access_token(&self) -> bool {
        self.token_type == TokenType::Access
    }

    /// Check if this is a refresh token
    #[must_use]
    pub fn is_refresh_token(&self) -> bool {
        self.token_type == TokenType::Refresh
    }

    /// Seconds until expiry, saturating at zero.
    ///
    /// Used as the TTL when the jti goes into the revocation set.
    #[must_use]
    pub fn remaining_lifetime(&self) -> std::time::Duration {
        let secs = self.exp - Utc::now().timestamp();
        std::time::Duration::from_secs(secs.max(0) as u64)
    }
}

/// The identity a token pair is minted for
#[derive(Debug, Clone)]
pub struct TokenIdentity {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub role: Role,
    pub session_id: SessionId,
    pub family_id: FamilyId,
    pub fingerprint: Option<String>,
}

/// Token pair containing access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}

/// JWT service for encoding and decoding tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
    issuer: String,
}

impl JwtService {
    /// Create a new JWT service with the given secret, expiry times, and issuer
    #[must_use]
    pub fn new(
        secret: &str,
        access_token_expiry: i64,
        refresh_token_expiry: i64,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry,
            refresh_token_expiry,
            issuer: issuer.into(),
        }
    }

    /// Access token lifetime in seconds
    #[must_use]
    pub fn access_token_expiry(&self) -> i64 {
        self.access_token_expiry
    }

    /// Refresh token lifetime in seconds
    #[must_use]
    pub fn refresh_token_expiry(&self) -> i64 {
        self.refresh_token_expiry
    }

    /// Mint an access/refresh pair for `identity` with caller-chosen jtis.
    ///
    /// The caller owns the jtis because the refresh jti must be registered
    /// as the family's current one in the same operation.
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn issue_pair(
        &self,
        identity: &TokenIdentity,
        access_jti: Uuid,
        refresh_jti: Uuid,
    ) -> Result<TokenPair, AppError> {
        let access_token = self.encode_token(identity, TokenType::Access, access_jti)?;
        let refresh_token = self.encode_token(identity, TokenType::Refresh, refresh_jti)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            refresh_expires_in: self.refresh_token_expiry,
        })
    }

    /// Encode a JWT token
    fn encode_token(
        &self,
        identity: &TokenIdentity,
        token_type: TokenType,
        jti: Uuid,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let expiry = match token_type {
            TokenType::Access => self.access_token_expiry,
            TokenType::Refresh => self.refresh_token_expiry,
        };

        let claims = Claims {
            sub: identity.user_id.to_string(),
            tid: identity.tenant_id.to_string(),
            role: identity.role,
            sid: identity.session_id.to_string(),
            fam: identity.family_id.to_string(),
            jti: jti.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(expiry)).timestamp(),
            token_type,
            fp: identity.fingerprint.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to encode JWT")))
    }

    /// Decode and validate a JWT token
    ///
    /// # Errors
    /// Returns an error if the token is invalid, expired, or from the wrong issuer
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            }
        })?;

        Ok(token_data.claims)
    }

    /// Decode an access token, rejecting refresh tokens presented as access
    ///
    /// # Errors
    /// Returns an error if the token is invalid, expired, or not an access token
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;

        if !claims.is_access_token() {
            return Err(AppError::InvalidToken);
        }

        Ok(claims)
    }

    /// Decode a refresh token, rejecting access tokens presented as refresh
    ///
    /// # Errors
    /// Returns an error if the token is invalid, expired, or not a refresh token
    pub fn decode_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;

        if !claims.is_refresh_token() {
            return Err(AppError::InvalidToken);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}
