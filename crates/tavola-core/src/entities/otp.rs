//! OTP entities - one-time codes keyed by normalized phone and purpose

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a one-time code is for.
///
/// Codes for different purposes never collide: a login code cannot verify
/// a phone-change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Login,
    Registration,
    PhoneVerify,
}

impl OtpPurpose {
    /// Stable string form, used in store keys
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Login => "login",
            OtpPurpose::Registration => "registration",
            OtpPurpose::PhoneVerify => "phone_verify",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(OtpPurpose::Login),
            "registration" => Ok(OtpPurpose::Registration),
            "phone_verify" => Ok(OtpPurpose::PhoneVerify),
            other => Err(format!("unknown otp purpose: {other}")),
        }
    }
}

/// A stored one-time code.
///
/// Only the sha-256 digest of the code is kept; the plaintext exists just
/// long enough to hand to the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    /// Normalized phone number
    pub phone: String,
    pub purpose: OtpPurpose,
    /// Hex sha-256 digest of the 6-digit code
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    /// Wrong verification attempts so far
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Create a record expiring at `expires_at`
    pub fn new(
        phone: String,
        purpose: OtpPurpose,
        code_hash: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            phone,
            purpose,
            code_hash,
            expires_at,
            attempts: 0,
            created_at: Utc::now(),
        }
    }

    /// Whether the code has expired as of `now`
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
