//! Password reset tokens: opaque, random, single-use, valid for one hour.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Random bytes per reset token (hex-encoded to 40 characters).
pub const RESET_TOKEN_BYTES: usize = 20;

/// Validity window of a freshly issued reset token.
pub fn reset_token_ttl() -> Duration {
    Duration::hours(1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    pub fn generate(now: DateTime<Utc>) -> Self {
        let mut bytes = [0u8; RESET_TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self {
            token: hex::encode(bytes),
            expires_at: now + reset_token_ttl(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResetTokenError {
    #[error("Token invalid")]
    Invalid,

    #[error("Token expired, generate a new one.")]
    Expired,
}

/// Check a supplied reset token against the stored pair.
///
/// Token mismatch is reported before expiry, so a wrong token is `Invalid`
/// regardless of the clock.
pub fn check_reset_token(
    stored_token: Option<&str>,
    stored_expires: Option<DateTime<Utc>>,
    supplied: &str,
    now: DateTime<Utc>,
) -> Result<(), ResetTokenError> {
    let stored = stored_token.ok_or(ResetTokenError::Invalid)?;
    if !bool::from(stored.as_bytes().ct_eq(supplied.as_bytes())) {
        return Err(ResetTokenError::Invalid);
    }
    match stored_expires {
        Some(expires) if now < expires => Ok(()),
        _ => Err(ResetTokenError::Expired),
    }
}
