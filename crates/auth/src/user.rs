//! User document (credential record).
//!
//! The stored document carries the password hash and the reset-token pair;
//! anything sent back to a client goes through [`UserView`], which has
//! neither.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskboard_core::{DomainError, DomainResult, Entity, UserId};

use crate::reset::{ResetToken, ResetTokenError, check_reset_token};

/// Minimum accepted password length (characters).
pub const MIN_PASSWORD_LEN: usize = 6;

/// Persisted user document.
///
/// # Invariants
/// - `email` is normalized (trimmed, lower-cased) and unique across users.
/// - `password_hash` is a one-way hash; the plaintext is never stored.
/// - The reset token and its expiry are either both set or both cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub password_reset_token: Option<String>,
    #[serde(default)]
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Client-facing projection of a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: &str,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: normalize_email(email),
            password_hash,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: now,
        }
    }

    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }

    pub fn set_reset_token(&mut self, reset: &ResetToken) {
        self.password_reset_token = Some(reset.token.clone());
        self.password_reset_expires = Some(reset.expires_at);
    }

    pub fn clear_reset_token(&mut self) {
        self.password_reset_token = None;
        self.password_reset_expires = None;
    }

    pub fn check_reset_token(&self, supplied: &str, now: DateTime<Utc>) -> Result<(), ResetTokenError> {
        check_reset_token(
            self.password_reset_token.as_deref(),
            self.password_reset_expires,
            supplied,
            now,
        )
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> DomainResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DomainError::validation("email must be a valid address")),
    }
}

pub fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new("Alice", "  Alice@Example.COM ", "$2b$04$hash".to_string(), Utc::now())
    }

    #[test]
    fn email_is_normalized_on_create() {
        assert_eq!(user().email, "alice@example.com");
    }

    #[test]
    fn view_never_carries_credentials() {
        let mut u = user();
        u.set_reset_token(&ResetToken::generate(Utc::now()));

        let json = serde_json::to_value(u.view()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("password_hash"));
        assert!(!obj.contains_key("password_reset_token"));
        assert!(!obj.contains_key("password_reset_expires"));
        assert_eq!(obj["email"], "alice@example.com");
    }

    #[test]
    fn reset_pair_is_set_and_cleared_together() {
        let mut u = user();
        let reset = ResetToken::generate(Utc::now());
        u.set_reset_token(&reset);
        assert_eq!(u.password_reset_token.as_deref(), Some(reset.token.as_str()));
        assert_eq!(u.password_reset_expires, Some(reset.expires_at));

        u.clear_reset_token();
        assert!(u.password_reset_token.is_none());
        assert!(u.password_reset_expires.is_none());
    }

    #[test]
    fn cleared_token_cannot_be_reused() {
        let now = Utc::now();
        let mut u = user();
        let reset = ResetToken::generate(now);
        u.set_reset_token(&reset);
        assert!(u.check_reset_token(&reset.token, now).is_ok());

        u.clear_reset_token();
        assert_eq!(
            u.check_reset_token(&reset.token, now),
            Err(ResetTokenError::Invalid)
        );
    }

    #[test]
    fn input_validation() {
        assert!(validate_email("a@b.c").is_ok());
        assert!(validate_email("invalid-email").is_err());
        assert!(validate_email("@b.c").is_err());
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_name("  ").is_err());
    }
}
