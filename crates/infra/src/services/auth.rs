//! Registration, login and the password-reset flow.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use taskboard_auth::{
    PasswordHasher, ResetToken, ResetTokenError, TokenIssuer, User, UserView, validate_email,
    validate_name, validate_password,
};

use crate::mailer::{FORGOT_PASSWORD_TEMPLATE, MailSender, OutgoingMail};
use crate::services::{ServiceError, ServiceResult};
use crate::store::{StoreError, UserStore};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticateRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub token: String,
    pub password: String,
}

/// Successful register/authenticate result: the user (without credentials)
/// plus a fresh session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserView,
    pub token: String,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    mailer: Arc<dyn MailSender>,
    tokens: Arc<dyn TokenIssuer>,
    hasher: PasswordHasher,
    mail_from: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        mailer: Arc<dyn MailSender>,
        tokens: Arc<dyn TokenIssuer>,
        hasher: PasswordHasher,
        mail_from: impl Into<String>,
    ) -> Self {
        Self {
            users,
            mailer,
            tokens,
            hasher,
            mail_from: mail_from.into(),
        }
    }

    #[instrument(skip_all)]
    pub async fn register(&self, req: RegisterRequest, now: DateTime<Utc>) -> ServiceResult<AuthResponse> {
        validate_name(&req.name)?;
        validate_email(&req.email)?;
        validate_password(&req.password)?;

        let existing = self
            .users
            .find_by_email(&req.email)
            .await
            .map_err(|e| ServiceError::unhandled("Registration failed", e))?;
        if existing.is_some() {
            return Err(ServiceError::Conflict("User already exists".to_string()));
        }

        let hash = self.hash_password(req.password).await?;
        let user = User::new(req.name.trim(), &req.email, hash, now);

        self.users.insert(&user).await.map_err(|e| match e {
            // Lost a race with a concurrent registration for the same email.
            StoreError::DuplicateEmail(_) => ServiceError::Conflict("User already exists".to_string()),
            other => ServiceError::unhandled("Registration failed", other),
        })?;

        tracing::info!(user_id = %user.id, "user registered");
        self.auth_response(&user, now)
    }

    #[instrument(skip_all)]
    pub async fn authenticate(&self, req: AuthenticateRequest, now: DateTime<Utc>) -> ServiceResult<AuthResponse> {
        let user = self.find_user(&req.email, "Authentication failed").await?;

        if !self.verify_password(req.password, user.password_hash.clone()).await? {
            tracing::info!(user_id = %user.id, "authentication rejected: bad password");
            return Err(ServiceError::Unauthorized("Invalid password".to_string()));
        }

        self.auth_response(&user, now)
    }

    /// Issue a reset token, store it on the user, and mail it.
    ///
    /// The token stays stored even if the mail cannot be sent.
    #[instrument(skip_all)]
    pub async fn forgot_password(&self, req: ForgotPasswordRequest, now: DateTime<Utc>) -> ServiceResult<()> {
        const FAILED: &str = "Error on forgot password. Please try again.";

        let mut user = self.find_user(&req.email, FAILED).await?;

        let reset = ResetToken::generate(now);
        user.set_reset_token(&reset);
        self.users
            .save(&user)
            .await
            .map_err(|e| ServiceError::unhandled(FAILED, e))?;

        let mail = OutgoingMail {
            to: user.email.clone(),
            from: self.mail_from.clone(),
            template: FORGOT_PASSWORD_TEMPLATE.to_string(),
            context: serde_json::json!({ "token": reset.token }),
        };
        self.mailer.send(mail).await.map_err(|e| {
            tracing::warn!(user_id = %user.id, error = %e, "reset mail dispatch failed");
            ServiceError::SendError {
                message: "Cannot send forgot password e-mail.".to_string(),
                detail: e.to_string(),
            }
        })?;

        tracing::info!(user_id = %user.id, "password reset token issued");
        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn reset_password(&self, req: ResetPasswordRequest, now: DateTime<Utc>) -> ServiceResult<()> {
        const FAILED: &str = "Error on reset password. Please try again later.";

        let mut user = self.find_user(&req.email, FAILED).await?;

        user.check_reset_token(&req.token, now).map_err(|e| match e {
            ResetTokenError::Invalid => ServiceError::InvalidToken(e.to_string()),
            ResetTokenError::Expired => ServiceError::ExpiredToken(e.to_string()),
        })?;

        validate_password(&req.password)?;

        user.password_hash = self.hash_password(req.password).await?;
        user.clear_reset_token();
        self.users
            .save(&user)
            .await
            .map_err(|e| ServiceError::unhandled(FAILED, e))?;

        tracing::info!(user_id = %user.id, "password reset");
        Ok(())
    }

    async fn find_user(&self, email: &str, context: &str) -> ServiceResult<User> {
        self.users
            .find_by_email(email)
            .await
            .map_err(|e| ServiceError::unhandled(context, e))?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    fn auth_response(&self, user: &User, now: DateTime<Utc>) -> ServiceResult<AuthResponse> {
        let token = self
            .tokens
            .issue(user.id, now)
            .map_err(|e| ServiceError::unhandled("Token issuance failed", e))?;
        Ok(AuthResponse {
            user: user.view(),
            token,
        })
    }

    // bcrypt is CPU-bound; run it on the blocking pool.
    async fn hash_password(&self, plain: String) -> ServiceResult<String> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| ServiceError::unhandled("Password hashing failed", e))?
            .map_err(|e| ServiceError::unhandled("Password hashing failed", e))
    }

    async fn verify_password(&self, plain: String, hash: String) -> ServiceResult<bool> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
            .await
            .map_err(|e| ServiceError::unhandled("Password check failed", e))?
            .map_err(|e| ServiceError::unhandled("Password check failed", e))
    }
}
