//! Application services: the auth flows and project management.
//!
//! Services take their collaborators (stores, mail sender, token issuer) as
//! explicit trait objects and never reach for process-wide state. Every
//! failure is reported as a [`ServiceError`]; the HTTP layer decides how to
//! render it.

pub mod auth;
pub mod projects;

use thiserror::Error;

use taskboard_core::DomainError;

pub use auth::{
    AuthResponse, AuthService, AuthenticateRequest, ForgotPasswordRequest, RegisterRequest,
    ResetPasswordRequest,
};
pub use projects::ProjectService;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Duplicate email on registration.
    #[error("{0}")]
    Conflict(String),

    /// Missing user or project.
    #[error("{0}")]
    NotFound(String),

    /// Wrong password.
    #[error("{0}")]
    Unauthorized(String),

    /// Reset token missing or not matching.
    #[error("{0}")]
    InvalidToken(String),

    /// Reset token matched but its window has passed.
    #[error("{0}")]
    ExpiredToken(String),

    /// The mail sender reported a failure.
    #[error("{message}")]
    SendError { message: String, detail: String },

    /// Request input failed validation.
    #[error("{0}")]
    Validation(String),

    /// Any other persistence/runtime failure.
    #[error("{message}")]
    Unhandled { message: String, detail: String },
}

impl ServiceError {
    pub fn unhandled(message: impl Into<String>, err: impl core::fmt::Display) -> Self {
        Self::Unhandled {
            message: message.into(),
            detail: err.to_string(),
        }
    }

    /// Raw underlying error, where one exists.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::SendError { detail, .. } | Self::Unhandled { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
