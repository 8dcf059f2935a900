//! Outbound mail boundary.
//!
//! Services build an [`OutgoingMail`] (recipient, sender, template name,
//! template context) and hand it to a [`MailSender`]. Rendering happens in
//! [`template`]; delivery is up to the implementation.

pub mod memory;
pub mod smtp;
pub mod template;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::{LogMailSender, RecordingMailSender};
pub use smtp::SmtpMailSender;
pub use template::{FORGOT_PASSWORD_TEMPLATE, RenderedMail, render};

/// A mail ready for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMail {
    pub to: String,
    pub from: String,
    pub template: String,
    pub context: serde_json::Value,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("unknown mail template: {0}")]
    UnknownTemplate(String),

    #[error("template {template} is missing context field `{field}`")]
    MissingContext { template: String, field: &'static str },

    #[error("invalid mail address: {0}")]
    Address(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// Dispatches rendered mail.
#[async_trait::async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}
