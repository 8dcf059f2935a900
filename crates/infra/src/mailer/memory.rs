//! Non-delivering senders: log-only (dev default) and recording (tests).

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::mailer::{MailError, MailSender, OutgoingMail, render};

/// Renders the mail and writes it to the log instead of delivering it.
#[derive(Debug, Default)]
pub struct LogMailSender;

#[async_trait::async_trait]
impl MailSender for LogMailSender {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let rendered = render(&mail.template, &mail.context)?;
        tracing::info!(to = %mail.to, template = %mail.template, "mail not delivered (log sender)");
        tracing::debug!(subject = %rendered.subject, body = %rendered.body, "mail body");
        Ok(())
    }
}

/// Collects every mail it is asked to send. Can be switched to fail.
#[derive(Debug, Default)]
pub struct RecordingMailSender {
    sent: Mutex<Vec<OutgoingMail>>,
    failing: AtomicBool,
}

impl RecordingMailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let sender = Self::default();
        sender.set_failing(true);
        sender
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl MailSender for RecordingMailSender {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        render(&mail.template, &mail.context)?;
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Transport("recording sender set to fail".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(mail);
        }
        Ok(())
    }
}
