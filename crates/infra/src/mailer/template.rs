use crate::mailer::MailError;

/// Template used by the forgot-password flow. Context: `{ "token": string }`.
pub const FORGOT_PASSWORD_TEMPLATE: &str = "auth/forgot_password";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub subject: String,
    pub body: String,
}

/// Render a named template with its JSON context.
pub fn render(template: &str, context: &serde_json::Value) -> Result<RenderedMail, MailError> {
    match template {
        FORGOT_PASSWORD_TEMPLATE => {
            let token = context
                .get("token")
                .and_then(|v| v.as_str())
                .ok_or_else(|| MailError::MissingContext {
                    template: template.to_string(),
                    field: "token",
                })?;
            Ok(RenderedMail {
                subject: "Password reset".to_string(),
                body: format!(
                    "You asked to reset your password.\n\n\
                     Use this token to choose a new one: {token}\n\n\
                     The token expires in one hour. If you did not ask for a reset, ignore this e-mail.\n"
                ),
            })
        }
        other => Err(MailError::UnknownTemplate(other.to_string())),
    }
}
