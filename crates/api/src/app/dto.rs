use serde::{Deserialize, Serialize};

use taskboard_projects::ProjectView;

pub use taskboard_infra::services::{
    AuthResponse, AuthenticateRequest, ForgotPasswordRequest, RegisterRequest, ResetPasswordRequest,
};
pub use taskboard_projects::ProjectInput;

/// Create/update responses wrap the populated project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEnvelope {
    pub project: ProjectView,
}
