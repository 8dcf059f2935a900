use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskboard_core::{DomainError, DomainResult, Entity, ProjectId, TaskId, UserId};

/// Task document. Always owned by exactly one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub project: ProjectId,
    pub assigned_to: Option<UserId>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Task as submitted inside a project create/update body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInput {
    pub title: String,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    #[serde(default)]
    pub completed: bool,
}

impl TaskInput {
    pub fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("task title must not be empty"));
        }
        Ok(())
    }
}

impl Task {
    pub fn from_input(input: &TaskInput, project: ProjectId, now: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::new(),
            title: input.title.trim().to_string(),
            project,
            assigned_to: input.assigned_to,
            completed: input.completed,
            created_at: now,
        }
    }
}

impl Entity for Task {
    type Id = TaskId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
