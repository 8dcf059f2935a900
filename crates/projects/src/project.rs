//! Project document and its populated view.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskboard_auth::UserView;
use taskboard_core::{DomainError, DomainResult, Entity, ProjectId, TaskId, UserId};

use crate::task::{Task, TaskInput};

/// Persisted project document.
///
/// # Invariants
/// - `user` (the owner) is set at creation and never changes.
/// - `tasks` lists task ids in submission order; every listed task
///   references this project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    pub user: UserId,
    pub tasks: Vec<TaskId>,
    pub created_at: DateTime<Utc>,
}

/// Body of a project create or update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tasks: Vec<TaskInput>,
}

impl ProjectInput {
    pub fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("title must not be empty"));
        }
        for (idx, task) in self.tasks.iter().enumerate() {
            task.validate()
                .map_err(|e| DomainError::validation(format!("tasks[{idx}]: {e}")))?;
        }
        Ok(())
    }
}

impl Project {
    pub fn new(owner: UserId, input: &ProjectInput, now: DateTime<Utc>) -> Self {
        Self {
            id: ProjectId::new(),
            title: input.title.trim().to_string(),
            description: input.description.clone(),
            user: owner,
            tasks: Vec::new(),
            created_at: now,
        }
    }

    /// Overwrite the editable fields. Owner and creation time are kept.
    pub fn apply_details(&mut self, input: &ProjectInput) {
        self.title = input.title.trim().to_string();
        self.description = input.description.clone();
    }
}

impl Entity for Project {
    type Id = ProjectId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Project with owner and tasks resolved inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectView {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    pub user: Option<UserView>,
    pub tasks: Vec<Task>,
    pub created_at: DateTime<Utc>,
}

impl ProjectView {
    /// Join a project with its resolved owner and tasks.
    ///
    /// Tasks come back in the project's own order; ids that did not resolve
    /// are dropped.
    pub fn assemble(project: Project, owner: Option<UserView>, tasks: Vec<Task>) -> Self {
        let mut by_id: HashMap<TaskId, Task> = tasks.into_iter().map(|t| (t.id, t)).collect();
        let tasks = project
            .tasks
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();

        Self {
            id: project.id,
            title: project.title,
            description: project.description,
            user: owner,
            tasks,
            created_at: project.created_at,
        }
    }
}
