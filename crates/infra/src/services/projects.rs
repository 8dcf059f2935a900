//! Project/task management.
//!
//! Writes span several documents (project + N tasks) and are not atomic:
//! - `create` cleans up after itself if a task write fails (tasks written
//!   so far and the project are deleted).
//! - `update` deletes the old tasks before writing the new ones; a failure
//!   in between leaves the project with only the tasks written so far. If
//!   the project disappears before the final save, the new tasks are removed.
//! - `delete` removes the project only; its tasks stay in the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use taskboard_core::{ProjectId, UserId};
use taskboard_projects::{Project, ProjectInput, ProjectView, Task};

use crate::services::{ServiceError, ServiceResult};
use crate::store::{ProjectStore, StoreError, UserStore};

fn project_not_found() -> ServiceError {
    ServiceError::NotFound("Project not found".to_string())
}

pub struct ProjectService {
    projects: Arc<dyn ProjectStore>,
    users: Arc<dyn UserStore>,
}

impl ProjectService {
    pub fn new(projects: Arc<dyn ProjectStore>, users: Arc<dyn UserStore>) -> Self {
        Self { projects, users }
    }

    /// All projects with owner and tasks resolved.
    pub async fn list(&self) -> ServiceResult<Vec<ProjectView>> {
        const FAILED: &str = "Error loading projects.";

        let projects = self
            .projects
            .list_projects()
            .await
            .map_err(|e| ServiceError::unhandled(FAILED, e))?;

        let mut views = Vec::with_capacity(projects.len());
        for project in projects {
            views.push(self.populate(project, FAILED).await?);
        }
        Ok(views)
    }

    pub async fn get(&self, id: ProjectId) -> ServiceResult<ProjectView> {
        const FAILED: &str = "Error loading project.";

        let project = self
            .projects
            .find_project(id)
            .await
            .map_err(|e| ServiceError::unhandled(FAILED, e))?
            .ok_or_else(project_not_found)?;
        self.populate(project, FAILED).await
    }

    #[instrument(skip(self, input, now), fields(owner = %owner))]
    pub async fn create(&self, owner: UserId, input: ProjectInput, now: DateTime<Utc>) -> ServiceResult<ProjectView> {
        const FAILED: &str = "Error on Create Project.";

        input.validate()?;

        let mut project = Project::new(owner, &input, now);
        self.projects
            .insert_project(&project)
            .await
            .map_err(|e| ServiceError::unhandled(FAILED, e))?;

        let tasks = match self.write_tasks(&mut project, &input, now).await {
            Ok(tasks) => tasks,
            Err(e) => {
                self.discard(project.id).await;
                return Err(ServiceError::unhandled(FAILED, e));
            }
        };

        if let Err(e) = self.projects.save_project(&project).await {
            self.discard(project.id).await;
            return Err(ServiceError::unhandled(FAILED, e));
        }

        tracing::info!(project_id = %project.id, tasks = tasks.len(), "project created");
        self.view_with(project, tasks, FAILED).await
    }

    /// Replace title, description and the whole task list.
    #[instrument(skip(self, input, now), fields(project_id = %id))]
    pub async fn update(&self, id: ProjectId, input: ProjectInput, now: DateTime<Utc>) -> ServiceResult<ProjectView> {
        const FAILED: &str = "Error on Updating Project.";

        input.validate()?;

        let mut project = self
            .projects
            .find_project(id)
            .await
            .map_err(|e| ServiceError::unhandled(FAILED, e))?
            .ok_or_else(project_not_found)?;

        project.apply_details(&input);
        project.tasks.clear();

        let removed = self
            .projects
            .delete_tasks_for_project(id)
            .await
            .map_err(|e| ServiceError::unhandled(FAILED, e))?;

        let written = self.write_tasks(&mut project, &input, now).await;

        // Persist whatever task list we ended up with so the project never
        // points at deleted tasks.
        let saved = self.projects.save_project(&project).await;

        let tasks = match (written, saved) {
            (Ok(tasks), Ok(())) => tasks,
            (Err(e), _) => {
                tracing::warn!(
                    project_id = %id,
                    written = project.tasks.len(),
                    requested = input.tasks.len(),
                    "project update left a partial task list"
                );
                return Err(ServiceError::unhandled(FAILED, e));
            }
            (Ok(_), Err(StoreError::Missing(_))) => {
                // Deleted concurrently; drop the tasks written for it.
                if let Err(e) = self.projects.delete_tasks_for_project(id).await {
                    tracing::warn!(project_id = %id, error = %e, "cleanup: failed to delete tasks");
                }
                return Err(project_not_found());
            }
            (Ok(_), Err(e)) => return Err(ServiceError::unhandled(FAILED, e)),
        };

        tracing::info!(project_id = %id, removed, tasks = tasks.len(), "project updated");
        self.view_with(project, tasks, FAILED).await
    }

    /// Remove the project document. Its tasks are not deleted.
    #[instrument(skip(self), fields(project_id = %id))]
    pub async fn delete(&self, id: ProjectId) -> ServiceResult<()> {
        let existed = self
            .projects
            .delete_project(id)
            .await
            .map_err(|e| ServiceError::unhandled("Error deleting project.", e))?;
        if !existed {
            return Err(project_not_found());
        }
        tracing::info!(project_id = %id, "project deleted");
        Ok(())
    }

    /// Write one task per input entry, in order, appending ids to `project`.
    async fn write_tasks(
        &self,
        project: &mut Project,
        input: &ProjectInput,
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>, StoreError> {
        let mut tasks = Vec::with_capacity(input.tasks.len());
        for task_input in &input.tasks {
            let task = Task::from_input(task_input, project.id, now);
            self.projects.insert_task(&task).await?;
            project.tasks.push(task.id);
            tasks.push(task);
        }
        Ok(tasks)
    }

    /// Best-effort removal of a half-created project.
    async fn discard(&self, id: ProjectId) {
        if let Err(e) = self.projects.delete_tasks_for_project(id).await {
            tracing::warn!(project_id = %id, error = %e, "cleanup: failed to delete tasks");
        }
        if let Err(e) = self.projects.delete_project(id).await {
            tracing::warn!(project_id = %id, error = %e, "cleanup: failed to delete project");
        }
    }

    async fn populate(&self, project: Project, context: &str) -> ServiceResult<ProjectView> {
        let tasks = self
            .projects
            .tasks_for_project(project.id)
            .await
            .map_err(|e| ServiceError::unhandled(context, e))?;
        self.view_with(project, tasks, context).await
    }

    async fn view_with(&self, project: Project, tasks: Vec<Task>, context: &str) -> ServiceResult<ProjectView> {
        let owner = self
            .users
            .find_by_id(project.user)
            .await
            .map_err(|e| ServiceError::unhandled(context, e))?
            .map(|u| u.view());
        Ok(ProjectView::assemble(project, owner, tasks))
    }
}
