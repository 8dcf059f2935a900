//! Document persistence boundary.
//!
//! Two stores: credentials (`UserStore`) and projects/tasks
//! (`ProjectStore`). Both are injected as explicit instances; there is no
//! process-wide connection handle. Joins are explicit typed fetches
//! (`find_by_id`, `tasks_for_project`), not reference-name population.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use thiserror::Error;

use taskboard_auth::User;
use taskboard_core::{ProjectId, UserId};
use taskboard_projects::{Project, Task};

pub use in_memory::InMemoryDocumentStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresDocumentStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another user already holds this (normalized) email.
    #[error("duplicate email: {0}")]
    DuplicateEmail(String),

    /// A save targeted a document that no longer exists.
    #[error("document not found: {0}")]
    Missing(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Credential store: user documents keyed by id, unique by email.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with `DuplicateEmail` if the email is taken.
    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Lookup by email (normalized before comparison).
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Replace an existing user document.
    async fn save(&self, user: &User) -> Result<(), StoreError>;
}

/// Project store: project documents plus the tasks that reference them.
#[async_trait::async_trait]
pub trait ProjectStore: Send + Sync {
    async fn insert_project(&self, project: &Project) -> Result<(), StoreError>;

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError>;

    /// All projects, oldest first.
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;

    /// Replace an existing project document.
    async fn save_project(&self, project: &Project) -> Result<(), StoreError>;

    /// Remove a project document. Returns whether it existed. Tasks are left
    /// untouched.
    async fn delete_project(&self, id: ProjectId) -> Result<bool, StoreError>;

    async fn insert_task(&self, task: &Task) -> Result<(), StoreError>;

    /// Tasks whose `project` reference equals `project`, oldest first.
    async fn tasks_for_project(&self, project: ProjectId) -> Result<Vec<Task>, StoreError>;

    /// Remove every task referencing `project`. Returns the number removed.
    async fn delete_tasks_for_project(&self, project: ProjectId) -> Result<u64, StoreError>;
}
