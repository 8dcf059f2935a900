use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use taskboard_auth::{User, normalize_email};
use taskboard_core::{Entity, ProjectId, UserId};
use taskboard_projects::{Project, Task};

use super::{ProjectStore, StoreError, UserStore};

/// One in-memory document collection keyed by entity id.
#[derive(Debug)]
struct Collection<E: Entity> {
    inner: RwLock<HashMap<E::Id, E>>,
}

impl<E: Entity> Collection<E> {
    fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<E::Id, E>>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("collection lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<E::Id, E>>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("collection lock poisoned".to_string()))
    }
}

/// In-memory document store for tests/dev.
///
/// Implements both [`UserStore`] and [`ProjectStore`]; share one instance
/// behind an `Arc` to get both views of the same data.
#[derive(Debug)]
pub struct InMemoryDocumentStore {
    users: Collection<User>,
    projects: Collection<Project>,
    tasks: Collection<Task>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            users: Collection::new(),
            projects: Collection::new(),
            tasks: Collection::new(),
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Every stored task, including ones orphaned by a project delete.
    pub fn all_tasks(&self) -> Vec<Task> {
        self.tasks
            .read()
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryDocumentStore {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut map = self.users.write()?;
        if map.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail(user.email.clone()));
        }
        map.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read()?.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        Ok(self
            .users
            .read()?
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let mut map = self.users.write()?;
        if map.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(StoreError::DuplicateEmail(user.email.clone()));
        }
        match map.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(StoreError::Missing(format!("user {}", user.id))),
        }
    }
}

#[async_trait::async_trait]
impl ProjectStore for InMemoryDocumentStore {
    async fn insert_project(&self, project: &Project) -> Result<(), StoreError> {
        self.projects.write()?.insert(project.id, project.clone());
        Ok(())
    }

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.projects.read()?.get(&id).cloned())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let mut items: Vec<Project> = self.projects.read()?.values().cloned().collect();
        items.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(items)
    }

    async fn save_project(&self, project: &Project) -> Result<(), StoreError> {
        match self.projects.write()?.get_mut(&project.id) {
            Some(slot) => {
                *slot = project.clone();
                Ok(())
            }
            None => Err(StoreError::Missing(format!("project {}", project.id))),
        }
    }

    async fn delete_project(&self, id: ProjectId) -> Result<bool, StoreError> {
        Ok(self.projects.write()?.remove(&id).is_some())
    }

    async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        self.tasks.write()?.insert(task.id, task.clone());
        Ok(())
    }

    async fn tasks_for_project(&self, project: ProjectId) -> Result<Vec<Task>, StoreError> {
        let mut items: Vec<Task> = self
            .tasks
            .read()?
            .values()
            .filter(|t| t.project == project)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(items)
    }

    async fn delete_tasks_for_project(&self, project: ProjectId) -> Result<u64, StoreError> {
        let mut map = self.tasks.write()?;
        let before = map.len();
        map.retain(|_id, t| t.project != project);
        Ok((before - map.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use taskboard_core::UserId;
    use taskboard_projects::{ProjectInput, TaskInput};

    use super::*;

    fn user(email: &str) -> User {
        User::new("Test", email, "hash".to_string(), Utc::now())
    }

    fn project_input() -> ProjectInput {
        ProjectInput {
            title: "P".to_string(),
            description: String::new(),
            tasks: vec![],
        }
    }

    fn task_for(project: ProjectId) -> Task {
        let input = TaskInput {
            title: "t".to_string(),
            assigned_to: None,
            completed: false,
        };
        Task::from_input(&input, project, Utc::now())
    }

    #[tokio::test]
    async fn email_is_unique_case_insensitively() {
        let store = InMemoryDocumentStore::new();
        store.insert(&user("a@example.com")).await.unwrap();

        let err = store.insert(&user("A@Example.com")).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateEmail("a@example.com".to_string()));
        assert_eq!(store.user_count(), 1);

        let found = store.find_by_email(" A@EXAMPLE.COM ").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn save_requires_existing_document() {
        let store = InMemoryDocumentStore::new();
        let u = user("ghost@example.com");
        assert!(matches!(store.save(&u).await, Err(StoreError::Missing(_))));

        let p = Project::new(UserId::new(), &project_input(), Utc::now());
        assert!(matches!(store.save_project(&p).await, Err(StoreError::Missing(_))));
    }

    #[tokio::test]
    async fn delete_project_leaves_tasks() {
        let store = InMemoryDocumentStore::new();
        let p = Project::new(UserId::new(), &project_input(), Utc::now());
        store.insert_project(&p).await.unwrap();
        store.insert_task(&task_for(p.id)).await.unwrap();

        assert!(store.delete_project(p.id).await.unwrap());
        assert!(!store.delete_project(p.id).await.unwrap());
        assert_eq!(store.tasks_for_project(p.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_tasks_only_touches_one_project() {
        let store = InMemoryDocumentStore::new();
        let a = ProjectId::new();
        let b = ProjectId::new();
        store.insert_task(&task_for(a)).await.unwrap();
        store.insert_task(&task_for(a)).await.unwrap();
        store.insert_task(&task_for(b)).await.unwrap();

        assert_eq!(store.delete_tasks_for_project(a).await.unwrap(), 2);
        assert!(store.tasks_for_project(a).await.unwrap().is_empty());
        assert_eq!(store.tasks_for_project(b).await.unwrap().len(), 1);
    }
}
