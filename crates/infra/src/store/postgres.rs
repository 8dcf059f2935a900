//! Postgres-backed document store.
//!
//! Each collection is a table of JSONB documents keyed by UUID, with the
//! fields used for lookups (user email, task project reference) lifted
//! into indexed columns.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation on `users_email_key`) | `23505` | `DuplicateEmail` |
//! | Database (other) | Any other | `Backend` |
//! | ColumnDecode / Decode | N/A | `Serialization` |
//! | Other | N/A | `Backend` |

use std::sync::Arc;

use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use taskboard_auth::{User, normalize_email};
use taskboard_core::{ProjectId, UserId};
use taskboard_projects::{Project, Task};

use super::{ProjectStore, StoreError, UserStore};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL,
        doc JSONB NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users (email)",
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id UUID PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL,
        doc JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id UUID PRIMARY KEY,
        project_id UUID NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        doc JSONB NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS tasks_project_id_idx ON tasks (project_id)",
];

/// Postgres document store implementing both [`UserStore`] and [`ProjectStore`].
///
/// Uses the SQLx connection pool, which is `Send + Sync`; every call is an
/// independent statement (no multi-document transactions).
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: Arc<PgPool>,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for stmt in SCHEMA {
            sqlx::query(stmt)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

fn decode_doc<T>(row: &sqlx::postgres::PgRow) -> Result<T, StoreError>
where
    T: serde::de::DeserializeOwned,
{
    let Json(doc): Json<T> = row
        .try_get("doc")
        .map_err(|e| StoreError::Serialization(format!("failed to decode document: {e}")))?;
    Ok(doc)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            let unique_violation = db_err.code().is_some_and(|code| code.as_ref() == "23505");
            if unique_violation && db_err.constraint() == Some("users_email_key") {
                StoreError::DuplicateEmail(msg)
            } else {
                StoreError::Backend(msg)
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Serialization(format!("decode error in {}: {}", operation, err))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[async_trait::async_trait]
impl UserStore for PostgresDocumentStore {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (id, email, doc) VALUES ($1, $2, $3)")
            .bind(user.id.as_uuid())
            .bind(&user.email)
            .bind(Json(user))
            .execute(&*self.pool)
            .await
            .map_err(|e| match map_sqlx_error("insert_user", e) {
                StoreError::DuplicateEmail(_) => StoreError::DuplicateEmail(user.email.clone()),
                other => other,
            })?;
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT doc FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_id", e))?;
        row.as_ref().map(decode_doc::<User>).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT doc FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.as_ref().map(decode_doc::<User>).transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET email = $2, doc = $3 WHERE id = $1")
            .bind(user.id.as_uuid())
            .bind(&user.email)
            .bind(Json(user))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("save_user", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(format!("user {}", user.id)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProjectStore for PostgresDocumentStore {
    #[instrument(skip(self, project), fields(project_id = %project.id))]
    async fn insert_project(&self, project: &Project) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO projects (id, created_at, doc) VALUES ($1, $2, $3)")
            .bind(project.id.as_uuid())
            .bind(project.created_at)
            .bind(Json(project))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_project", e))?;
        Ok(())
    }

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        let row = sqlx::query("SELECT doc FROM projects WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_project", e))?;
        row.as_ref().map(decode_doc::<Project>).transpose()
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query("SELECT doc FROM projects ORDER BY created_at ASC, id ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_projects", e))?;
        rows.iter().map(decode_doc::<Project>).collect()
    }

    #[instrument(skip(self, project), fields(project_id = %project.id))]
    async fn save_project(&self, project: &Project) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE projects SET doc = $2 WHERE id = $1")
            .bind(project.id.as_uuid())
            .bind(Json(project))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("save_project", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(format!("project {}", project.id)));
        }
        Ok(())
    }

    async fn delete_project(&self, id: ProjectId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_project", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO tasks (id, project_id, created_at, doc) VALUES ($1, $2, $3, $4)")
            .bind(task.id.as_uuid())
            .bind(task.project.as_uuid())
            .bind(task.created_at)
            .bind(Json(task))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_task", e))?;
        Ok(())
    }

    async fn tasks_for_project(&self, project: ProjectId) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query(
            "SELECT doc FROM tasks WHERE project_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(project.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("tasks_for_project", e))?;
        rows.iter().map(decode_doc::<Task>).collect()
    }

    async fn delete_tasks_for_project(&self, project: ProjectId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(project.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_tasks_for_project", e))?;
        Ok(result.rows_affected())
    }
}
