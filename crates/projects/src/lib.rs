//! `taskboard-projects`: project and task documents.

pub mod project;
pub mod task;

pub use project::{Project, ProjectInput, ProjectView};
pub use task::{Task, TaskInput};
