//! Project metadata and the root of a task tree.

use super::field::Derived;
use super::task::{task_at, task_at_mut, walk, RemoteId, Task, Walk};

/// Identifying and summary data of the tracked GitHub Project.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectMeta {
    /// Opaque node identifier of the Project
    pub id: String,

    /// Project number within its owner
    pub number: u64,

    pub title: String,

    pub url: String,

    /// Completion over the root-level tasks
    pub progress: Derived<u8>,
}

/// A full task tree together with its project metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Project {
    pub meta: ProjectMeta,
    pub tasks: Vec<Task>,
}

impl Project {
    pub fn new(meta: ProjectMeta, tasks: Vec<Task>) -> Self {
        Self { meta, tasks }
    }

    /// Number of tasks at every level.
    pub fn total_tasks(&self) -> usize {
        self.tasks.iter().map(Task::count).sum()
    }

    /// Pre-order traversal of every task.
    pub fn walk(&self) -> Walk<'_> {
        walk(&self.tasks)
    }

    pub fn task_at(&self, path: &[usize]) -> Option<&Task> {
        task_at(&self.tasks, path)
    }

    pub fn task_at_mut(&mut self, path: &[usize]) -> Option<&mut Task> {
        task_at_mut(&mut self.tasks, path)
    }

    /// Finds the task bound to `remote_id`. The sentinel never matches.
    pub fn find(&self, remote_id: RemoteId) -> Option<&Task> {
        if remote_id.is_new() {
            return None;
        }
        self.walk()
            .map(|entry| entry.task)
            .find(|task| task.remote_id == remote_id)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
