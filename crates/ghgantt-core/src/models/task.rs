//! The task tree.

use std::collections::BTreeSet;
use std::fmt;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::field::Derived;

/// Issue number of a task on the remote.
///
/// The value `0` is the sentinel for "not created yet"; such a task is
/// created on the next push.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RemoteId(pub u64);

impl RemoteId {
    /// The sentinel identifier of a task that only exists locally.
    pub const NEW: RemoteId = RemoteId(0);

    pub fn is_new(self) -> bool {
        self.0 == 0
    }

    /// Returns the identifier unless it is the sentinel.
    pub fn assigned(self) -> Option<RemoteId> {
        if self.is_new() {
            None
        } else {
            Some(self)
        }
    }

    pub fn number(self) -> u64 {
        self.0
    }
}

impl From<u64> for RemoteId {
    fn from(value: u64) -> Self {
        RemoteId(value)
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_new() {
            f.write_str("(new)")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// A unit of schedulable work mapped to one remote issue.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Task {
    /// Issue number, or [`RemoteId::NEW`]
    pub remote_id: RemoteId,

    /// Opaque node identifier of the issue, when known
    pub node_id: Option<String>,

    /// Identifier of the issue's Project item, when known
    pub item_id: Option<String>,

    /// Browser URL of the issue, when known
    pub url: Option<String>,

    pub title: String,

    /// Issue description. `None` means "not tracked", so no body diff happens.
    pub body: Option<String>,

    pub start: Option<Date>,
    pub end: Option<Date>,

    pub assignees: BTreeSet<String>,
    pub labels: BTreeSet<String>,

    /// Whether the issue is closed
    pub closed: bool,

    /// Milestone title as reported by the remote; never pushed
    pub milestone: Derived<Option<String>>,

    /// Completion percentage; recomputed for any task with subtasks
    pub progress: Derived<u8>,

    /// Parent issue as reported by the remote snapshot. Local trees encode
    /// parenthood by nesting and leave this empty.
    pub parent: Option<RemoteId>,

    /// Ordered sub-tasks
    pub subtasks: Vec<Task>,
}

impl Task {
    /// Creates a task that does not exist remotely yet.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Creates a task bound to an existing issue.
    pub fn existing(remote_id: u64, title: impl Into<String>) -> Self {
        Self {
            remote_id: RemoteId(remote_id),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn is_new(&self) -> bool {
        self.remote_id.is_new()
    }

    pub fn is_leaf(&self) -> bool {
        self.subtasks.is_empty()
    }

    /// Whether the task can be placed on a chart.
    pub fn is_scheduled(&self) -> bool {
        self.start.is_some()
    }

    /// Number of tasks in this subtree, the task itself included.
    pub fn count(&self) -> usize {
        1 + self.subtasks.iter().map(Task::count).sum::<usize>()
    }

    /// Height of this subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.subtasks.iter().map(Task::depth).max().unwrap_or(0)
    }

    /// Label used in diagnostics: `#42 "Title"` or `(new) "Title"`.
    pub fn reference(&self) -> String {
        format!("{} \"{}\"", self.remote_id, self.title)
    }
}

/// Position of a task inside a tree: child indices from the root list down.
pub type TaskPath = Vec<usize>;

/// A task visited by [`walk`], with its position in the tree.
#[derive(Debug, Clone)]
pub struct TaskEntry<'a> {
    pub path: TaskPath,
    pub parent: Option<&'a Task>,
    pub task: &'a Task,
}

impl TaskEntry<'_> {
    /// Nesting level, starting at 1 for root tasks.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Dotted outline number such as `1.2.1`.
    pub fn outline(&self) -> String {
        outline(&self.path)
    }
}

/// Formats a path as a one-based dotted outline number.
pub fn outline(path: &[usize]) -> String {
    path.iter()
        .map(|index| (index + 1).to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Pre-order traversal of a forest of tasks.
pub fn walk(roots: &[Task]) -> Walk<'_> {
    let stack = roots
        .iter()
        .enumerate()
        .rev()
        .map(|(index, task)| (vec![index], None, task))
        .collect();
    Walk { stack }
}

/// Iterator returned by [`walk`].
pub struct Walk<'a> {
    stack: Vec<(TaskPath, Option<&'a Task>, &'a Task)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = TaskEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (path, parent, task) = self.stack.pop()?;
        for (index, child) in task.subtasks.iter().enumerate().rev() {
            let mut child_path = path.clone();
            child_path.push(index);
            self.stack.push((child_path, Some(task), child));
        }
        Some(TaskEntry { path, parent, task })
    }
}

/// Resolves a path inside a forest.
pub fn task_at<'a>(roots: &'a [Task], path: &[usize]) -> Option<&'a Task> {
    let (first, rest) = path.split_first()?;
    let mut current = roots.get(*first)?;
    for index in rest {
        current = current.subtasks.get(*index)?;
    }
    Some(current)
}

/// Mutable variant of [`task_at`].
pub fn task_at_mut<'a>(roots: &'a mut [Task], path: &[usize]) -> Option<&'a mut Task> {
    let (first, rest) = path.split_first()?;
    let mut current = roots.get_mut(*first)?;
    for index in rest {
        current = current.subtasks.get_mut(*index)?;
    }
    Some(current)
}
