//! Filters applied to a fetched task tree.

use std::collections::BTreeSet;

use super::task::Task;
use crate::config::Config;

/// Options limiting which root tasks a pull keeps.
///
/// A root task that passes keeps its whole subtree, so derived progress is
/// the same as in the unfiltered snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchFilter {
    /// Keep closed root tasks
    pub include_closed: bool,

    /// Keep only root tasks carrying at least one of these labels.
    /// Empty means no label restriction.
    pub labels: BTreeSet<String>,
}

impl FetchFilter {
    /// A filter that keeps every task. Used for push and status, which must
    /// diff against the complete remote state.
    pub fn everything() -> Self {
        Self {
            include_closed: true,
            labels: BTreeSet::new(),
        }
    }

    pub fn accepts(&self, task: &Task) -> bool {
        if task.closed && !self.include_closed {
            return false;
        }
        self.labels.is_empty() || !self.labels.is_disjoint(&task.labels)
    }

    /// Retains the accepted root tasks.
    pub fn apply(&self, tasks: Vec<Task>) -> Vec<Task> {
        tasks.into_iter().filter(|task| self.accepts(task)).collect()
    }
}

impl From<&Config> for FetchFilter {
    fn from(config: &Config) -> Self {
        Self {
            include_closed: config.include_closed,
            labels: config.labels_filter.iter().cloned().collect(),
        }
    }
}
