//! Bottom-up completion percentages.
//!
//! A leaf keeps its stored progress unless it is closed, which forces 100.
//! A task with subtasks gets the share of its direct children that are
//! closed-equivalent: closed themselves, or parents whose own progress
//! reached 100. The project figure applies the same rule to the roots.
//! Rounding is half-up. Recomputing a tree twice gives the same values.

use crate::models::{Project, Task};

/// Rounded percentage of `done` out of `total`; `0` for an empty set.
pub fn percentage(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let rounded = (200 * done + total) / (2 * total);
    u8::try_from(rounded.min(100)).unwrap_or(100)
}

/// Whether a task counts as finished when its parent is computed.
pub fn is_closed_equivalent(task: &Task) -> bool {
    task.closed || (!task.is_leaf() && task.progress.value() == 100)
}

/// Recomputes progress for a task and its whole subtree.
pub fn recompute_task(task: &mut Task) -> u8 {
    if task.is_leaf() {
        if task.closed {
            task.progress.replace(100);
        }
        return task.progress.value();
    }

    for child in &mut task.subtasks {
        recompute_task(child);
    }
    let done = task
        .subtasks
        .iter()
        .filter(|child| is_closed_equivalent(child))
        .count();
    let value = percentage(done, task.subtasks.len());
    task.progress.replace(value);
    value
}

/// Recomputes every task and the project total.
pub fn recompute(project: &mut Project) {
    for task in &mut project.tasks {
        recompute_task(task);
    }
    let done = project
        .tasks
        .iter()
        .filter(|task| is_closed_equivalent(task))
        .count();
    let total = percentage(done, project.tasks.len());
    log::debug!(
        "Project progress {total}% ({done}/{} root tasks done)",
        project.tasks.len()
    );
    project.meta.progress.replace(total);
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::models::{Derived, ProjectMeta};

    fn leaf(id: u64, closed: bool) -> Task {
        let mut task = Task::existing(id, format!("Task {id}"));
        task.closed = closed;
        task
    }

    #[test]
    fn test_two_children_one_closed_is_fifty() {
        let mut root = leaf(1, false);
        root.subtasks = vec![leaf(2, true), leaf(3, false)];

        assert_eq!(recompute_task(&mut root), 50);
    }

    #[test]
    fn test_rounding_is_half_up() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(4, 4), 100);
    }

    #[test]
    fn test_leaf_keeps_stored_progress_unless_closed() {
        let mut open = leaf(1, false);
        open.progress = Derived::new(40);
        assert_eq!(recompute_task(&mut open), 40);

        let mut closed = leaf(2, true);
        closed.progress = Derived::new(40);
        assert_eq!(recompute_task(&mut closed), 100);
    }

    #[test]
    fn test_parent_with_children_ignores_supplied_progress() {
        let mut root = leaf(1, false);
        root.progress = Derived::new(90);
        root.subtasks = vec![leaf(2, false)];

        assert_eq!(recompute_task(&mut root), 0);
    }

    #[test]
    fn test_fully_done_parent_counts_as_closed() {
        let mut inner = leaf(2, false);
        inner.subtasks = vec![leaf(3, true), leaf(4, true)];
        let mut root = leaf(1, false);
        root.subtasks = vec![inner, leaf(5, false)];

        assert_eq!(recompute_task(&mut root), 50);
    }

    #[test]
    fn test_leaf_at_hundred_is_not_closed_equivalent() {
        let mut done_leaf = leaf(2, false);
        done_leaf.progress = Derived::new(100);
        let mut root = leaf(1, false);
        root.subtasks = vec![done_leaf];

        assert_eq!(recompute_task(&mut root), 0);
    }

    #[test]
    fn test_project_progress_over_roots() {
        let mut project = Project::new(
            ProjectMeta::default(),
            vec![leaf(1, true), leaf(2, false), leaf(3, false), leaf(4, true)],
        );
        recompute(&mut project);

        assert_eq!(project.meta.progress.value(), 50);
    }

    #[test]
    fn test_empty_project_is_zero() {
        let mut project = Project::default();
        recompute(&mut project);
        assert_eq!(project.meta.progress.value(), 0);
    }

    fn arb_task() -> impl Strategy<Value = Task> {
        let leaf = (any::<bool>(), 0u8..=100).prop_map(|(closed, progress)| {
            let mut task = Task::new("leaf");
            task.closed = closed;
            task.progress = Derived::new(progress);
            task
        });
        leaf.prop_recursive(4, 32, 5, |inner| {
            (
                any::<bool>(),
                0u8..=100,
                prop::collection::vec(inner, 0..5),
            )
                .prop_map(|(closed, progress, subtasks)| {
                    let mut task = Task::new("node");
                    task.closed = closed;
                    task.progress = Derived::new(progress);
                    task.subtasks = subtasks;
                    task
                })
        })
    }

    proptest! {
        #[test]
        fn recompute_is_idempotent(tasks in prop::collection::vec(arb_task(), 0..4)) {
            let mut project = Project::new(ProjectMeta::default(), tasks);
            recompute(&mut project);
            let once = project.clone();
            recompute(&mut project);

            prop_assert_eq!(once, project);
        }

        #[test]
        fn progress_stays_in_range(task in arb_task()) {
            let mut task = task;
            let value = recompute_task(&mut task);
            prop_assert!(value <= 100);
        }
    }
}
