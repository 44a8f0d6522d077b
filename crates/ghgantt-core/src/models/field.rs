//! Field provenance for task attributes.
//!
//! Some task attributes are owned by the user and flow back to the remote on
//! push; others are computed by this crate or owned by the remote and are only
//! ever read. The distinction is carried in the types: system-owned values
//! are wrapped in [`Derived`], and [`TaskField::provenance`] tells the
//! reconciliation engine which attributes take part in the outgoing diff.

use std::fmt;

/// Who is allowed to write a task attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Edited in the working file and pushed to the remote
    UserWritable,

    /// Computed locally or owned by the remote; never written back
    SystemDerived,
}

/// A value owned by the system.
///
/// It can be constructed and read freely, but only this crate replaces it
/// after construction, so no caller can smuggle a user-supplied progress or
/// milestone into a recomputed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Derived<T>(T);

impl<T> Derived<T> {
    /// Wraps a value read from a file or a remote snapshot.
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrows the current value.
    pub fn get(&self) -> &T {
        &self.0
    }

    /// Consumes the wrapper.
    pub fn into_inner(self) -> T {
        self.0
    }

    pub(crate) fn replace(&mut self, value: T) -> T {
        std::mem::replace(&mut self.0, value)
    }
}

impl<T: Copy> Derived<T> {
    /// Returns a copy of the current value.
    pub fn value(&self) -> T {
        self.0
    }
}

/// Every attribute of a task that the engine knows how to compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskField {
    Title,
    Body,
    Assignees,
    Labels,
    Closed,
    Start,
    End,
    Milestone,
    Progress,
}

impl TaskField {
    /// All fields in the order changes are reported.
    pub const ALL: [TaskField; 9] = [
        TaskField::Title,
        TaskField::Body,
        TaskField::Assignees,
        TaskField::Labels,
        TaskField::Closed,
        TaskField::Start,
        TaskField::End,
        TaskField::Milestone,
        TaskField::Progress,
    ];

    /// Provenance of the field.
    pub fn provenance(self) -> Provenance {
        match self {
            TaskField::Milestone | TaskField::Progress => Provenance::SystemDerived,
            _ => Provenance::UserWritable,
        }
    }

    /// Fields that take part in the outgoing diff.
    pub fn writable() -> impl Iterator<Item = TaskField> {
        Self::ALL
            .into_iter()
            .filter(|field| field.provenance() == Provenance::UserWritable)
    }

    /// Whether the field lives on the Project item rather than the issue.
    pub fn is_date(self) -> bool {
        matches!(self, TaskField::Start | TaskField::End)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskField::Title => "title",
            TaskField::Body => "body",
            TaskField::Assignees => "assignees",
            TaskField::Labels => "labels",
            TaskField::Closed => "closed",
            TaskField::Start => "start",
            TaskField::End => "end",
            TaskField::Milestone => "milestone",
            TaskField::Progress => "progress",
        }
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_fields_are_excluded_from_diff() {
        let writable: Vec<TaskField> = TaskField::writable().collect();

        assert!(!writable.contains(&TaskField::Milestone));
        assert!(!writable.contains(&TaskField::Progress));
        assert_eq!(writable.len(), 7);
    }

    #[test]
    fn test_derived_replace_returns_previous() {
        let mut progress = Derived::new(40u8);
        assert_eq!(progress.replace(100), 40);
        assert_eq!(progress.value(), 100);
    }
}
