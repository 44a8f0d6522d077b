//! Projection of a task tree into a chart schedule.
//!
//! [`schedule`] turns a [`Project`] into ordered [`Section`]s of
//! [`ScheduleEntry`]s. Renderers in [`mermaid`] and [`table`] only format
//! what the projection decided.

pub mod mermaid;
pub mod table;

use std::fmt;
use std::str::FromStr;

use jiff::civil::{Date, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{walk, Project, RemoteId, Task, VisualState};

/// Section heading for tasks without a milestone.
pub const NO_MILESTONE: &str = "No Milestone";

/// Section heading of the flat layout.
pub const FLAT_SECTION: &str = "Tasks";

/// How scheduled tasks are split into sections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// One section per milestone, plus one for tasks without
    #[default]
    Milestone,

    /// One section per root task holding its whole subtree
    Hierarchy,

    /// A single section
    Flat,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Milestone => "milestone",
            GroupBy::Hierarchy => "hierarchy",
            GroupBy::Flat => "flat",
        }
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "milestone" | "mermaid" => Ok(GroupBy::Milestone),
            "hierarchy" => Ok(GroupBy::Hierarchy),
            "flat" => Ok(GroupBy::Flat),
            _ => Err(format!("Invalid grouping: {s}")),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOptions {
    pub group_by: GroupBy,

    /// Count durations in working days and tell the renderer to skip weekends
    pub exclude_weekends: bool,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            group_by: GroupBy::Milestone,
            exclude_weekends: true,
        }
    }
}

/// A task placed on the chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub remote_id: RemoteId,
    pub title: String,
    pub state: VisualState,
    pub start: Date,

    /// Last day, inclusive; equals `start` when the task has no end date
    pub end: Date,

    /// Length in working days or calendar days, never below one
    pub duration: i64,

    /// Nesting level, 1 for root tasks
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub entries: Vec<ScheduleEntry>,
}

/// Renderable description of a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub title: String,
    pub exclude_weekends: bool,
    pub sections: Vec<Section>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|section| section.entries.is_empty())
    }

    pub fn entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.sections.iter().flat_map(|section| section.entries.iter())
    }
}

/// Inclusive number of calendar days from `start` to `end`.
pub fn calendar_days(start: Date, end: Date) -> i64 {
    if end < start {
        return 0;
    }
    let mut days = 1;
    let mut day = start;
    while day < end {
        match day.tomorrow() {
            Ok(next) => day = next,
            Err(_) => break,
        }
        days += 1;
    }
    days
}

fn is_weekend(day: Date) -> bool {
    matches!(day.weekday(), Weekday::Saturday | Weekday::Sunday)
}

/// Inclusive number of days from `start` to `end` that fall on a weekday.
pub fn working_days(start: Date, end: Date) -> i64 {
    if end < start {
        return 0;
    }
    let mut days = 0;
    let mut day = start;
    loop {
        if !is_weekend(day) {
            days += 1;
        }
        if day >= end {
            break;
        }
        match day.tomorrow() {
            Ok(next) => day = next,
            Err(_) => break,
        }
    }
    days
}

fn entry(task: &Task, depth: usize, exclude_weekends: bool) -> Option<ScheduleEntry> {
    let start = task.start?;
    let end = task.end.filter(|end| *end >= start).unwrap_or(start);
    let duration = if exclude_weekends {
        working_days(start, end)
    } else {
        calendar_days(start, end)
    };
    Some(ScheduleEntry {
        remote_id: task.remote_id,
        title: task.title.clone(),
        state: VisualState::of(task),
        start,
        end,
        // A span lying entirely on a weekend still renders as a one-day bar
        duration: duration.max(1),
        depth,
    })
}

fn sorted(mut entries: Vec<ScheduleEntry>) -> Vec<ScheduleEntry> {
    entries.sort_by_key(|entry| entry.start);
    entries
}

/// Projects the tasks of `project` that have a start date.
pub fn schedule(project: &Project, options: &ScheduleOptions) -> Schedule {
    let weekends = options.exclude_weekends;
    let sections = match options.group_by {
        GroupBy::Flat => {
            let entries: Vec<_> = walk(&project.tasks)
                .filter_map(|e| entry(e.task, e.depth(), weekends))
                .collect();
            if entries.is_empty() {
                Vec::new()
            } else {
                vec![Section {
                    name: FLAT_SECTION.to_string(),
                    entries: sorted(entries),
                }]
            }
        }
        GroupBy::Milestone => {
            let mut sections = vec![Section {
                name: NO_MILESTONE.to_string(),
                entries: Vec::new(),
            }];
            for visited in walk(&project.tasks) {
                let Some(scheduled) = entry(visited.task, visited.depth(), weekends) else {
                    continue;
                };
                let name = visited
                    .task
                    .milestone
                    .get()
                    .as_deref()
                    .unwrap_or(NO_MILESTONE);
                match sections.iter_mut().find(|section| section.name == name) {
                    Some(section) => section.entries.push(scheduled),
                    None => sections.push(Section {
                        name: name.to_string(),
                        entries: vec![scheduled],
                    }),
                }
            }
            sections
                .into_iter()
                .filter(|section| !section.entries.is_empty())
                .map(|section| Section {
                    name: section.name,
                    entries: sorted(section.entries),
                })
                .collect()
        }
        GroupBy::Hierarchy => project
            .tasks
            .iter()
            .filter_map(|root| {
                let entries: Vec<_> = walk(std::slice::from_ref(root))
                    .filter_map(|e| entry(e.task, e.depth(), weekends))
                    .collect();
                (!entries.is_empty()).then(|| Section {
                    name: root.title.clone(),
                    entries: sorted(entries),
                })
            })
            .collect(),
    };

    Schedule {
        title: project.meta.title.clone(),
        exclude_weekends: weekends,
        sections,
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;
    use crate::models::{Derived, ProjectMeta};

    fn dated(id: u64, title: &str, start: Date, end: Option<Date>) -> Task {
        let mut task = Task::existing(id, title);
        task.start = Some(start);
        task.end = end;
        task
    }

    #[test]
    fn test_working_days_skip_weekends() {
        // 2026-01-19 is a Monday.
        assert_eq!(working_days(date(2026, 1, 19), date(2026, 1, 23)), 5);
        assert_eq!(working_days(date(2026, 1, 19), date(2026, 1, 26)), 6);
        assert_eq!(working_days(date(2026, 1, 24), date(2026, 1, 25)), 0);
        assert_eq!(calendar_days(date(2026, 1, 19), date(2026, 1, 26)), 8);
        assert_eq!(calendar_days(date(2026, 1, 20), date(2026, 1, 20)), 1);
    }

    #[test]
    fn test_undated_tasks_are_omitted() {
        let mut parent = Task::existing(1, "Undated parent");
        parent
            .subtasks
            .push(dated(2, "Dated child", date(2026, 2, 2), None));
        let project = Project::new(ProjectMeta::default(), vec![parent]);

        let schedule = schedule(&project, &ScheduleOptions::default());
        let entries: Vec<_> = schedule.entries().collect();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].duration, 1);
        assert_eq!(entries[0].end, date(2026, 2, 2));
    }

    #[test]
    fn test_milestone_sections() {
        let mut late = dated(1, "Late", date(2026, 3, 2), Some(date(2026, 3, 3)));
        late.milestone = Derived::new(Some("v1".to_string()));
        let mut early = dated(2, "Early", date(2026, 2, 2), Some(date(2026, 2, 3)));
        early.milestone = Derived::new(Some("v1".to_string()));
        let loose = dated(3, "Loose", date(2026, 1, 5), None);
        let project = Project::new(ProjectMeta::default(), vec![late, early, loose]);

        let schedule = schedule(&project, &ScheduleOptions::default());

        let names: Vec<_> = schedule.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, [NO_MILESTONE, "v1"]);
        assert_eq!(schedule.sections[1].entries[0].title, "Early");
    }

    #[test]
    fn test_hierarchy_sections_follow_roots() {
        let mut root = dated(1, "Backend", date(2026, 1, 5), Some(date(2026, 1, 30)));
        root.subtasks
            .push(dated(2, "Schema", date(2026, 1, 5), Some(date(2026, 1, 9))));
        let solo = Task::existing(3, "Undated");
        let project = Project::new(ProjectMeta::default(), vec![root, solo]);

        let schedule = schedule(
            &project,
            &ScheduleOptions {
                group_by: GroupBy::Hierarchy,
                exclude_weekends: false,
            },
        );

        assert_eq!(schedule.sections.len(), 1);
        assert_eq!(schedule.sections[0].name, "Backend");
        assert_eq!(schedule.sections[0].entries[1].depth, 2);
        assert_eq!(schedule.sections[0].entries[1].duration, 5);
    }

    #[test]
    fn test_hierarchy_section_entries_sorted_by_start() {
        let mut root = dated(1, "Backend", date(2026, 1, 5), Some(date(2026, 1, 30)));
        root.subtasks
            .push(dated(2, "Deploy", date(2026, 1, 26), Some(date(2026, 1, 30))));
        root.subtasks
            .push(dated(3, "Schema", date(2026, 1, 12), Some(date(2026, 1, 16))));
        let project = Project::new(ProjectMeta::default(), vec![root]);

        let schedule = schedule(
            &project,
            &ScheduleOptions {
                group_by: GroupBy::Hierarchy,
                exclude_weekends: true,
            },
        );

        let titles: Vec<_> = schedule.entries().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Backend", "Schema", "Deploy"]);
    }

    #[test]
    fn test_weekend_only_span_renders_one_day() {
        // 2026-01-24 and 2026-01-25 are a Saturday and a Sunday.
        let task = dated(1, "Offsite", date(2026, 1, 24), Some(date(2026, 1, 25)));

        let working = entry(&task, 1, true).map(|e| e.duration);
        let calendar = entry(&task, 1, false).map(|e| e.duration);

        assert_eq!(working, Some(1));
        assert_eq!(calendar, Some(2));
    }

    #[test]
    fn test_visual_state_in_entries() {
        let mut done = dated(1, "Done", date(2026, 1, 5), None);
        done.closed = true;
        let mut active = dated(2, "Active", date(2026, 1, 6), None);
        active.progress = Derived::new(30);
        let project = Project::new(ProjectMeta::default(), vec![done, active]);

        let schedule = schedule(
            &project,
            &ScheduleOptions {
                group_by: GroupBy::Flat,
                exclude_weekends: true,
            },
        );
        let states: Vec<_> = schedule.entries().map(|e| e.state).collect();
        assert_eq!(states, [VisualState::Done, VisualState::Active]);
        assert!(!states.contains(&VisualState::Critical));
    }
}
