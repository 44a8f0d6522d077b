use std::collections::BTreeSet;

use ghgantt_core::formats::{spreadsheet, yaml};
use ghgantt_core::models::{Derived, Project, ProjectMeta, RemoteId, Task};
use ghgantt_core::progress;
use jiff::civil::date;
use jiff::ToSpan;
use proptest::prelude::*;
use tempfile::TempDir;

fn arb_labels() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-z]{1,6}", 0..3)
}

fn arb_task() -> impl Strategy<Value = Task> {
    let fields = (
        "[A-Z][a-z0-9]{0,8}( [a-z0-9]{1,6})?",
        prop::option::of((0i64..60, 0i64..20)),
        arb_labels(),
        arb_labels(),
        any::<bool>(),
        0u8..=100,
        prop::option::of("v[0-9]"),
    )
        .prop_map(|(title, span, assignees, labels, closed, progress, milestone)| {
            let mut task = Task::new(title);
            if let Some((offset, length)) = span {
                let start = date(2026, 1, 1) + offset.days();
                task.start = Some(start);
                task.end = Some(start + length.days());
            }
            task.assignees = assignees;
            task.labels = labels;
            task.closed = closed;
            task.progress = Derived::new(progress);
            task.milestone = Derived::new(milestone);
            task
        });

    fields.prop_recursive(3, 24, 4, |inner| {
        (inner.clone(), prop::collection::vec(inner, 0..4)).prop_map(|(mut task, subtasks)| {
            task.subtasks = subtasks;
            task
        })
    })
}

fn number(tasks: &mut [Task], next: &mut u64) {
    for task in tasks {
        task.remote_id = RemoteId(*next);
        *next += 1;
        number(&mut task.subtasks, next);
    }
}

fn arb_project() -> impl Strategy<Value = Project> {
    prop::collection::vec(arb_task(), 0..4).prop_map(|mut tasks| {
        number(&mut tasks, &mut 1);
        let meta = ProjectMeta {
            id: "PVT_7".to_string(),
            number: 7,
            title: "Generated".to_string(),
            url: "https://github.com/orgs/acme/projects/7".to_string(),
            ..Default::default()
        };
        let mut project = Project::new(meta, tasks);
        progress::recompute(&mut project);
        project
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn yaml_round_trip_preserves_project(project in arb_project()) {
        let origin = std::path::Path::new("generated.yaml");
        let text = yaml::to_string(&project, origin).unwrap();
        let parsed = yaml::from_str(&text, origin).unwrap();

        prop_assert_eq!(parsed, project);
    }

    #[test]
    fn spreadsheet_round_trip_preserves_project(project in arb_project()) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("generated.xlsx");
        spreadsheet::save(&path, &project).unwrap();
        let loaded = spreadsheet::load(&path).unwrap();

        prop_assert_eq!(loaded, project);
    }
}
