#![allow(dead_code)]

use std::path::PathBuf;

use ghgantt_core::gateway::InMemoryGateway;
use ghgantt_core::models::{Project, ProjectMeta, Task};
use ghgantt_core::{Artifacts, Config};
use jiff::civil::date;
use tempfile::TempDir;

pub const CONFIG: &str = "repo: acme/roadmap\nproject_number: 3\n";

/// Working file matching [`seeded_remote`] exactly.
pub const IN_SYNC_YAML: &str = "\
project:
  number: 3
  title: Roadmap
tasks:
- issue: 10
  title: Backend
  start: 2026-01-05
  end: 2026-02-27
  subtasks:
  - issue: 11
    title: API
    start: 2026-01-05
    end: 2026-01-16
";

/// A directory holding `config.yaml` and `tasks.yaml`.
pub struct Workspace {
    pub dir: TempDir,
    pub config_path: PathBuf,
    pub config: Config,
    pub artifacts: Artifacts,
}

impl Workspace {
    pub fn new(tasks_yaml: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, CONFIG).expect("Failed to write config");
        std::fs::write(dir.path().join("tasks.yaml"), tasks_yaml)
            .expect("Failed to write working file");

        let config = Config::load(&config_path).expect("Failed to load config");
        let artifacts = config.artifacts(dir.path());
        Self {
            dir,
            config_path,
            config,
            artifacts,
        }
    }

    pub fn reload(&self) -> Project {
        ghgantt_core::formats::load_project(&self.artifacts.working_file)
            .expect("Failed to reload working file")
    }
}

pub fn meta() -> ProjectMeta {
    ProjectMeta {
        id: "PVT_3".to_string(),
        number: 3,
        title: "Roadmap".to_string(),
        url: "https://github.com/orgs/acme/projects/3".to_string(),
        ..Default::default()
    }
}

/// Remote with `#10 Backend` and its sub-issue `#11 API`, which has a body.
pub fn seeded_remote() -> InMemoryGateway {
    let mut api = Task::existing(11, "API");
    api.start = Some(date(2026, 1, 5));
    api.end = Some(date(2026, 1, 16));
    api.body = Some("Define the endpoints".to_string());

    let mut backend = Task::existing(10, "Backend");
    backend.start = Some(date(2026, 1, 5));
    backend.end = Some(date(2026, 2, 27));
    backend.subtasks.push(api);

    InMemoryGateway::from_project(&Project::new(meta(), vec![backend]))
}
