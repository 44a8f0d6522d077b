//! Project configuration (`config.yaml`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IoResultExt, Result, SyncError};

/// File name searched for by [`Config::discover`].
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Names of the two Project date fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFields {
    #[serde(default = "default_start_field")]
    pub start: String,

    #[serde(default = "default_end_field")]
    pub end: String,
}

impl Default for DateFields {
    fn default() -> Self {
        Self {
            start: default_start_field(),
            end: default_end_field(),
        }
    }
}

fn default_start_field() -> String {
    "Start Date".to_string()
}

fn default_end_field() -> String {
    "Due Date".to_string()
}

fn default_output_file() -> String {
    "tasks.yaml".to_string()
}

/// Settings for one repository and Project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Repository in `owner/name` form
    pub repo: String,

    /// Number of the GitHub Project (V2) holding the issues
    pub project_number: u64,

    #[serde(default)]
    pub date_fields: DateFields,

    /// Working file, `.yaml`/`.yml` or `.xlsx`, relative to the config file
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Only pull root issues carrying one of these labels
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels_filter: Vec<String>,

    /// Pull closed root issues as well
    #[serde(default)]
    pub include_closed: bool,
}

impl Config {
    pub fn new(repo: impl Into<String>, project_number: u64) -> Self {
        Self {
            repo: repo.into(),
            project_number,
            date_fields: DateFields::default(),
            output_file: default_output_file(),
            labels_filter: Vec::new(),
            include_closed: false,
        }
    }

    /// Parses and normalizes configuration text.
    pub fn from_yaml_str(text: &str, origin: &Path) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text).map_err(|source| SyncError::Yaml {
            path: origin.to_path_buf(),
            source,
        })?;
        config.normalized()
    }

    /// Trims string settings and checks the repository form.
    pub fn normalized(mut self) -> Result<Self> {
        self.repo = self.repo.trim().to_string();
        self.output_file = self.output_file.trim().to_string();
        self.date_fields.start = self.date_fields.start.trim().to_string();
        self.date_fields.end = self.date_fields.end.trim().to_string();
        self.labels_filter = self
            .labels_filter
            .iter()
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect();

        match self.repo.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {}
            _ => {
                return Err(SyncError::invalid_input("repo")
                    .with_reason(format!("expected 'owner/name', got '{}'", self.repo)))
            }
        }
        if self.output_file.is_empty() {
            return Err(SyncError::invalid_input("output_file").with_reason("must not be empty"));
        }
        Ok(self)
    }

    /// Repository owner (user or organization).
    pub fn owner(&self) -> &str {
        self.repo.split_once('/').map_or("", |(owner, _)| owner)
    }

    pub fn repo_name(&self) -> &str {
        self.repo.split_once('/').map_or("", |(_, name)| name)
    }

    /// Searches `start` and its ancestors for a config file.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).at_path(path)?;
        log::debug!("Loaded configuration from {}", path.display());
        Self::from_yaml_str(&text, path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_yaml::to_string(self).map_err(|source| SyncError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, text).at_path(path)
    }

    /// Locations of every artifact derived from the working file, resolved
    /// against `base_dir` (the directory holding the config file).
    pub fn artifacts(&self, base_dir: &Path) -> Artifacts {
        Artifacts::for_working_file(base_dir.join(&self.output_file))
    }
}

/// Files written by a pull and read by a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    /// The configured working file
    pub working_file: PathBuf,

    /// YAML encoding, `<stem>.yaml` unless the working file is `.yml`
    pub yaml: PathBuf,

    /// Spreadsheet encoding, `<stem>.xlsx`
    pub spreadsheet: PathBuf,

    /// Mermaid chart document, `<stem>_gantt.md`
    pub gantt: PathBuf,

    /// Directory of per-issue body files
    pub issues_dir: PathBuf,
}

impl Artifacts {
    pub fn for_working_file(working_file: PathBuf) -> Self {
        let dir = working_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let stem = working_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tasks".to_string());
        let yaml = if crate::formats::Format::of(&working_file) == crate::formats::Format::Yaml {
            working_file.clone()
        } else {
            dir.join(format!("{stem}.yaml"))
        };

        Self {
            yaml,
            spreadsheet: dir.join(format!("{stem}.xlsx")),
            gantt: dir.join(format!("{stem}_gantt.md")),
            issues_dir: dir.join("issues"),
            working_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_defaults_are_filled_in() {
        let config =
            Config::from_yaml_str("repo: acme/roadmap\nproject_number: 3\n", Path::new("c"))
                .unwrap();

        assert_eq!(config.owner(), "acme");
        assert_eq!(config.repo_name(), "roadmap");
        assert_eq!(config.date_fields.start, "Start Date");
        assert_eq!(config.date_fields.end, "Due Date");
        assert_eq!(config.output_file, "tasks.yaml");
        assert!(!config.include_closed);
    }

    #[test]
    fn test_strings_are_trimmed() {
        let text = "repo: '  acme/roadmap '\nproject_number: 1\noutput_file: ' plan.xlsx'\n";
        let config = Config::from_yaml_str(text, Path::new("c")).unwrap();

        assert_eq!(config.repo, "acme/roadmap");
        assert_eq!(config.output_file, "plan.xlsx");
    }

    #[test]
    fn test_repo_must_have_owner_and_name() {
        let error = Config::from_yaml_str("repo: roadmap\nproject_number: 1\n", Path::new("c"))
            .unwrap_err();
        assert!(matches!(error, SyncError::InvalidInput { ref field, .. } if field == "repo"));
    }

    #[test]
    fn test_discover_searches_parents() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        Config::new("acme/roadmap", 2)
            .save(&temp_dir.path().join(CONFIG_FILE_NAME))
            .unwrap();

        let found = Config::discover(&nested).unwrap();
        assert_eq!(found, temp_dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(Config::load(&found).unwrap().project_number, 2);
    }

    #[test]
    fn test_artifacts_share_the_stem() {
        let mut config = Config::new("acme/roadmap", 2);
        config.output_file = "plan/roadmap.xlsx".to_string();
        let artifacts = config.artifacts(Path::new("/work"));

        assert_eq!(artifacts.working_file, Path::new("/work/plan/roadmap.xlsx"));
        assert_eq!(artifacts.yaml, Path::new("/work/plan/roadmap.yaml"));
        assert_eq!(artifacts.spreadsheet, Path::new("/work/plan/roadmap.xlsx"));
        assert_eq!(artifacts.gantt, Path::new("/work/plan/roadmap_gantt.md"));
        assert_eq!(artifacts.issues_dir, Path::new("/work/plan/issues"));
    }
}
