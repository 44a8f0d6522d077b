//! Working file encodings.
//!
//! The same [`Project`] can be stored as nested YAML ([`yaml`]) or as a flat
//! `.xlsx` workbook with parent pointers ([`spreadsheet`]). Both adapters
//! validate on read and return a tree whose derived fields are recomputed.
//! Issue descriptions live next to the working file in [`bodies`].

pub mod bodies;
pub mod spreadsheet;
pub mod yaml;

use std::collections::BTreeSet;
use std::path::Path;

use jiff::civil::Date;

use crate::error::Result;
use crate::models::Project;

/// On-disk encoding of a working file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Spreadsheet,
}

impl Format {
    /// Picks the encoding from the file extension; anything that is not a
    /// workbook is treated as YAML.
    pub fn of(path: &Path) -> Self {
        match path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .as_deref()
        {
            Some("xlsx") | Some("xls") => Format::Spreadsheet,
            _ => Format::Yaml,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Spreadsheet => "spreadsheet",
        }
    }
}

/// Reads a working file in the encoding its extension names.
pub fn load_project(path: &Path) -> Result<Project> {
    match Format::of(path) {
        Format::Yaml => yaml::load(path),
        Format::Spreadsheet => spreadsheet::load(path),
    }
}

/// Writes a working file in the encoding its extension names.
pub fn save_project(path: &Path, project: &Project) -> Result<()> {
    match Format::of(path) {
        Format::Yaml => yaml::save(path, project),
        Format::Spreadsheet => spreadsheet::save(path, project),
    }
}

/// Parses an ISO calendar date. Blank text means "no date".
pub(crate) fn parse_date(text: &str) -> std::result::Result<Option<Date>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<Date>()
        .map(Some)
        .map_err(|_| text.to_string())
}

/// Splits a comma-joined cell into a set; blank items are dropped.
pub(crate) fn split_set(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn join_set(items: &BTreeSet<String>) -> String {
    items.iter().cloned().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::of(Path::new("plan.XLSX")), Format::Spreadsheet);
        assert_eq!(Format::of(Path::new("plan.yml")), Format::Yaml);
        assert_eq!(Format::of(Path::new("plan")), Format::Yaml);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2026-01-20"), Ok(Some(date(2026, 1, 20))));
        assert_eq!(parse_date("  "), Ok(None));
        assert_eq!(parse_date("20/01/2026"), Err("20/01/2026".to_string()));
    }

    #[test]
    fn test_split_set_drops_blanks() {
        assert!(split_set("").is_empty());
        assert!(split_set(" , ").is_empty());
        assert_eq!(
            split_set("bug, ui ,bug"),
            BTreeSet::from(["bug".to_string(), "ui".to_string()])
        );
    }
}
