//! Spreadsheet (`.xlsx`) working file.
//!
//! The `Tasks` sheet holds one row per task in pre-order, with the hierarchy
//! encoded by the `Parent #` column. A row may only point at a parent listed
//! on an earlier row; rows are loaded into an arena first and linked in a
//! second pass, so a bad pointer is reported instead of orphaning the row.
//! The `Project Info` sheet stores the project metadata as key/value rows.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use jiff::civil::{date, Date};
use jiff::Span;
use rust_xlsxwriter::{
    Color, ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError,
};

use super::{join_set, parse_date, split_set};
use crate::error::{Result, SyncError};
use crate::models::{Derived, Project, ProjectMeta, RemoteId, Task, TaskPath};
use crate::progress;
use crate::validation::{check_tree, IssueKind, ValidationErrors, ValidationIssue};

pub const TASKS_SHEET: &str = "Tasks";
pub const INFO_SHEET: &str = "Project Info";

/// Columns of the `Tasks` sheet, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Issue,
    Title,
    Start,
    End,
    Assignees,
    Labels,
    Status,
    Progress,
    Parent,
    Milestone,
    Url,
    NodeId,
    ItemId,
}

impl Column {
    const ALL: [Column; 13] = [
        Column::Issue,
        Column::Title,
        Column::Start,
        Column::End,
        Column::Assignees,
        Column::Labels,
        Column::Status,
        Column::Progress,
        Column::Parent,
        Column::Milestone,
        Column::Url,
        Column::NodeId,
        Column::ItemId,
    ];

    fn header(self) -> &'static str {
        match self {
            Column::Issue => "Issue #",
            Column::Title => "Title",
            Column::Start => "Start Date",
            Column::End => "End Date",
            Column::Assignees => "Assignees",
            Column::Labels => "Labels",
            Column::Status => "Status",
            Column::Progress => "Progress %",
            Column::Parent => "Parent #",
            Column::Milestone => "Milestone",
            Column::Url => "URL",
            Column::NodeId => "Issue ID",
            Column::ItemId => "Project Item ID",
        }
    }

    fn width(self) -> f64 {
        match self {
            Column::Issue | Column::Parent => 10.0,
            Column::Title | Column::Url => 40.0,
            Column::Start | Column::End | Column::Milestone => 15.0,
            Column::Assignees | Column::Labels => 20.0,
            Column::Status | Column::Progress => 12.0,
            Column::NodeId | Column::ItemId => 24.0,
        }
    }

    fn index(self) -> u16 {
        Column::ALL
            .iter()
            .position(|column| *column == self)
            .and_then(|index| u16::try_from(index).ok())
            .unwrap_or(0)
    }
}

// Writing

struct Styles {
    header: Format,
    cell: Format,
    indented: Format,
    date: Format,
    key: Format,
}

impl Styles {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(0x4472C4))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin),
            cell: Format::new().set_border(FormatBorder::Thin),
            indented: Format::new().set_border(FormatBorder::Thin).set_indent(2),
            date: Format::new()
                .set_border(FormatBorder::Thin)
                .set_num_format("yyyy-mm-dd"),
            key: Format::new().set_bold(),
        }
    }
}

fn write_text(
    sheet: &mut Worksheet,
    row: u32,
    column: Column,
    text: &str,
    format: &Format,
) -> std::result::Result<(), XlsxError> {
    if text.is_empty() {
        sheet.write_blank(row, column.index(), format)?;
    } else {
        sheet.write_string_with_format(row, column.index(), text, format)?;
    }
    Ok(())
}

fn write_date(
    sheet: &mut Worksheet,
    row: u32,
    column: Column,
    value: Option<Date>,
    styles: &Styles,
) -> std::result::Result<(), XlsxError> {
    let Some(value) = value else {
        sheet.write_blank(row, column.index(), &styles.cell)?;
        return Ok(());
    };
    let serial = u16::try_from(value.year()).ok().and_then(|year| {
        ExcelDateTime::from_ymd(year, value.month().unsigned_abs(), value.day().unsigned_abs())
            .ok()
    });
    match serial {
        Some(datetime) => {
            sheet.write_datetime_with_format(row, column.index(), &datetime, &styles.date)?;
        }
        None => {
            sheet.write_string_with_format(row, column.index(), value.to_string(), &styles.cell)?;
        }
    }
    Ok(())
}

fn write_tasks_sheet(
    sheet: &mut Worksheet,
    project: &Project,
    styles: &Styles,
) -> std::result::Result<(), XlsxError> {
    sheet.set_name(TASKS_SHEET)?;
    for column in Column::ALL {
        sheet.write_string_with_format(0, column.index(), column.header(), &styles.header)?;
        sheet.set_column_width(column.index(), column.width())?;
    }

    let mut row = 1u32;
    for entry in project.walk() {
        let task = entry.task;
        let parent = entry.parent.map(|parent| parent.remote_id);

        sheet.write_number_with_format(
            row,
            Column::Issue.index(),
            task.remote_id.number() as f64,
            &styles.cell,
        )?;
        let title_format = if parent.is_some() {
            &styles.indented
        } else {
            &styles.cell
        };
        write_text(sheet, row, Column::Title, &task.title, title_format)?;
        write_date(sheet, row, Column::Start, task.start, styles)?;
        write_date(sheet, row, Column::End, task.end, styles)?;
        write_text(sheet, row, Column::Assignees, &join_set(&task.assignees), &styles.cell)?;
        write_text(sheet, row, Column::Labels, &join_set(&task.labels), &styles.cell)?;
        let status = if task.closed { "closed" } else { "open" };
        write_text(sheet, row, Column::Status, status, &styles.cell)?;
        sheet.write_number_with_format(
            row,
            Column::Progress.index(),
            f64::from(task.progress.value()),
            &styles.cell,
        )?;
        match parent.and_then(RemoteId::assigned) {
            Some(parent) => {
                sheet.write_number_with_format(
                    row,
                    Column::Parent.index(),
                    parent.number() as f64,
                    &styles.cell,
                )?;
            }
            None => {
                sheet.write_blank(row, Column::Parent.index(), &styles.cell)?;
            }
        }
        let milestone = task.milestone.get().as_deref().unwrap_or_default();
        write_text(sheet, row, Column::Milestone, milestone, &styles.cell)?;
        write_text(sheet, row, Column::Url, task.url.as_deref().unwrap_or_default(), &styles.cell)?;
        let node_id = task.node_id.as_deref().unwrap_or_default();
        write_text(sheet, row, Column::NodeId, node_id, &styles.cell)?;
        let item_id = task.item_id.as_deref().unwrap_or_default();
        write_text(sheet, row, Column::ItemId, item_id, &styles.cell)?;
        row += 1;
    }

    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_info_sheet(
    sheet: &mut Worksheet,
    project: &Project,
    styles: &Styles,
) -> std::result::Result<(), XlsxError> {
    sheet.set_name(INFO_SHEET)?;
    let meta = &project.meta;
    let rows = [
        ("Project ID", meta.id.clone()),
        ("Project Number", meta.number.to_string()),
        ("Project Title", meta.title.clone()),
        ("Project URL", meta.url.clone()),
        ("Overall Progress", format!("{}%", meta.progress.value())),
        ("Total Tasks", project.total_tasks().to_string()),
    ];
    for (row, (key, value)) in (0u32..).zip(rows) {
        sheet.write_string_with_format(row, 0, key, &styles.key)?;
        sheet.write_string(row, 1, value)?;
    }
    sheet.set_column_width(0, 20.0)?;
    sheet.set_column_width(1, 50.0)?;
    Ok(())
}

/// A task that [`save`] writes as a root row because its parent has no
/// issue number for the `Parent #` column to point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedRow {
    /// Sheet row number, with the header on row 1
    pub row: u32,
    pub path: TaskPath,
    pub parent: TaskPath,
}

/// Rows whose nesting the workbook cannot record.
pub fn flattened_rows(project: &Project) -> Vec<FlattenedRow> {
    (2u32..)
        .zip(project.walk())
        .filter(|(_, entry)| entry.parent.is_some_and(Task::is_new))
        .map(|(row, entry)| FlattenedRow {
            row,
            parent: entry.path[..entry.path.len() - 1].to_vec(),
            path: entry.path,
        })
        .collect()
}

/// Writes a project as a two-sheet workbook.
///
/// Children of a task without an issue number are stored as root rows and
/// come back as roots on the next [`load`]; see [`flattened_rows`].
pub fn save(path: &Path, project: &Project) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| SyncError::file_system(dir, source))?;
    }

    let styles = Styles::new();
    let mut workbook = Workbook::new();
    write_tasks_sheet(workbook.add_worksheet(), project, &styles)
        .map_err(|e| SyncError::spreadsheet(path, e))?;
    write_info_sheet(workbook.add_worksheet(), project, &styles)
        .map_err(|e| SyncError::spreadsheet(path, e))?;
    workbook
        .save(path)
        .map_err(|e| SyncError::spreadsheet(path, e))?;

    for flattened in flattened_rows(project) {
        if let (Some(task), Some(parent)) = (
            project.task_at(&flattened.path),
            project.task_at(&flattened.parent),
        ) {
            log::warn!(
                "{} row {}: {} is nested under {}, which has no issue number yet; stored as a root row",
                path.display(),
                flattened.row,
                task.reference(),
                parent.reference()
            );
        }
    }

    log::debug!("Wrote {} rows to {}", project.total_tasks(), path.display());
    Ok(())
}

// Reading

static EMPTY: Data = Data::Empty;

/// Converts an Excel serial day number (1900 date system) to a date.
fn serial_to_date(serial: f64) -> Option<Date> {
    let days = serial.floor();
    if !days.is_finite() || days < 1.0 {
        return None;
    }
    let span = Span::new().try_days(days as i64).ok()?;
    date(1899, 12, 30).checked_add(span).ok()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
            text.trim().to_string()
        }
        Data::Int(value) => value.to_string(),
        Data::Float(value) if value.fract() == 0.0 => format!("{}", *value as i64),
        Data::Float(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(value) => serial_to_date(value.as_f64())
            .map(|d| d.to_string())
            .unwrap_or_default(),
        Data::Error(error) => format!("{error:?}"),
    }
}

fn cell_date(cell: &Data) -> std::result::Result<Option<Date>, String> {
    match cell {
        Data::DateTime(value) => serial_to_date(value.as_f64())
            .map(Some)
            .ok_or_else(|| value.as_f64().to_string()),
        Data::Float(value) => serial_to_date(*value)
            .map(Some)
            .ok_or_else(|| value.to_string()),
        Data::Int(value) => serial_to_date(*value as f64)
            .map(Some)
            .ok_or_else(|| value.to_string()),
        Data::DateTimeIso(text) => parse_date(text.get(..10).unwrap_or(text)),
        other => parse_date(&cell_text(other)),
    }
}

/// Parses a non-negative whole number; blank is zero.
fn cell_number(cell: &Data) -> std::result::Result<u64, String> {
    match cell {
        Data::Empty => Ok(0),
        Data::Int(value) => u64::try_from(*value).map_err(|_| value.to_string()),
        Data::Float(value) if value.fract() == 0.0 && *value >= 0.0 => Ok(*value as u64),
        other => {
            let text = cell_text(other);
            if text.is_empty() {
                Ok(0)
            } else {
                text.parse::<u64>().map_err(|_| text)
            }
        }
    }
}

struct Row<'a> {
    cells: &'a [Data],
    columns: &'a HashMap<String, usize>,
}

impl Row<'_> {
    fn get(&self, column: Column) -> &Data {
        self.columns
            .get(column.header())
            .and_then(|index| self.cells.get(*index))
            .unwrap_or(&EMPTY)
    }

    fn text(&self, column: Column) -> String {
        cell_text(self.get(column))
    }

    fn optional(&self, column: Column) -> Option<String> {
        Some(self.text(column)).filter(|text| !text.is_empty())
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| cell_text(cell).is_empty())
    }
}

/// A parsed row waiting to be linked.
struct ArenaEntry {
    location: String,
    task: Option<Task>,
    parent: Option<RemoteId>,
}

fn parse_row(row: &Row<'_>, location: &str, issues: &mut ValidationErrors) -> ArenaEntry {
    let mut task = Task {
        title: row.text(Column::Title),
        assignees: split_set(&row.text(Column::Assignees)),
        labels: split_set(&row.text(Column::Labels)),
        milestone: Derived::new(row.optional(Column::Milestone)),
        url: row.optional(Column::Url),
        node_id: row.optional(Column::NodeId),
        item_id: row.optional(Column::ItemId),
        ..Default::default()
    };
    let mut invalid = Vec::new();

    match cell_number(row.get(Column::Issue)) {
        Ok(number) => task.remote_id = RemoteId(number),
        Err(value) => invalid.push(IssueKind::InvalidValue {
            field: Column::Issue.header().to_string(),
            value,
        }),
    }

    for column in [Column::Start, Column::End] {
        match cell_date(row.get(column)) {
            Ok(value) if column == Column::Start => task.start = value,
            Ok(value) => task.end = value,
            Err(value) => invalid.push(IssueKind::InvalidDate {
                field: column.header().to_string(),
                value,
            }),
        }
    }

    let status = row.text(Column::Status).to_lowercase();
    match status.as_str() {
        "" | "open" => {}
        "closed" => task.closed = true,
        _ => invalid.push(IssueKind::InvalidValue {
            field: Column::Status.header().to_string(),
            value: status.clone(),
        }),
    }

    match cell_number(row.get(Column::Progress)) {
        Ok(value) if value <= 100 => task.progress = Derived::new(value as u8),
        Ok(value) => invalid.push(IssueKind::InvalidValue {
            field: Column::Progress.header().to_string(),
            value: value.to_string(),
        }),
        Err(value) => invalid.push(IssueKind::InvalidValue {
            field: Column::Progress.header().to_string(),
            value,
        }),
    }

    let parent = match cell_number(row.get(Column::Parent)) {
        Ok(number) => RemoteId(number).assigned(),
        Err(value) => {
            invalid.push(IssueKind::InvalidValue {
                field: Column::Parent.header().to_string(),
                value,
            });
            None
        }
    };

    for kind in invalid {
        issues.push(ValidationIssue::new(location, &task, kind));
    }
    ArenaEntry {
        location: location.to_string(),
        task: Some(task),
        parent,
    }
}

/// Links arena entries into a forest. Every parent must sit on an earlier
/// row; offending rows are reported and kept as roots so the remaining
/// checks still see them.
fn link(mut arena: Vec<ArenaEntry>, issues: &mut ValidationErrors) -> Vec<Task> {
    let mut first_row: HashMap<RemoteId, usize> = HashMap::new();
    for (index, entry) in arena.iter().enumerate() {
        if let Some(id) = entry.task.as_ref().and_then(|task| task.remote_id.assigned()) {
            first_row.entry(id).or_insert(index);
        }
    }

    let mut parents: Vec<Option<usize>> = Vec::with_capacity(arena.len());
    for (index, entry) in arena.iter().enumerate() {
        let Some(parent) = entry.parent else {
            parents.push(None);
            continue;
        };
        let kind = match first_row.get(&parent) {
            Some(&row) if row < index => {
                parents.push(Some(row));
                continue;
            }
            Some(_) => IssueKind::ForwardParent { parent },
            None => IssueKind::MissingParent { parent },
        };
        if let Some(task) = entry.task.as_ref() {
            issues.push(ValidationIssue::new(&entry.location, task, kind));
        }
        parents.push(None);
    }

    let mut roots = Vec::new();
    for index in (0..arena.len()).rev() {
        let Some(mut task) = arena[index].task.take() else {
            continue;
        };
        task.subtasks.reverse();
        match parents[index] {
            Some(parent) => {
                if let Some(parent_task) = arena[parent].task.as_mut() {
                    parent_task.subtasks.push(task);
                }
            }
            None => roots.push(task),
        }
    }
    roots.reverse();
    roots
}

fn read_meta(workbook: &mut Xlsx<BufReader<File>>) -> ProjectMeta {
    let mut meta = ProjectMeta::default();
    if !workbook
        .sheet_names()
        .iter()
        .any(|name| name.as_str() == INFO_SHEET)
    {
        return meta;
    }
    let Ok(range) = workbook.worksheet_range(INFO_SHEET) else {
        log::warn!("Could not read the '{INFO_SHEET}' sheet; using empty project metadata");
        return meta;
    };

    for row in range.rows() {
        let key = row.first().map(cell_text).unwrap_or_default();
        let value = row.get(1).unwrap_or(&EMPTY);
        match key.as_str() {
            "Project ID" => meta.id = cell_text(value),
            "Project Number" => meta.number = cell_number(value).unwrap_or(0),
            "Project Title" => meta.title = cell_text(value),
            "Project URL" => meta.url = cell_text(value),
            _ => {}
        }
    }
    meta
}

/// Reads a workbook into a validated project with recomputed progress.
pub fn load(path: &Path) -> Result<Project> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| SyncError::spreadsheet(path, e))?;
    let range = workbook
        .worksheet_range(TASKS_SHEET)
        .map_err(|e| SyncError::spreadsheet(path, format!("sheet '{TASKS_SHEET}': {e}")))?;

    let first_row = range.start().map_or(0, |(row, _)| row);
    let mut rows = range.rows();
    let header = rows.next().unwrap_or(&[]);
    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(index, cell)| (cell_text(cell), index))
        .filter(|(name, _)| !name.is_empty())
        .collect();
    for required in [Column::Issue, Column::Title] {
        if !columns.contains_key(required.header()) {
            return Err(SyncError::spreadsheet(
                path,
                format!("sheet '{TASKS_SHEET}' has no '{}' column", required.header()),
            ));
        }
    }

    let mut issues = ValidationErrors::new();
    let mut arena = Vec::new();
    for (offset, cells) in rows.enumerate() {
        let row = Row {
            cells,
            columns: &columns,
        };
        if row.is_blank() {
            continue;
        }
        // Header is the first sheet row; Excel rows are one-based.
        let location = format!("row {}", first_row as usize + offset + 2);
        arena.push(parse_row(&row, &location, &mut issues));
    }

    let tasks = link(arena, &mut issues);
    check_tree(&tasks, &mut issues);
    issues.into_result()?;

    let meta = read_meta(&mut workbook);
    let mut project = Project::new(meta, tasks);
    progress::recompute(&mut project);
    log::debug!(
        "Read {} tasks from {}",
        project.total_tasks(),
        path.display()
    );
    Ok(project)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use tempfile::TempDir;

    use super::*;

    fn sample_project() -> Project {
        let mut backend = Task::existing(12, "Backend");
        backend.start = Some(date(2026, 1, 5));
        backend.end = Some(date(2026, 2, 27));
        backend.labels = BTreeSet::from(["api".to_string(), "backend".to_string()]);
        backend.milestone = Derived::new(Some("v1".to_string()));
        backend.node_id = Some("I_12".to_string());
        backend.item_id = Some("PVTI_12".to_string());
        backend.url = Some("https://github.com/acme/roadmap/issues/12".to_string());

        let mut schema = Task::existing(13, "Schema");
        schema.closed = true;
        let mut design = Task::existing(14, "Design, API");
        design.assignees = BTreeSet::from(["octocat".to_string(), "hubot".to_string()]);
        design.progress = Derived::new(40);
        design.subtasks.push(Task::new("Draft"));
        backend.subtasks = vec![schema, design];

        let mut project = Project::new(
            ProjectMeta {
                id: "PVT_1".to_string(),
                number: 3,
                title: "Roadmap".to_string(),
                url: "https://github.com/orgs/acme/projects/3".to_string(),
                progress: Derived::default(),
            },
            vec![backend, Task::new("Release")],
        );
        progress::recompute(&mut project);
        project
    }

    /// Writes a raw `Tasks` sheet: `(issue, title, parent)` per row.
    fn write_raw(path: &Path, rows: &[(u64, &str, u64)]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(TASKS_SHEET).unwrap();
        sheet.write_string(0, 0, "Issue #").unwrap();
        sheet.write_string(0, 1, "Title").unwrap();
        sheet.write_string(0, 2, "Parent #").unwrap();
        for (index, (issue, title, parent)) in rows.iter().enumerate() {
            let row = index as u32 + 1;
            sheet.write_number(row, 0, *issue as f64).unwrap();
            sheet.write_string(row, 1, *title).unwrap();
            if *parent != 0 {
                sheet.write_number(row, 2, *parent as f64).unwrap();
            }
        }
        workbook.save(path).unwrap();
    }

    fn validation_errors(error: SyncError) -> ValidationErrors {
        match error {
            SyncError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_save_then_load_preserves_tree() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks.xlsx");
        let project = sample_project();

        save(&path, &project).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded, project);
    }

    #[test]
    fn test_children_of_new_parent_are_stored_as_roots() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks.xlsx");
        let mut parent = Task::new("Migration");
        parent.subtasks.push(Task::existing(21, "Export"));
        parent.subtasks.push(Task::new("Import"));
        let project = Project::new(
            ProjectMeta::default(),
            vec![Task::existing(20, "Backend"), parent],
        );

        let flattened = flattened_rows(&project);
        let rows: Vec<_> = flattened.iter().map(|f| f.row).collect();
        assert_eq!(rows, [4, 5]);
        assert_eq!(flattened[0].path, vec![1, 0]);
        assert_eq!(flattened[0].parent, vec![1]);

        save(&path, &project).unwrap();
        let loaded = load(&path).unwrap();

        let titles: Vec<&str> = loaded.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Backend", "Migration", "Export", "Import"]);
        assert!(loaded.tasks.iter().all(|t| t.subtasks.is_empty()));
        assert_eq!(loaded.tasks[2].remote_id, RemoteId(21));
    }

    #[test]
    fn test_assigned_parents_keep_their_children() {
        assert!(flattened_rows(&sample_project()).is_empty());
    }

    #[test]
    fn test_rows_become_nested_tree() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("raw.xlsx");
        write_raw(
            &path,
            &[(1, "Root", 0), (2, "Child", 1), (3, "Grandchild", 2), (4, "Second", 1)],
        );

        let project = load(&path).unwrap();

        assert_eq!(project.tasks.len(), 1);
        let root = &project.tasks[0];
        let titles: Vec<&str> = root.subtasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Child", "Second"]);
        assert_eq!(root.subtasks[0].subtasks[0].title, "Grandchild");
    }

    #[test]
    fn test_missing_parent_aborts_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("raw.xlsx");
        write_raw(&path, &[(1, "Root", 0), (2, "Orphan", 99)]);

        let errors = validation_errors(load(&path).unwrap_err());

        assert_eq!(errors.len(), 1);
        let issue = errors.iter().next().unwrap();
        assert_eq!(issue.location, "row 3");
        assert_eq!(issue.kind, IssueKind::MissingParent { parent: RemoteId(99) });
        assert!(issue.to_string().contains("missing parent reference"));
    }

    #[test]
    fn test_forward_parent_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("raw.xlsx");
        write_raw(&path, &[(2, "Child", 1), (1, "Root", 0)]);

        let errors = validation_errors(load(&path).unwrap_err());

        assert!(errors.contains(|kind| *kind == IssueKind::ForwardParent { parent: RemoteId(1) }));
    }

    #[test]
    fn test_depth_nine_chain_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("deep.xlsx");
        let rows: Vec<(u64, &str, u64)> = (1..=9).map(|n| (n, "Level", n - 1)).collect();
        write_raw(&path, &rows);

        let errors = validation_errors(load(&path).unwrap_err());

        assert_eq!(errors.len(), 1);
        let issue = errors.iter().next().unwrap();
        assert_eq!(issue.remote_id, RemoteId(9));
        assert!(matches!(issue.kind, IssueKind::TooDeep { .. }));
    }

    #[test]
    fn test_blank_multi_value_cells_are_empty_sets() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("raw.xlsx");
        write_raw(&path, &[(5, "Lonely", 0)]);

        let project = load(&path).unwrap();

        assert!(project.tasks[0].assignees.is_empty());
        assert!(project.tasks[0].labels.is_empty());
        assert_eq!(project.meta, ProjectMeta::default());
    }

    #[test]
    fn test_missing_title_column_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(TASKS_SHEET).unwrap();
        sheet.write_string(0, 0, "Issue #").unwrap();
        workbook.save(&path).unwrap();

        let error = load(&path).unwrap_err();
        assert!(matches!(error, SyncError::Spreadsheet { .. }));
        assert!(error.to_string().contains("'Title'"));
    }

    #[test]
    fn test_serial_dates() {
        assert_eq!(serial_to_date(46042.0), Some(date(2026, 1, 20)));
        assert_eq!(serial_to_date(0.0), None);
    }
}
