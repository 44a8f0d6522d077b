//! Visual states of scheduled tasks.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::task::Task;

/// How a task is drawn on the chart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VisualState {
    /// Not started
    #[default]
    Normal,

    /// Some progress recorded
    Active,

    /// Closed
    Done,

    /// Highlighted as critical. Nothing derives this state yet; it is kept
    /// so a future rule (for example overdue or blocking tasks) can set it
    /// without touching the renderers.
    Critical,
}

impl VisualState {
    /// Derives the state of a task: closed is done, any progress is active.
    pub fn of(task: &Task) -> Self {
        if task.closed {
            VisualState::Done
        } else if task.progress.value() > 0 {
            VisualState::Active
        } else {
            VisualState::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualState::Normal => "normal",
            VisualState::Active => "active",
            VisualState::Done => "done",
            VisualState::Critical => "crit",
        }
    }

    /// Tag prefix used by Mermaid task lines.
    pub fn mermaid_tag(&self) -> &'static str {
        match self {
            VisualState::Normal => "",
            VisualState::Active => "active, ",
            VisualState::Done => "done, ",
            VisualState::Critical => "crit, ",
        }
    }

    /// Short label for tables.
    pub fn label(&self) -> &'static str {
        match self {
            VisualState::Normal => "Open",
            VisualState::Active => "Active",
            VisualState::Done => "Done",
            VisualState::Critical => "Critical",
        }
    }
}

impl FromStr for VisualState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" | "open" => Ok(VisualState::Normal),
            "active" => Ok(VisualState::Active),
            "done" | "closed" => Ok(VisualState::Done),
            "crit" | "critical" => Ok(VisualState::Critical),
            _ => Err(format!("Invalid visual state: {s}")),
        }
    }
}

/// Remote date field addressed by a date update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DateField {
    Start,
    End,
}

impl DateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateField::Start => "start",
            DateField::End => "end",
        }
    }
}
