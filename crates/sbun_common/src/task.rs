//! Task records decoded from bundle directory names.
//!
//! A task directory name carries one or more `<status>_<timestamp>` markers
//! joined by `-`, followed by `__<name>__<id>`:
//!
//! ```text
//! starting_20200416T110149-running_20200416T112050__kafka-2-broker__06e119a6-b6bb-4dae-8229-799cdf54c752
//! ```

use chrono::NaiveDateTime;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::TaskParseError;
use crate::patterns::{TASK_ID_PATTERN, TASK_STATUS_PATTERN};

/// Layout of status timestamps: local wall-clock, no offset.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Rendering of an absent timestamp in reports.
pub const ABSENT_TIMESTAMP: &str = "N/A";

/// Lifecycle status recorded in a task directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskStatus {
    Starting,
    Running,
    Killed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Starting => "starting",
            TaskStatus::Running => "running",
            TaskStatus::Killed => "killed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Killed | TaskStatus::Failed)
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starting" => Ok(TaskStatus::Starting),
            "running" => Ok(TaskStatus::Running),
            "killed" => Ok(TaskStatus::Killed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(format!("unknown task status: {}", other)),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One task found in a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: String,
    name: String,
    dir_name: String,
    dir_name_absolute: PathBuf,
    starting: Option<NaiveDateTime>,
    running: Option<NaiveDateTime>,
    killed: Option<NaiveDateTime>,
    failed: Option<NaiveDateTime>,
    has_logs: bool,
}

impl Task {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory name as found under the bundle's `tasks` directory.
    pub fn dir_name(&self) -> &str {
        &self.dir_name
    }

    /// Resolved path of the task directory. Empty until the task is located
    /// inside a bundle by discovery.
    pub fn dir_name_absolute(&self) -> &Path {
        &self.dir_name_absolute
    }

    pub fn starting(&self) -> Option<NaiveDateTime> {
        self.starting
    }

    pub fn running(&self) -> Option<NaiveDateTime> {
        self.running
    }

    pub fn killed(&self) -> Option<NaiveDateTime> {
        self.killed
    }

    pub fn failed(&self) -> Option<NaiveDateTime> {
        self.failed
    }

    pub fn has_logs(&self) -> bool {
        self.has_logs
    }

    /// Timestamp recorded for `status`, if any.
    pub fn status_time(&self, status: TaskStatus) -> Option<NaiveDateTime> {
        match status {
            TaskStatus::Starting => self.starting,
            TaskStatus::Running => self.running,
            TaskStatus::Killed => self.killed,
            TaskStatus::Failed => self.failed,
        }
    }

    /// True when the task was killed or has failed.
    pub fn is_terminal(&self) -> bool {
        self.killed.is_some() || self.failed.is_some()
    }

    /// Status with the latest timestamp. Ties go to the later lifecycle stage.
    pub fn latest_status(&self) -> Option<TaskStatus> {
        [
            TaskStatus::Starting,
            TaskStatus::Running,
            TaskStatus::Killed,
            TaskStatus::Failed,
        ]
        .into_iter()
        .filter_map(|s| self.status_time(s).map(|t| (t, s)))
        .max()
        .map(|(_, s)| s)
    }

    pub(crate) fn located(mut self, dir_name_absolute: PathBuf, has_logs: bool) -> Self {
        self.dir_name_absolute = dir_name_absolute;
        self.has_logs = has_logs;
        self
    }

    fn set_status(&mut self, status: TaskStatus, time: NaiveDateTime) {
        let slot = match status {
            TaskStatus::Starting => &mut self.starting,
            TaskStatus::Running => &mut self.running,
            TaskStatus::Killed => &mut self.killed,
            TaskStatus::Failed => &mut self.failed,
        };
        *slot = Some(time);
    }
}

/// Decode a task from its directory name.
///
/// The identity is the trailing `__<name>__<id>`; statuses are every
/// `<status>_<timestamp>` found anywhere in the name, in any order. A
/// repeated status keeps its last occurrence.
pub fn parse_task_dir_name(dir_name: &str) -> Result<Task, TaskParseError> {
    let id_tokens =
        TASK_ID_PATTERN
            .captures(dir_name)
            .ok_or_else(|| TaskParseError::MissingIdentity {
                dir_name: dir_name.to_string(),
            })?;

    let mut task = Task {
        id: id_tokens[2].to_string(),
        name: id_tokens[1].to_string(),
        dir_name: dir_name.to_string(),
        dir_name_absolute: PathBuf::new(),
        starting: None,
        running: None,
        killed: None,
        failed: None,
        has_logs: false,
    };

    let mut found = false;
    for token in TASK_STATUS_PATTERN.captures_iter(dir_name) {
        found = true;
        let status: TaskStatus = token[1]
            .parse()
            .expect("status pattern only captures known statuses");
        let time = NaiveDateTime::parse_from_str(&token[2], TIMESTAMP_FORMAT).map_err(|e| {
            TaskParseError::InvalidTimestamp {
                dir_name: dir_name.to_string(),
                status: status.to_string(),
                value: token[2].to_string(),
                source: e,
            }
        })?;
        task.set_status(status, time);
    }

    if !found {
        return Err(TaskParseError::MissingStatus {
            dir_name: dir_name.to_string(),
        });
    }

    Ok(task)
}

/// Render an optional timestamp for reports, `N/A` when absent.
pub fn format_timestamp(time: Option<NaiveDateTime>) -> String {
    match time {
        Some(t) => t.to_string(),
        None => ABSENT_TIMESTAMP.to_string(),
    }
}
