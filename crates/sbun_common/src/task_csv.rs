//! Task list in CSV form.
//!
//! Columns: task name, starting, running, killed, failed, task ID, has logs,
//! task directory name. Absent timestamps are written as `N/A`.

use std::io::Write;

use crate::error::AdapterError;
use crate::task::{format_timestamp, Task};

/// Header names, in column order. Not written by [`write_task_csv`].
pub const CSV_COLUMNS: [&str; 8] = [
    "name", "starting", "running", "killed", "failed", "id", "has_logs", "dir_name",
];

/// One CSV record for a task.
pub fn task_csv_row(task: &Task) -> [String; 8] {
    [
        task.name().to_string(),
        format_timestamp(task.starting()),
        format_timestamp(task.running()),
        format_timestamp(task.killed()),
        format_timestamp(task.failed()),
        task.id().to_string(),
        task.has_logs().to_string(),
        task.dir_name().to_string(),
    ]
}

/// Write one record per task, without a header line.
pub fn write_task_csv<W: Write>(tasks: &[Task], writer: W) -> Result<(), AdapterError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    for task in tasks {
        wtr.write_record(task_csv_row(task))?;
    }
    wtr.flush().map_err(|e| AdapterError::Csv(e.into()))
}
