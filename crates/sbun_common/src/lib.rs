//! SBun Common - task discovery and log normalization for service
//! diagnostics bundles.
//!
//! A bundle holds a `tasks` directory with one directory per task; the
//! directory name encodes the task's lifecycle timestamps, name and ID, and
//! the directory holds rotated stdout/stderr fragments.

pub mod concat;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fragments;
pub mod links;
pub mod patterns;
pub mod stream;
pub mod task;
pub mod task_csv;

pub use concat::{concatenate_logs, ConcatReport, MergedStream, StreamOutcome};
pub use config::SbunConfig;
pub use discovery::{find_tasks, has_logs};
pub use error::{AdapterError, ConcatError, ConfigError, DiscoveryError, TaskParseError};
pub use patterns::LogStream;
pub use task::{parse_task_dir_name, Task, TaskStatus};
