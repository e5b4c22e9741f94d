//! Error types for bundle analysis.
//!
//! Two severities: structural failures abort their scope (discovery, or one
//! directory's concatenation), per-entry anomalies are collected and reported
//! alongside sibling results.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A task directory name that does not follow the naming grammar.
#[derive(Error, Debug)]
pub enum TaskParseError {
    #[error("cannot parse ID and name for task: {dir_name}")]
    MissingIdentity { dir_name: String },

    #[error("cannot parse statuses for task: {dir_name}")]
    MissingStatus { dir_name: String },

    #[error("invalid {status} timestamp \"{value}\" in task directory {dir_name}: {source}")]
    InvalidTimestamp {
        dir_name: String,
        status: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Failure to discover tasks in a bundle.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("cannot list files in the \"{}\" directory: {source}", .path.display())]
    TasksDirUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("\"{}\" directory doesn't contain recognizable task directories", .path.display())]
    NoRecognizableTasks { path: PathBuf },
}

/// Failures raised while closing a compressed writer layered over a file.
///
/// Both layers are always closed; neither failure masks the other.
#[derive(Debug, Default)]
pub struct CloseError {
    pub encoder: Option<io::Error>,
    pub file: Option<io::Error>,
}

impl CloseError {
    pub fn is_empty(&self) -> bool {
        self.encoder.is_none() && self.file.is_none()
    }
}

impl fmt::Display for CloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(2);
        if let Some(e) = &self.encoder {
            parts.push(format!("cannot finish compressed stream: {}", e));
        }
        if let Some(e) = &self.file {
            parts.push(format!("cannot close parent file: {}", e));
        }
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for CloseError {}

/// A fragment that could not be removed after a successful merge.
#[derive(Debug)]
pub struct RemoveFailure {
    pub path: PathBuf,
    pub source: io::Error,
}

impl fmt::Display for RemoveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.source)
    }
}

/// Failure of a single stream (stdout or stderr) in a single directory.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("cannot read dir {} while concatenating: {source}", .dir.display())]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create file {} while concatenating: {source}", .path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot open input file {} while concatenating: {source}", .path.display())]
    OpenFragment {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot copy bytes from {} while concatenating: {source}", .path.display())]
    CopyFragment {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot close {}: {source}", .path.display())]
    CloseOutput {
        path: PathBuf,
        #[source]
        source: CloseError,
    },

    #[error("cannot remove files: {}", join_display(.failures))]
    Cleanup { failures: Vec<RemoveFailure> },
}

/// All stream failures for one log directory.
#[derive(Debug)]
pub struct DirectoryFailure {
    pub dir: PathBuf,
    pub errors: Vec<StreamError>,
}

impl fmt::Display for DirectoryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "errors when concatenating stderr and stdout logs in dir {}: {}",
            self.dir.display(),
            join_display(&self.errors)
        )
    }
}

/// Aggregate result of a failed concatenation run.
#[derive(Error, Debug)]
pub enum ConcatError {
    #[error("cannot parse tasks when concatenating: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("errors occurred when concatenating: {}", join_display(.0))]
    Directories(Vec<DirectoryFailure>),
}

impl ConcatError {
    /// Directories that failed, empty for a discovery failure.
    pub fn failed_dirs(&self) -> Vec<&PathBuf> {
        match self {
            ConcatError::Discovery(_) => Vec::new(),
            ConcatError::Directories(failures) => failures.iter().map(|f| &f.dir).collect(),
        }
    }
}

/// Errors from the CSV and tasks-with-logs adapters.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("cannot write to the CSV output: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid tasks_with_logs directory name \"{name}\": expected a single directory name other than \"tasks\"")]
    InvalidLinkDirName { name: String },

    #[error("cannot remove directory {}: {source}", .path.display())]
    RemoveLinkDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create directory {}: {source}", .path.display())]
    CreateLinkDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create links: {}", join_display(.0))]
    Links(Vec<LinkFailure>),
}

/// A symlink that could not be created.
#[derive(Debug)]
pub struct LinkFailure {
    pub link: PathBuf,
    pub source: io::Error,
}

impl fmt::Display for LinkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.link.display(), self.source)
    }
}

/// Configuration file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

fn join_display<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
