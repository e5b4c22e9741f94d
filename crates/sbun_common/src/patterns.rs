//! Fixed naming patterns for task directories and log files.
//!
//! Compiled once on first use and shared read-only.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Compressed file extension used by rotated fragments and merged output.
pub const GZ_EXTENSION: &str = "gz";

// starting_20200416T110149-running_20200416T112050-killed_20200416T114052__kafka-2-broker__06e119a6-b6bb-4dae-8229-799cdf54c752
pub(crate) static TASK_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__(.+)__(.+)$").expect("task ID pattern is valid"));

pub(crate) static TASK_STATUS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(failed|starting|running|killed)_([0-9]{8}T[0-9]{6})")
        .expect("task status pattern is valid")
});

// stdout.1.gz, stdout.gz, stdout, stdout.1
static STDOUT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^stdout(\.[0-9]+)?(\.gz)?$").expect("stdout pattern is valid")
});

static STDERR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^stderr(\.[0-9]+)?(\.gz)?$").expect("stderr pattern is valid")
});

// stdout_all, stderr_all, stdout_all.gz, stderr_all.gz
static MERGED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(stderr|stdout)_all(\.gz)?$").expect("merged log pattern is valid")
});

/// One of the two captured output streams of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl LogStream {
    pub const ALL: [LogStream; 2] = [LogStream::Stdout, LogStream::Stderr];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogStream::Stdout => "stdout",
            LogStream::Stderr => "stderr",
        }
    }

    /// Base name of the merged output, without the compressed extension.
    pub fn merged_name(&self) -> &'static str {
        match self {
            LogStream::Stdout => "stdout_all",
            LogStream::Stderr => "stderr_all",
        }
    }

    pub(crate) fn pattern(&self) -> &'static Regex {
        match self {
            LogStream::Stdout => &*STDOUT_PATTERN,
            LogStream::Stderr => &*STDERR_PATTERN,
        }
    }

    /// Whether `file_name` is a rotated fragment of this stream.
    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern().is_match(file_name)
    }

    /// Rotation number of a fragment name, `None` if the name is not a
    /// fragment of this stream. A name without a numeric suffix is rotation 0.
    pub fn rotation(&self, file_name: &str) -> Option<u64> {
        let caps = self.pattern().captures(file_name)?;
        match caps.get(1) {
            None => Some(0),
            // Only digits reach here, so a failed parse is an overflow:
            // such a fragment is older than anything else.
            Some(m) => Some(m.as_str()[1..].parse().unwrap_or(u64::MAX)),
        }
    }
}

impl fmt::Display for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `file_name` is an already merged `stdout_all`/`stderr_all` file.
pub fn is_merged_log(file_name: &str) -> bool {
    MERGED_PATTERN.is_match(file_name)
}

/// Whether `file_name` is any recognized log file: a fragment of either
/// stream, or a merged output.
pub fn is_log_file(file_name: &str) -> bool {
    LogStream::ALL.iter().any(|s| s.matches(file_name)) || is_merged_log(file_name)
}

/// Whether a file name carries the compressed extension.
pub fn is_compressed(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext == GZ_EXTENSION)
}
