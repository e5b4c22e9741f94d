//! Log concatenation: merge rotated fragments into `stdout_all` and
//! `stderr_all`, then delete the fragments.
//!
//! Every task directory is processed together with its `task` and `executor`
//! subdirectories. Failures are collected per directory and never stop the
//! remaining directories from being processed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::discovery::find_tasks;
use crate::error::{ConcatError, DirectoryFailure, RemoveFailure, StreamError};
use crate::fragments::list_fragments;
use crate::patterns::LogStream;
use crate::stream::{merged_path, FragmentReader, MergedWriter};

/// Subdirectory of a task directory holding the task's own logs.
pub const TASK_LOG_DIR_NAME: &str = "task";

/// Subdirectory of a task directory holding the executor's logs.
pub const EXECUTOR_LOG_DIR_NAME: &str = "executor";

/// One stream merged in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedStream {
    pub dir: PathBuf,
    pub stream: LogStream,
    pub output: PathBuf,
    pub fragments: usize,
    pub bytes: u64,
}

/// What happened to one stream in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// No fragment of the stream exists; nothing was written.
    NoFragments,
    Merged(MergedStream),
}

/// Summary of a successful concatenation run.
#[derive(Debug, Clone, Default)]
pub struct ConcatReport {
    pub tasks: usize,
    pub dirs_scanned: usize,
    pub merged: Vec<MergedStream>,
}

/// Concatenate the logs of every task in the bundle.
///
/// Returns an aggregate error naming every directory that failed; streams
/// merged in other directories stay merged.
pub fn concatenate_logs(bundle_root: &Path, compress: bool) -> Result<ConcatReport, ConcatError> {
    let tasks = find_tasks(bundle_root)?;

    let mut report = ConcatReport {
        tasks: tasks.len(),
        ..Default::default()
    };
    let mut failures = Vec::new();

    for task in &tasks {
        for dir in log_dirs(task.dir_name_absolute()) {
            report.dirs_scanned += 1;
            let mut errors = Vec::new();
            for stream in LogStream::ALL {
                match concat_stream(&dir, stream, compress) {
                    Ok(StreamOutcome::Merged(merged)) => report.merged.push(merged),
                    Ok(StreamOutcome::NoFragments) => {}
                    Err(e) => {
                        warn!("{}", e);
                        errors.push(e);
                    }
                }
            }
            if !errors.is_empty() {
                failures.push(DirectoryFailure { dir, errors });
            }
        }
    }

    if !failures.is_empty() {
        return Err(ConcatError::Directories(failures));
    }

    info!(
        "Concatenated {} streams across {} directories of {} tasks",
        report.merged.len(),
        report.dirs_scanned,
        report.tasks
    );
    Ok(report)
}

/// Existing log directories of a task: the task directory itself, then its
/// `task` and `executor` subdirectories.
pub fn log_dirs(task_dir: &Path) -> Vec<PathBuf> {
    [None, Some(TASK_LOG_DIR_NAME), Some(EXECUTOR_LOG_DIR_NAME)]
        .into_iter()
        .map(|sub| match sub {
            Some(name) => task_dir.join(name),
            None => task_dir.to_path_buf(),
        })
        .filter(|dir| dir.is_dir())
        .collect()
}

/// Merge all fragments of `stream` in `dir` into its merged output and
/// delete them.
///
/// If merging fails, the partial output is removed and the fragments are left
/// untouched. If deleting fragments fails, the merged output is kept and the
/// undeletable fragments are reported.
pub fn concat_stream(
    dir: &Path,
    stream: LogStream,
    compress: bool,
) -> Result<StreamOutcome, StreamError> {
    let fragments = list_fragments(dir, stream).map_err(|e| StreamError::ReadDir {
        dir: dir.to_path_buf(),
        source: e,
    })?;
    if fragments.is_empty() {
        debug!("no {} fragments in {}", stream, dir.display());
        return Ok(StreamOutcome::NoFragments);
    }

    let out =
        MergedWriter::create(dir, stream, compress).map_err(|e| StreamError::CreateOutput {
            path: merged_path(dir, stream, compress),
            source: e,
        })?;

    let (output, bytes) = merge_fragments(&fragments, out)?;

    debug!(
        "merged {} {} fragments ({} bytes) into {}",
        fragments.len(),
        stream,
        bytes,
        output.display()
    );

    remove_files(&fragments)?;

    Ok(StreamOutcome::Merged(MergedStream {
        dir: dir.to_path_buf(),
        stream,
        output,
        fragments: fragments.len(),
        bytes,
    }))
}

/// Copy `fragments` into `out` and close it. On failure the partial output
/// is removed.
fn merge_fragments(
    fragments: &[PathBuf],
    mut out: MergedWriter,
) -> Result<(PathBuf, u64), StreamError> {
    let bytes = match copy_fragments(fragments, &mut out) {
        Ok(n) => n,
        Err(e) => {
            let partial = out.path().to_path_buf();
            drop(out);
            discard_partial(&partial);
            return Err(e);
        }
    };

    let output = out.finish().map_err(|(path, source)| {
        discard_partial(&path);
        StreamError::CloseOutput { path, source }
    })?;
    Ok((output, bytes))
}

fn copy_fragments(paths: &[PathBuf], out: &mut MergedWriter) -> Result<u64, StreamError> {
    let mut total = 0;
    for path in paths {
        let mut reader = FragmentReader::open(path).map_err(|e| StreamError::OpenFragment {
            path: path.clone(),
            source: e,
        })?;
        total += io::copy(&mut reader, out).map_err(|e| StreamError::CopyFragment {
            path: path.clone(),
            source: e,
        })?;
    }
    Ok(total)
}

fn remove_files(paths: &[PathBuf]) -> Result<(), StreamError> {
    let failures: Vec<RemoveFailure> = paths
        .iter()
        .filter_map(|path| {
            fs::remove_file(path).err().map(|e| RemoveFailure {
                path: path.clone(),
                source: e,
            })
        })
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(StreamError::Cleanup { failures })
    }
}

fn discard_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("cannot remove partial output {}: {}", path.display(), e);
    }
}
