//! Task discovery in a bundle's `tasks` directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::DiscoveryError;
use crate::patterns::is_log_file;
use crate::task::{parse_task_dir_name, Task};

/// Name of the bundle subdirectory holding one directory per task.
pub const TASKS_DIR_NAME: &str = "tasks";

/// Path of the `tasks` directory inside a bundle.
pub fn tasks_dir(bundle_root: &Path) -> PathBuf {
    bundle_root.join(TASKS_DIR_NAME)
}

/// Find and parse every task directory of a bundle, sorted by directory name.
///
/// Unparseable directory names are logged as warnings and skipped. Fails if
/// the `tasks` directory cannot be listed or if no entry could be parsed.
pub fn find_tasks(bundle_root: &Path) -> Result<Vec<Task>, DiscoveryError> {
    let root = absolute(bundle_root);
    let tasks_dir = tasks_dir(&root);

    let entries =
        fs::read_dir(&tasks_dir).map_err(|e| DiscoveryError::TasksDirUnreadable {
            path: tasks_dir.clone(),
            source: e,
        })?;

    let dir_names = task_dir_names(&tasks_dir, entries.map(|e| e.map(|e| e.path())));

    let mut tasks = Vec::with_capacity(dir_names.len());
    for dir_name in dir_names {
        let task = match parse_task_dir_name(&dir_name) {
            Ok(task) => task,
            Err(e) => {
                warn!(
                    "cannot parse the directory name \"{}\". If you know that this directory \
                     was created by the service diagnostics bundle tool, please report it: {}",
                    dir_name, e
                );
                continue;
            }
        };
        let abs = tasks_dir.join(&dir_name);
        let has_logs = has_logs(&abs);
        debug!("found task {} ({}), has logs: {}", task.name(), task.id(), has_logs);
        tasks.push(task.located(abs, has_logs));
    }

    if tasks.is_empty() {
        return Err(DiscoveryError::NoRecognizableTasks { path: tasks_dir });
    }

    info!("Discovered {} tasks in {}", tasks.len(), tasks_dir.display());
    Ok(tasks)
}

/// Sorted names of the directories among `entries`. Entries that cannot be
/// read or whose name is not UTF-8 are logged and skipped.
fn task_dir_names<I>(tasks_dir: &Path, entries: I) -> Vec<String>
where
    I: IntoIterator<Item = io::Result<PathBuf>>,
{
    let mut dir_names = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("cannot read an entry of {}: {}", tasks_dir.display(), e);
                continue;
            }
        };
        // Symlinked task directories count as directories.
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        match name.to_os_string().into_string() {
            Ok(name) => dir_names.push(name),
            Err(raw) => warn!(
                "cannot parse the directory name {:?} in {}: not valid UTF-8",
                raw,
                tasks_dir.display()
            ),
        }
    }
    dir_names.sort();
    dir_names
}

/// Whether any recognized log fragment or merged log exists under `task_dir`.
///
/// The walk is lazy and stops at the first match. Unreadable entries are
/// logged and skipped.
pub fn has_logs(task_dir: &Path) -> bool {
    WalkDir::new(task_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("cannot walk into path under {}: {}", task_dir.display(), e);
                None
            }
        })
        .filter(|e| !e.file_type().is_dir())
        .any(|e| e.file_name().to_str().is_some_and(is_log_file))
}

fn absolute(path: &Path) -> PathBuf {
    match std::path::absolute(path) {
        Ok(p) => p,
        Err(e) => {
            debug!("cannot resolve {} to an absolute path: {}", path.display(), e);
            path.to_path_buf()
        }
    }
}
