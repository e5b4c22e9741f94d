//! `tasks_with_logs` view: a directory of symlinks to the tasks that have
//! logs.

use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use crate::discovery::TASKS_DIR_NAME;
use crate::error::{AdapterError, LinkFailure};
use crate::task::Task;

/// Name of the directory holding the links.
pub const TASKS_WITH_LOGS_DIR_NAME: &str = "tasks_with_logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReport {
    pub dir: PathBuf,
    pub linked: usize,
}

/// Recreate the `tasks_with_logs` directory and link every task with logs
/// into it.
///
/// By default the directory is created inside the bundle and the links are
/// relative (`../tasks/<dir>`), so the bundle can be moved. With `save_to`
/// the directory is created there and the links are absolute.
///
/// `dir_name` must be a single plain path component other than `tasks`;
/// anything else is rejected before the directory is removed.
pub fn link_tasks_with_logs(
    bundle_root: &Path,
    tasks: &[Task],
    save_to: Option<&Path>,
    dir_name: &str,
) -> Result<LinkReport, AdapterError> {
    validate_link_dir_name(dir_name)?;
    let link_dir = save_to.unwrap_or(bundle_root).join(dir_name);

    match fs::remove_dir_all(&link_dir) {
        Ok(()) => debug!("removed previous {}", link_dir.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(AdapterError::RemoveLinkDir {
                path: link_dir,
                source: e,
            })
        }
    }
    fs::create_dir_all(&link_dir).map_err(|e| AdapterError::CreateLinkDir {
        path: link_dir.clone(),
        source: e,
    })?;

    let mut linked = 0;
    let mut failures = Vec::new();
    for task in tasks.iter().filter(|t| t.has_logs()) {
        let target = match save_to {
            Some(_) => task.dir_name_absolute().to_path_buf(),
            None => Path::new("..").join(TASKS_DIR_NAME).join(task.dir_name()),
        };
        let link = link_dir.join(task.dir_name());
        match symlink(&target, &link) {
            Ok(()) => linked += 1,
            Err(e) => failures.push(LinkFailure { link, source: e }),
        }
    }

    if !failures.is_empty() {
        return Err(AdapterError::Links(failures));
    }

    info!("Linked {} tasks with logs into {}", linked, link_dir.display());
    Ok(LinkReport {
        dir: link_dir,
        linked,
    })
}

fn validate_link_dir_name(dir_name: &str) -> Result<(), AdapterError> {
    let mut components = Path::new(dir_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name != TASKS_DIR_NAME => Ok(()),
        _ => Err(AdapterError::InvalidLinkDirName {
            name: dir_name.to_string(),
        }),
    }
}
