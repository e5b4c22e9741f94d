//! Discovery and ordering of rotated log fragments.
//!
//! `stdout` (or `stdout.gz`) is the live file, `stdout.N[.gz]` are older
//! rotations: the larger `N`, the older the content. Sorting by rotation
//! number descending yields chronological append order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::patterns::LogStream;

/// Rotation number of a fragment file name. `stdout.1.gz` is 1, `stdout.gz`
/// is 0.
///
/// # Panics
///
/// Panics if `file_name` is not a fragment of `stream`; callers only pass
/// names that went through [`filter_paths_by_file_name`].
pub fn file_number(file_name: &str, stream: LogStream) -> u64 {
    stream
        .rotation(file_name)
        .unwrap_or_else(|| panic!("expected only matching files, got {}", file_name))
}

/// Keep the paths whose file name is a fragment of `stream`, preserving
/// their relative order.
pub fn filter_paths_by_file_name<P: AsRef<Path>>(paths: &[P], stream: LogStream) -> Vec<PathBuf> {
    paths
        .iter()
        .map(|p| -> &Path { p.as_ref() })
        .filter(|p| base_name(p).is_some_and(|n| stream.matches(n)))
        .map(Path::to_path_buf)
        .collect()
}

/// Sort fragment paths oldest first: rotation number descending, a
/// suffix-less fragment counting as 0. Ties are ordered by file name.
pub fn sort_paths_by_rotation(paths: &mut [PathBuf], stream: LogStream) {
    paths.sort_by_cached_key(|p| {
        let name = base_name(p).unwrap_or_default();
        (std::cmp::Reverse(file_number(name, stream)), name.to_string())
    });
}

/// List the fragments of `stream` directly inside `dir` (no recursion), in
/// chronological order.
pub fn list_fragments(dir: &Path, stream: LogStream) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        paths.push(entry.path());
    }
    let mut fragments = filter_paths_by_file_name(&paths, stream);
    sort_paths_by_rotation(&mut fragments, stream);
    Ok(fragments)
}

fn base_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}
