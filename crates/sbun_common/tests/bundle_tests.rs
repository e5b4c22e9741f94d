//! End-to-end tests over on-disk bundles.

use chrono::{NaiveDate, NaiveDateTime};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sbun_common::links::link_tasks_with_logs;
use sbun_common::*;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};
use tracing_subscriber::fmt::writer::MakeWriter;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

/// Build a task directory name from its parts.
fn dir_name(statuses: &[(TaskStatus, NaiveDateTime)], name: &str, id: &str) -> String {
    let markers: Vec<String> = statuses
        .iter()
        .map(|(s, t)| format!("{}_{}", s, t.format("%Y%m%dT%H%M%S")))
        .collect();
    format!("{}__{}__{}", markers.join("-"), name, id)
}

fn bundle_with(dirs: &[&str]) -> TempDir {
    let bundle = tempdir().unwrap();
    for d in dirs {
        fs::create_dir_all(bundle.path().join("tasks").join(d)).unwrap();
    }
    bundle
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(bytes).unwrap();
    enc.finish().unwrap()
}

fn gunzip(path: &Path) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(fs::File::open(path).unwrap())
        .read_to_end(&mut out)
        .unwrap();
    out
}

/// In-memory sink for formatted log events.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with every log event at WARN or above captured.
fn with_captured_warnings<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let lines = logs.text().lines().map(str::to_string).collect();
    (result, lines)
}

const KAFKA: &str = "starting_20200416T110149-running_20200416T112050-killed_20200416T114052__kafka-2-broker__06e119a6-b6bb-4dae-8229-799cdf54c752";
const WEB: &str = "starting_20200417T080000-running_20200417T080105__web__1f2e";

#[test]
fn test_build_then_parse_round_trips() {
    let cases = vec![
        (
            vec![(TaskStatus::Starting, at(2020, 4, 16, 11, 1, 49))],
            "kafka-0-broker",
            "a1b2",
        ),
        (
            vec![
                (TaskStatus::Running, at(2021, 12, 31, 23, 59, 59)),
                (TaskStatus::Starting, at(2021, 12, 31, 23, 58, 0)),
                (TaskStatus::Failed, at(2022, 1, 1, 0, 0, 0)),
            ],
            "node-3-server",
            "06e119a6-b6bb-4dae-8229-799cdf54c752",
        ),
        (
            vec![
                (TaskStatus::Starting, at(2019, 2, 28, 1, 2, 3)),
                (TaskStatus::Running, at(2019, 2, 28, 1, 2, 4)),
                (TaskStatus::Killed, at(2019, 3, 1, 0, 0, 0)),
                (TaskStatus::Failed, at(2019, 3, 1, 0, 0, 1)),
            ],
            "x",
            "y",
        ),
    ];

    for (statuses, name, id) in cases {
        let built = dir_name(&statuses, name, id);
        let task = parse_task_dir_name(&built).unwrap();
        assert_eq!(task.name(), name);
        assert_eq!(task.id(), id);
        assert_eq!(task.dir_name(), built);
        for (status, time) in &statuses {
            assert_eq!(task.status_time(*status), Some(*time), "{} in {}", status, built);
        }
    }
}

#[test]
fn test_find_tasks_skips_malformed_entries() {
    let bundle = bundle_with(&[KAFKA, WEB, "not-a-task-dir"]);
    fs::write(bundle.path().join("tasks").join("README"), "x").unwrap();

    let (tasks, warnings) = with_captured_warnings(|| find_tasks(bundle.path()));
    let tasks = tasks.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(warnings.len(), 1, "{:?}", warnings);
    assert!(warnings[0].contains("WARN"));
    assert!(warnings[0].contains("not-a-task-dir"));
    assert_eq!(tasks[0].name(), "kafka-2-broker");
    assert_eq!(tasks[1].name(), "web");
    for task in &tasks {
        assert!(task.dir_name_absolute().is_absolute());
        assert!(task.dir_name_absolute().ends_with(Path::new("tasks").join(task.dir_name())));
        assert!(!task.has_logs());
    }
}

#[test]
fn test_find_tasks_only_malformed_is_an_error() {
    let bundle = bundle_with(&["garbage", "__only__identity"]);
    let err = find_tasks(bundle.path()).unwrap_err();
    assert!(matches!(err, DiscoveryError::NoRecognizableTasks { .. }));
}

#[test]
fn test_find_tasks_empty_tasks_dir_is_an_error() {
    let bundle = bundle_with(&[]);
    fs::create_dir_all(bundle.path().join("tasks")).unwrap();
    let err = find_tasks(bundle.path()).unwrap_err();
    assert!(matches!(err, DiscoveryError::NoRecognizableTasks { .. }));
}

#[test]
fn test_find_tasks_detects_logs() {
    let bundle = bundle_with(&[KAFKA, WEB]);
    let executor = bundle.path().join("tasks").join(WEB).join("executor");
    fs::create_dir_all(&executor).unwrap();
    fs::write(executor.join("stdout.1"), "x").unwrap();

    let tasks = find_tasks(bundle.path()).unwrap();
    let web = tasks.iter().find(|t| t.name() == "web").unwrap();
    let kafka = tasks.iter().find(|t| t.name() == "kafka-2-broker").unwrap();
    assert!(web.has_logs());
    assert!(!kafka.has_logs());
}

#[test]
fn test_concatenate_preserves_content_compressed() {
    let bundle = bundle_with(&[KAFKA]);
    let task_dir = bundle.path().join("tasks").join(KAFKA);
    fs::write(task_dir.join("stdout.123"), b"a-oldest\n").unwrap();
    fs::write(task_dir.join("stdout.4.gz"), gzip(b"b\n")).unwrap();
    fs::write(task_dir.join("stdout.2.gz"), gzip(b"c\n")).unwrap();
    fs::write(task_dir.join("stdout.1"), b"d\n").unwrap();
    fs::write(task_dir.join("stdout"), b"e-newest\n").unwrap();
    fs::write(task_dir.join("unexpected_file"), b"keep").unwrap();

    let report = concatenate_logs(bundle.path(), true).unwrap();
    assert_eq!(report.tasks, 1);
    assert_eq!(report.merged.len(), 1);
    assert_eq!(report.merged[0].stream, LogStream::Stdout);
    assert_eq!(report.merged[0].fragments, 5);

    let output = task_dir.join("stdout_all.gz");
    assert_eq!(report.merged[0].output, output);
    assert_eq!(gunzip(&output), b"a-oldest\nb\nc\nd\ne-newest\n");

    let mut left: Vec<String> = fs::read_dir(&task_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    left.sort();
    assert_eq!(left, vec!["stdout_all.gz", "unexpected_file"]);
}

#[test]
fn test_concatenate_plain_output_in_nested_dirs() {
    let bundle = bundle_with(&[WEB]);
    let task_dir = bundle.path().join("tasks").join(WEB);
    let inner = task_dir.join("task");
    let executor = task_dir.join("executor");
    fs::create_dir_all(&inner).unwrap();
    fs::create_dir_all(&executor).unwrap();
    fs::write(inner.join("stderr.1.gz"), gzip(b"err-1\n")).unwrap();
    fs::write(inner.join("stderr.gz"), gzip(b"err-0\n")).unwrap();
    fs::write(executor.join("stdout"), b"exec\n").unwrap();

    let report = concatenate_logs(bundle.path(), false).unwrap();
    assert_eq!(report.dirs_scanned, 3);
    assert_eq!(report.merged.len(), 2);

    assert_eq!(fs::read(inner.join("stderr_all")).unwrap(), b"err-1\nerr-0\n");
    assert_eq!(fs::read(executor.join("stdout_all")).unwrap(), b"exec\n");
    assert!(!inner.join("stderr.gz").exists());
    assert!(!task_dir.join("stdout_all").exists());
    assert!(!task_dir.join("stderr_all").exists());
}

#[test]
fn test_concatenate_without_fragments_is_a_no_op() {
    let bundle = bundle_with(&[KAFKA, WEB]);
    let report = concatenate_logs(bundle.path(), true).unwrap();
    assert!(report.merged.is_empty());
    for d in [KAFKA, WEB] {
        let task_dir = bundle.path().join("tasks").join(d);
        assert_eq!(fs::read_dir(task_dir).unwrap().count(), 0);
    }
}

#[test]
fn test_concatenate_continues_past_a_bad_directory() {
    let bundle = bundle_with(&[KAFKA, WEB]);
    let bad = bundle.path().join("tasks").join(KAFKA);
    fs::write(bad.join("stdout.1.gz"), b"not gzip at all").unwrap();
    fs::write(bad.join("stderr"), b"fine\n").unwrap();
    let good = bundle.path().join("tasks").join(WEB);
    fs::write(good.join("stdout"), b"ok\n").unwrap();

    let err = concatenate_logs(bundle.path(), false).unwrap_err();
    let failed: Vec<PathBuf> = err.failed_dirs().into_iter().cloned().collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].ends_with(KAFKA));
    assert!(err.to_string().contains("stdout.1.gz"));

    // The healthy stream of the failing directory and the other task are merged.
    assert_eq!(fs::read(bad.join("stderr_all")).unwrap(), b"fine\n");
    assert_eq!(fs::read(good.join("stdout_all")).unwrap(), b"ok\n");
    assert!(bad.join("stdout.1.gz").exists());
}

#[test]
fn test_concatenate_without_tasks_dir() {
    let bundle = tempdir().unwrap();
    let err = concatenate_logs(bundle.path(), true).unwrap_err();
    assert!(matches!(err, ConcatError::Discovery(_)));
}

#[test]
fn test_link_tasks_with_logs_relative() {
    let bundle = bundle_with(&[KAFKA, WEB]);
    fs::write(bundle.path().join("tasks").join(WEB).join("stderr"), "x").unwrap();
    let tasks = find_tasks(bundle.path()).unwrap();

    let report = link_tasks_with_logs(bundle.path(), &tasks, None, "tasks_with_logs").unwrap();
    assert_eq!(report.linked, 1);

    let link = bundle.path().join("tasks_with_logs").join(WEB);
    assert_eq!(
        fs::read_link(&link).unwrap(),
        Path::new("..").join("tasks").join(WEB)
    );
    assert!(link.join("stderr").exists());
    assert!(!bundle.path().join("tasks_with_logs").join(KAFKA).exists());
}

#[test]
fn test_link_tasks_with_logs_elsewhere_is_absolute_and_recreated() {
    let bundle = bundle_with(&[WEB]);
    fs::write(bundle.path().join("tasks").join(WEB).join("stdout"), "x").unwrap();
    let tasks = find_tasks(bundle.path()).unwrap();
    let target = tempdir().unwrap();
    let stale = target.path().join("tasks_with_logs").join("stale");
    fs::create_dir_all(&stale).unwrap();

    link_tasks_with_logs(bundle.path(), &tasks, Some(target.path()), "tasks_with_logs").unwrap();

    let link = target.path().join("tasks_with_logs").join(WEB);
    assert!(fs::read_link(&link).unwrap().is_absolute());
    assert!(link.join("stdout").exists());
    assert!(!stale.exists());
}

#[test]
fn test_link_dir_name_cannot_target_bundle_content() {
    let bundle = bundle_with(&[WEB]);
    let fragment = bundle.path().join("tasks").join(WEB).join("stdout");
    fs::write(&fragment, "x").unwrap();
    let tasks = find_tasks(bundle.path()).unwrap();

    for name in ["tasks", "", ".", "../outside"] {
        let err = link_tasks_with_logs(bundle.path(), &tasks, None, name).unwrap_err();
        assert!(
            matches!(err, AdapterError::InvalidLinkDirName { .. }),
            "{:?}: {}",
            name,
            err
        );
        assert!(fragment.exists(), "{:?} removed task logs", name);
    }
}
