//! Command implementations over the bundle analysis engine

use anyhow::{Context, Result};
use sbun_common::links::{link_tasks_with_logs, LinkReport};
use sbun_common::task_csv::write_task_csv;
use sbun_common::{concatenate_logs, find_tasks, ConcatReport, SbunConfig};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::cli::{Cli, Commands};

/// File name used by `task-csv -O`
pub const DEFAULT_CSV_NAME: &str = "tasks.csv";

/// Where `task-csv` writes its rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvOutput {
    Stdout,
    File(PathBuf),
}

impl CsvOutput {
    pub fn from_flags(output: Option<PathBuf>, default_name: bool) -> Self {
        match (output, default_name) {
            (Some(path), _) => CsvOutput::File(path),
            (None, true) => CsvOutput::File(PathBuf::from(DEFAULT_CSV_NAME)),
            (None, false) => CsvOutput::Stdout,
        }
    }
}

/// Dispatch a parsed command line
pub fn run(cli: Cli, config: &SbunConfig) -> Result<()> {
    let bundle = match cli.path {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to detect the working directory")?,
    };

    match cli.command {
        Commands::TaskCsv {
            output,
            default_name,
        } => {
            task_csv(&bundle, &CsvOutput::from_flags(output, default_name))?;
        }
        Commands::ConcatLogs { dont_compress } => {
            let compress = config.concat.compress && !dont_compress;
            concat_logs(&bundle, compress)?;
        }
        Commands::TasksWithLogs { save_to } => {
            let report =
                tasks_with_logs(&bundle, save_to.as_deref(), &config.tasks_with_logs.dir_name)?;
            if report.linked == 0 {
                warn!("No tasks with logs found.");
            }
        }
        Commands::Version => println!("{}", version_string()),
    }
    Ok(())
}

/// Write the task list as CSV; returns the number of rows
pub fn task_csv(bundle: &Path, output: &CsvOutput) -> Result<usize> {
    let tasks = find_tasks(bundle).context("cannot write CSV")?;
    match output {
        CsvOutput::Stdout => write_task_csv(&tasks, io::stdout().lock())?,
        CsvOutput::File(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create file {}", path.display()))?;
            write_task_csv(&tasks, file)?;
            info!("Wrote {} tasks to {}", tasks.len(), path.display());
        }
    }
    Ok(tasks.len())
}

/// Merge rotated stdout/stderr fragments of every task
pub fn concat_logs(bundle: &Path, compress: bool) -> Result<ConcatReport> {
    let report = concatenate_logs(bundle, compress).context("error when concatenating logs")?;
    for merged in &report.merged {
        info!(
            "{}: {} fragments -> {}",
            merged.stream,
            merged.fragments,
            merged.output.display()
        );
    }
    Ok(report)
}

/// Link every task with logs into a tasks_with_logs directory
pub fn tasks_with_logs(bundle: &Path, save_to: Option<&Path>, dir_name: &str) -> Result<LinkReport> {
    let tasks = find_tasks(bundle).context("Cannot find tasks")?;
    let report = link_tasks_with_logs(bundle, &tasks, save_to, dir_name)?;
    Ok(report)
}

pub fn version_string() -> String {
    format!(
        "SBun version: {}, commit: {}, release date: {}",
        env!("SBUN_VERSION"),
        env!("SBUN_GIT_SHA"),
        env!("SBUN_BUILD_DATE")
    )
}
