//! Command-line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sbun")]
#[command(about = "Service diagnostics bundle analysis tool", long_about = None)]
#[command(version = env!("SBUN_VERSION"))]
pub struct Cli {
    /// Path to the bundle directory (defaults to the working directory)
    #[arg(short, long, global = true)]
    pub path: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Print service task list in CSV format
    ///
    /// Columns: <task name>, <starting timestamp>, <running timestamp>,
    /// <killed timestamp>, <failed timestamp>, <task ID>, <has logs>,
    /// <path to the task directory>
    TaskCsv {
        /// Path to the output CSV file
        #[arg(short, long, value_name = "FILE", conflicts_with = "default_name")]
        output: Option<PathBuf>,

        /// Write output to the tasks.csv file
        #[arg(short = 'O', long)]
        default_name: bool,
    },

    /// Concatenate task logs to a single file: stdout_all, stderr_all
    ConcatLogs {
        /// Do not compress stdout_all and stderr_all files
        #[arg(short, long)]
        dont_compress: bool,
    },

    /// Create a tasks_with_logs directory with a link to each task which has logs
    ///
    /// By default, links with relative paths are created in
    /// <bundle path>/tasks_with_logs.
    TasksWithLogs {
        /// Directory in which to create the tasks_with_logs directory
        #[arg(short, long, value_name = "DIR")]
        save_to: Option<PathBuf>,
    },

    /// Show the SBun version, commit, and release date
    Version,
}
