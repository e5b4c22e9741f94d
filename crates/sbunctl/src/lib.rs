//! Sbunctl library - exposes the CLI and commands for testing

pub mod cli;
pub mod commands;
pub mod errors;
pub mod logging;
