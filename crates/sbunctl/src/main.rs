//! SBun - CLI for analyzing service diagnostics bundles

use clap::Parser;
use sbun_common::SbunConfig;
use sbunctl::cli::Cli;
use sbunctl::{commands, errors, logging};

fn main() {
    let cli = Cli::parse();

    let config = match SbunConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(errors::EXIT_CONFIG_ERROR);
        }
    };
    logging::init(&config.logging.level);

    if let Err(e) = commands::run(cli, &config) {
        eprintln!("ERROR: {:#}", e);
        std::process::exit(errors::exit_code(&e));
    }
}
