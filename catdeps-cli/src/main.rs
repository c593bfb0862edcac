// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! catdeps CLI entry point

use clap::Parser;
use colored::Colorize;

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // -v wins over --log-level; RUST_LOG still applies on top of the default
    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else if let Some(level) = cli.log_level {
        level.to_level_filter()
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    match cli.command {
        Commands::Version => {
            println!("{} {}", "catdeps".bold().green(), env!("CARGO_PKG_VERSION"));
            println!("Catalog dependency store inspector");
            Ok(())
        }

        Commands::Dependents { object, report } => cli::handle_dependents(&cli, object.0, report),

        Commands::Dependencies { object } => cli::handle_dependencies(&cli, object.0),

        Commands::Pins => cli::handle_pins(&cli),

        Commands::OwnedBy { role } => cli::handle_owned_by(&cli, role),

        Commands::Stats => cli::handle_stats(&cli),
    }
}
