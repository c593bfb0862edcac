// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command definitions for catdeps

use catdeps::{CatalogId, ObjectAddress, Oid};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only errors
    Error,
    /// Warnings and errors
    Warn,
    /// Info, warnings, and errors
    Info,
    /// Debug messages and above (verbose)
    Debug,
    /// All messages including trace (very verbose)
    Trace,
    /// Disable all logging
    Off,
}

impl LogLevel {
    /// Convert to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// catdeps - inspect a persisted catalog dependency store
#[derive(Parser)]
#[command(name = "catdeps")]
#[command(about = "Inspect a catalog dependency store")]
#[command(version)]
pub struct Cli {
    /// Store directory
    #[arg(long, default_value = "./catdeps-data", global = true)]
    pub path: PathBuf,

    /// JSON configuration file (overrides --path)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database whose local edges are inspected
    #[arg(short, long, default_value_t = 1, global = true)]
    pub database: Oid,

    /// Output format
    #[arg(short, long, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Set log level (error, warn, info, debug, trace, off)
    #[arg(short = 'l', long = "log-level", global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Verbose mode (equivalent to --log-level debug)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show version information
    Version,

    /// List everything depending on an object
    Dependents {
        /// Object as kind:id or kind:id:sub, e.g. relation:16400 or role:10
        object: ObjectArg,

        /// Also print the drop-refusal report with at most this many entries
        #[arg(long)]
        report: Option<usize>,
    },

    /// List what an object depends on
    Dependencies {
        /// Object as kind:id or kind:id:sub
        object: ObjectArg,
    },

    /// List pinned objects
    Pins,

    /// List objects owned by a role
    OwnedBy {
        /// Role id
        role: Oid,
    },

    /// Show row counts of the store
    Stats,
}

/// Output format options
#[derive(Clone, Copy, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Object address given on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectArg(pub ObjectAddress);

impl std::str::FromStr for ObjectArg {
    type Err = String;

    /// `kind` is a catalog kind name (`relation`, `role`, `schema`, ...) or a
    /// numeric catalog id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(format!("Expected kind:id[:sub], got '{}'", s));
        }
        let catalog = match parts[0].parse::<Oid>() {
            Ok(id) => CatalogId(id),
            Err(_) => CatalogId::from_kind_name(parts[0])
                .ok_or_else(|| format!("Unknown object kind: {}", parts[0]))?,
        };
        let object_id = parts[1]
            .parse::<Oid>()
            .map_err(|e| format!("Invalid object id '{}': {}", parts[1], e))?;
        let sub_id = match parts.get(2) {
            Some(sub) => sub
                .parse::<i32>()
                .map_err(|e| format!("Invalid sub-object id '{}': {}", sub, e))?,
            None => 0,
        };
        Ok(ObjectArg(ObjectAddress::with_sub_id(catalog, object_id, sub_id)))
    }
}
