// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `inspect`: Print the profiles and data points of a frame (default)
//! - `read`: Connect and read one or all readable data points
//! - `write`: Connect and write one data point
//! - `version`: Show version information

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::error::{BinError, BinResult};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// gridlink - uniform access to field devices described by device frames
#[derive(Parser, Debug)]
#[command(
    name = "gridlink",
    author = "Sylvex <contact@sylvex.io>",
    version = gridlink_modbus::VERSION,
    about = "Read and write field devices described by device frames",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Device frame path (yaml, toml or json)
    #[arg(
        short,
        long,
        default_value = "device.yaml",
        env = "GRIDLINK_FRAME",
        global = true
    )]
    pub frame: PathBuf,

    /// Frame property, repeatable (KEY=VALUE)
    #[arg(short = 'P', long = "property", value_name = "KEY=VALUE", global = true)]
    pub properties: Vec<String>,

    /// Properties file (INI)
    #[arg(long, env = "GRIDLINK_PROPERTIES", global = true)]
    pub properties_file: Option<PathBuf>,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "GRIDLINK_TIMEOUT_MS", global = true)]
    pub timeout_ms: Option<u64>,

    /// Override the slave id declared in the frame
    #[arg(long, global = true)]
    pub slave_id: Option<u8>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        env = "GRIDLINK_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json, compact)
    #[arg(long, default_value = "text", env = "GRIDLINK_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Enable quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the device, its transport and its data points
    ///
    /// Loads the frame without touching the device. This is the default
    /// command.
    Inspect(InspectArgs),

    /// Read data points from the device
    ///
    /// Without a profile every readable data point is read. Failures of
    /// single points are reported and do not stop the others.
    Read(ReadArgs),

    /// Write one data point
    Write(WriteArgs),

    /// Show version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `inspect` command.
#[derive(Args, Debug, Clone, Default)]
pub struct InspectArgs {
    /// Output format
    #[arg(short = 'o', long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the `read` command.
#[derive(Args, Debug, Clone, Default)]
pub struct ReadArgs {
    /// Functional profile to read
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Data point within the profile
    #[arg(short, long, requires = "profile")]
    pub data_point: Option<String>,

    /// Output format
    #[arg(short = 'o', long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the `write` command.
#[derive(Args, Debug, Clone)]
pub struct WriteArgs {
    /// Functional profile
    #[arg(short, long)]
    pub profile: String,

    /// Data point within the profile
    #[arg(short, long)]
    pub data_point: String,

    /// Value, parsed as the data point's data type
    pub value: String,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Inspect`.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Inspect(InspectArgs::default()))
    }

    /// Get the effective log level based on flags.
    pub fn effective_log_level(&self) -> &str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }

    /// Returns the per-request timeout override.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Splits the `KEY=VALUE` properties.
    pub fn property_pairs(&self) -> BinResult<Vec<(String, String)>> {
        self.properties
            .iter()
            .map(|raw| {
                raw.split_once('=')
                    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                    .filter(|(k, _)| !k.is_empty())
                    .ok_or_else(|| BinError::usage(format!("invalid property '{}', expected KEY=VALUE", raw)))
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
