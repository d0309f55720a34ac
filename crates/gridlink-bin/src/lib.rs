// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gridlink-bin
//!
//! Command-line tool for gridlink device frames.
//!
//! ## Usage
//!
//! ```bash
//! # Show profiles and data points of a frame
//! gridlink -f meter.yaml inspect
//!
//! # Fill frame placeholders
//! gridlink -f meter.yaml -P serial_port=/dev/ttyUSB0 inspect
//!
//! # Read every readable data point
//! gridlink -f meter.yaml read
//!
//! # Read one data point as JSON
//! gridlink -f meter.yaml read -p ActivePower -d total -o json
//!
//! # Write a data point
//! gridlink -f meter.yaml write -p Setpoint -d limit 80
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
