// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! - `inspect`: Print the profiles and data points of a frame
//! - `read`: Read data points
//! - `write`: Write one data point
//! - `version`: Show version information

mod inspect;
mod read;
mod version;
mod write;

pub use inspect::inspect;
pub use read::read;
pub use version::version;
pub use write::write;

use gridlink_config::DeviceBuilder;
use gridlink_modbus::{DataPoint, DeviceInterface};

use crate::cli::{Cli, Commands};
use crate::error::{BinError, BinResult};

/// Executes the appropriate command based on CLI arguments.
pub async fn execute(cli: Cli) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Inspect(args) => inspect::inspect(&cli, args).await,
        Commands::Read(args) => read::read(&cli, args).await,
        Commands::Write(args) => write::write(&cli, args).await,
        Commands::Version => version::version(&cli),
    }
}

/// Builds the device described by the CLI frame options.
pub(crate) async fn build_device(cli: &Cli) -> BinResult<DeviceInterface> {
    let mut builder = DeviceBuilder::new()
        .frame_path(&cli.frame)
        .properties(cli.property_pairs()?);
    if let Some(path) = &cli.properties_file {
        builder = builder.properties_path(path);
    }
    if let Some(timeout) = cli.timeout() {
        builder = builder.operation_timeout(timeout);
    }

    let device = builder
        .build()
        .await
        .map_err(|e| BinError::from(e).with_context(format!("loading {}", cli.frame.display())))?;

    if let Some(slave_id) = cli.slave_id {
        device.set_slave_id(slave_id);
    }
    Ok(device)
}

/// Looks up a data point, naming the missing part on failure.
pub(crate) fn find_data_point<'a>(
    device: &'a DeviceInterface,
    profile: &str,
    data_point: &str,
) -> BinResult<&'a DataPoint> {
    let fp = device
        .functional_profile(profile)
        .ok_or_else(|| BinError::not_found(format!("functional profile '{}'", profile)))?;
    fp.data_point(data_point).ok_or_else(|| {
        BinError::not_found(format!("data point '{}' in profile '{}'", data_point, profile))
    })
}
