// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `write` command.

use gridlink_modbus::TypedValue;
use tracing::info;

use crate::cli::{Cli, WriteArgs};
use crate::error::{BinError, BinResult};

use super::{build_device, find_data_point};

/// Connects to the device and writes one data point.
pub async fn write(cli: &Cli, args: WriteArgs) -> BinResult<()> {
    let device = build_device(cli).await?;

    let (value, outcome) = {
        let point = find_data_point(&device, &args.profile, &args.data_point)?;
        let layout = point.layout()?;
        let value = TypedValue::parse_as(layout.data_type, &args.value)
            .map_err(|e| BinError::from(e).with_context(format!("parsing '{}'", args.value)))?;

        device.connect().await?;
        let outcome = point.set(value.clone()).await;
        (value, outcome)
    };
    let release = device.release().await;

    outcome?;
    release?;

    info!(profile = %args.profile, data_point = %args.data_point, value = %value, "Data point written");
    println!("{}/{} := {}", args.profile, args.data_point, value);
    Ok(())
}
