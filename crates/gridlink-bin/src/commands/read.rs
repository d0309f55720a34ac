// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `read` command.

use gridlink_modbus::{DataPoint, DeviceInterface, ModbusResult, TypedValue};
use serde_json::json;
use tracing::warn;

use crate::cli::{Cli, OutputFormat, ReadArgs};
use crate::error::{BinError, BinResult};

use super::{build_device, find_data_point};

/// Connects to the device and reads the selected data points.
pub async fn read(cli: &Cli, args: ReadArgs) -> BinResult<()> {
    let device = build_device(cli).await?;
    device
        .connect()
        .await
        .map_err(|e| BinError::from(e).with_context(format!("connecting {}", device.transport_params())))?;

    let outcome = read_selected(&device, &args).await;
    let disconnect = device.release().await;

    let results = outcome?;
    disconnect?;
    report(&results, args.format)?;

    let failed = results.iter().filter(|row| row.result.is_err()).count();
    if failed > 0 {
        return Err(BinError::PartialRead {
            failed,
            total: results.len(),
        });
    }
    Ok(())
}

struct ReadRow {
    profile: String,
    data_point: String,
    result: ModbusResult<TypedValue>,
}

async fn read_selected(device: &DeviceInterface, args: &ReadArgs) -> BinResult<Vec<ReadRow>> {
    let points: Vec<&DataPoint> = match (&args.profile, &args.data_point) {
        (Some(profile), Some(data_point)) => vec![find_data_point(device, profile, data_point)?],
        (Some(profile), None) => device
            .functional_profile(profile)
            .ok_or_else(|| BinError::not_found(format!("functional profile '{}'", profile)))?
            .data_points()
            .iter()
            .filter(|p| p.direction().is_readable() && p.is_addressed())
            .collect(),
        (None, _) => device
            .data_points()
            .filter(|p| p.direction().is_readable() && p.is_addressed())
            .collect(),
    };

    let mut results = Vec::with_capacity(points.len());
    for point in points {
        let (profile, name) = point.name();
        let result = point.get().await;
        if let Err(e) = &result {
            warn!(profile, data_point = name, error = %e, "Read failed");
        }
        results.push(ReadRow {
            profile: profile.to_string(),
            data_point: name.to_string(),
            result,
        });
    }
    Ok(results)
}

fn report(results: &[ReadRow], format: OutputFormat) -> BinResult<()> {
    match format {
        OutputFormat::Text => {
            for row in results {
                match &row.result {
                    Ok(value) => println!("{}/{} = {}", row.profile, row.data_point, value),
                    Err(e) => println!("{}/{} ! {}", row.profile, row.data_point, e),
                }
            }
        }
        OutputFormat::Json => {
            let rows: Vec<_> = results
                .iter()
                .map(|row| {
                    let (profile, name) = (&row.profile, &row.data_point);
                    match &row.result {
                        Ok(value) => json!({ "profile": profile, "data_point": name, "value": value }),
                        Err(e) => json!({
                            "profile": profile,
                            "data_point": name,
                            "error": e.to_string(),
                            "code": e.error_code().to_string(),
                        }),
                    }
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}
