// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `inspect` command.

use gridlink_modbus::{DataPoint, DeviceInterface};
use serde_json::{json, Value};

use crate::cli::{Cli, InspectArgs, OutputFormat};
use crate::error::BinResult;

use super::build_device;

/// Prints the device, its transport and every data point.
pub async fn inspect(cli: &Cli, args: InspectArgs) -> BinResult<()> {
    let device = build_device(cli).await?;

    match args.format {
        OutputFormat::Text => print_text(&device),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&to_json(&device))?),
    }

    device.release().await?;
    Ok(())
}

fn print_text(device: &DeviceInterface) {
    let info = device.device_information();
    println!("Device:     {}", info.name.as_deref().unwrap_or("<unnamed>"));
    if let Some(manufacturer) = &info.manufacturer {
        println!("Vendor:     {}", manufacturer);
    }
    println!("Transport:  {}", device.transport_params());
    println!("Byte order: {}", device.byte_order());
    println!();

    for profile in device.functional_profiles() {
        println!("{} ({} data points)", profile.name(), profile.len());
        for point in profile.data_points() {
            println!("  {:<24} {:<3} {}", point.name().1, point.direction().code(), describe(point));
        }
    }

    let parameters = device.configuration_parameters();
    if !parameters.is_empty() {
        println!();
        println!("Configuration:");
        for parameter in parameters {
            println!(
                "  {} = {}",
                parameter.name,
                parameter.default_value.as_deref().unwrap_or("-")
            );
        }
    }
}

fn describe(point: &DataPoint) -> String {
    match point.layout() {
        Ok(layout) => format!(
            "{}@{} {} x{}",
            layout.register_type, layout.address, layout.data_type, layout.size
        ),
        Err(_) => "unaddressed".to_string(),
    }
}

fn to_json(device: &DeviceInterface) -> Value {
    let profiles: Vec<Value> = device
        .functional_profiles()
        .iter()
        .map(|profile| {
            let points: Vec<Value> = profile
                .data_points()
                .iter()
                .map(|point| {
                    let layout = point.layout().ok();
                    json!({
                        "name": point.name().1,
                        "direction": point.direction(),
                        "register_type": layout.map(|l| l.register_type),
                        "address": layout.map(|l| l.address),
                        "size": layout.map(|l| l.size),
                        "data_type": layout.map(|l| l.data_type),
                    })
                })
                .collect();
            json!({ "name": profile.name(), "data_points": points })
        })
        .collect();

    json!({
        "device_information": device.device_information(),
        "transport": device.transport_params().to_string(),
        "transport_kind": device.transport_kind(),
        "byte_order": device.byte_order(),
        "slave_id": device.slave_id(),
        "functional_profiles": profiles,
        "configuration": device.configuration_parameters(),
    })
}
