// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::cli::Cli;
use crate::error::BinResult;

/// Prints version information for every gridlink component.
pub fn version(_cli: &Cli) -> BinResult<()> {
    println!("gridlink - uniform access to field devices");
    println!();
    println!("Version Information:");
    println!("  gridlink-bin:    {}", env!("CARGO_PKG_VERSION"));
    println!("  gridlink-modbus: {}", gridlink_modbus::VERSION);
    println!("  gridlink-config: {}", gridlink_config::VERSION);
    println!();
    println!("Build Information:");
    println!("  Target:       {}", std::env::consts::ARCH);
    println!("  OS:           {}", std::env::consts::OS);
    println!();
    println!("Transports:     modbus-tcp, modbus-rtu");
    println!("Frame formats:  yaml, toml, json");
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");
    println!("Copyright (c) 2025 Sylvex. All rights reserved.");

    Ok(())
}
