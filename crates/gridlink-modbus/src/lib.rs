// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gridlink-modbus
//!
//! Uniform read/write access to Modbus field devices described by device
//! frames.
//!
//! - **Device interface**: one [`DeviceInterface`] per device instance,
//!   built from a [`DeviceFrame`], exposing functional profiles and data
//!   points
//! - **Modbus TCP and RTU**: `tokio-modbus` backed transports
//! - **Shared RTU lines**: a [`SharedClientRegistry`] hands every device on
//!   the same serial port one client, so requests on a line never overlap
//! - **Data conversion**: registers to typed values with byte order support
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              DeviceInterface / FunctionalProfile / DataPoint    │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │  ClientWrapper (exclusive)   │   │  SharedClientRegistry        │
//! │                              │   │  port -> ClientWrapper       │
//! └──────────────────────────────┘   └──────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │          ModbusTransport (ModbusTcpTransport / ModbusRtuTransport)│
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gridlink_modbus::{DeviceInterface, InterfaceOptions, SharedClientRegistry, TypedValue};
//!
//! let registry = Arc::new(SharedClientRegistry::new());
//! let options = InterfaceOptions::default().with_shared_rtu(registry.clone());
//!
//! let meter = DeviceInterface::new(&frame, options).await?;
//! meter.connect().await?;
//!
//! let power = meter.data_point("ActivePower", "total").unwrap().get().await?;
//! meter
//!     .data_point("Setpoint", "limit")
//!     .unwrap()
//!     .set(TypedValue::UInt16(80))
//!     .await?;
//!
//! meter.release().await?;
//! ```
//!
//! ### Error Handling
//!
//! ```rust,ignore
//! use gridlink_modbus::{ModbusError, ModbusResult};
//!
//! fn handle_error(result: ModbusResult<()>) {
//!     if let Err(error) = result {
//!         if error.is_transport() {
//!             println!("device unreachable: {}", error);
//!         }
//!         for hint in error.recovery_hints() {
//!             println!("Hint: {}", hint);
//!         }
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod client;
pub mod data_point;
pub mod error;
pub mod frame;
pub mod id;
pub mod interface;
pub mod shared;
pub mod types;

// =============================================================================
// Re-exports - Error Module
// =============================================================================

pub use error::{
    // Main error type
    ModbusError,
    ModbusResult,
    // Error categories
    ConfigurationError,
    ConnectionError,
    ConversionError,
    DirectionError,
    ProtocolError,
    ResourceStateError,
    TimeoutError,
    UnsupportedOperationError,
    // Error metadata
    ErrorCode,
    ErrorSeverity,
};

// =============================================================================
// Re-exports - Types Module
// =============================================================================

pub use types::{
    // Register types
    ByteOrder,
    DataDirection,
    ModbusDataType,
    RegisterType,
    TransportKind,
    // Configuration
    ModbusRtuConfig,
    ModbusRtuConfigBuilder,
    ModbusTcpConfig,
    ModbusTcpConfigBuilder,
    // Serial port settings
    DataBits,
    Parity,
    StopBits,
};

// =============================================================================
// Re-exports - Client Module
// =============================================================================

pub use client::{
    ClientStats,
    ClientWrapper,
    DataConverter,
    ModbusRtuTransport,
    ModbusTcpTransport,
    ModbusTransport,
    NativeTransportFactory,
    Sharing,
    TransportFactory,
    TransportState,
    TypedValue,
};

// =============================================================================
// Re-exports - Device Model
// =============================================================================

pub use data_point::{DataPoint, FunctionalProfile, ReadOptions, RegisterLayout};
pub use frame::{
    ConfigurationParameterSpec, DataPointSpec, DeviceFrame, DeviceInformation,
    FunctionalProfileSpec, InterfaceList, ModbusDataPointSpec, ModbusInterfaceSelection,
    ModbusInterfaceSpec, ModbusRtuSpec, ModbusTcpSpec,
};
pub use id::{DeviceId, IdSource, RandomIdSource, SequentialIdSource};
pub use interface::{DeviceInterface, InterfaceOptions, TransportParams};
pub use shared::{SharedClientRegistry, SharedEntryInfo};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
