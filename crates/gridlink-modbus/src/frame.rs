// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Parsed device frame.
//!
//! A frame describes one device: its identity, exactly one communication
//! interface, and the functional profiles with their data points. Frames
//! are produced by a loader (see `gridlink-config`) and are read-only from
//! here on.
//!
//! Every Modbus field of a data point is optional so that an incomplete
//! point still loads; it fails only when used for I/O.

use serde::{Deserialize, Serialize};

use crate::types::{ByteOrder, DataDirection, ModbusDataType, Parity, RegisterType};

// =============================================================================
// DeviceFrame
// =============================================================================

/// Root of a device description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceFrame {
    /// Identity and metadata.
    pub device_information: DeviceInformation,

    /// Communication interfaces. Exactly one is expected.
    pub interface: InterfaceList,

    /// Functional profiles in declaration order.
    pub functional_profiles: Vec<FunctionalProfileSpec>,

    /// Device configuration parameters.
    pub configuration: Vec<ConfigurationParameterSpec>,
}

impl DeviceFrame {
    /// Returns the device name, if declared.
    pub fn name(&self) -> Option<&str> {
        self.device_information.name.as_deref()
    }

    /// Returns the total number of data points across all profiles.
    pub fn data_point_count(&self) -> usize {
        self.functional_profiles
            .iter()
            .map(|fp| fp.data_points.len())
            .sum()
    }
}

/// Device identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceInformation {
    /// Device name.
    pub name: Option<String>,
    /// Manufacturer.
    pub manufacturer: Option<String>,
    /// Software revision.
    pub software_revision: Option<String>,
    /// Hardware revision.
    pub hardware_revision: Option<String>,
    /// Brand name.
    pub brand_name: Option<String>,
    /// Device category, e.g. `energy_meter`.
    pub device_category: Option<String>,
    /// Whether the device is under local control.
    pub is_local_control: Option<bool>,
}

// =============================================================================
// Interfaces
// =============================================================================

/// The interface block of a frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceList {
    /// Modbus TCP or RTU.
    pub modbus: Option<ModbusInterfaceSpec>,
    /// REST API.
    pub rest_api: Option<RestApiInterfaceSpec>,
    /// Message broker.
    pub messaging: Option<OpaqueInterfaceSpec>,
    /// Dry contact.
    pub contact: Option<OpaqueInterfaceSpec>,
}

impl InterfaceList {
    /// Returns the name of the first declared non-Modbus interface.
    pub fn alternative(&self) -> Option<&'static str> {
        if self.rest_api.is_some() {
            Some("rest_api")
        } else if self.messaging.is_some() {
            Some("messaging")
        } else if self.contact.is_some() {
            Some("contact")
        } else {
            None
        }
    }
}

/// Which Modbus variant a frame uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModbusInterfaceSelection {
    /// Modbus TCP.
    #[serde(alias = "tcp", alias = "TCPIP", alias = "TCP")]
    Tcpip,
    /// Modbus RTU.
    #[serde(alias = "RTU")]
    Rtu,
}

/// Modbus interface description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModbusInterfaceSpec {
    /// Explicit variant selection.
    pub selection: Option<ModbusInterfaceSelection>,
    /// TCP parameters.
    pub tcp: Option<ModbusTcpSpec>,
    /// RTU parameters.
    pub rtu: Option<ModbusRtuSpec>,
    /// Register word order. Big endian when absent.
    pub byte_order: Option<ByteOrder>,
}

impl ModbusInterfaceSpec {
    /// Resolves the variant: an explicit selection wins, then an `rtu`
    /// block, then a `tcp` block.
    pub fn selected(&self) -> Option<ModbusInterfaceSelection> {
        self.selection.or_else(|| {
            if self.rtu.is_some() {
                Some(ModbusInterfaceSelection::Rtu)
            } else if self.tcp.is_some() {
                Some(ModbusInterfaceSelection::Tcpip)
            } else {
                None
            }
        })
    }

    /// Returns the byte order, defaulting to big endian.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order.unwrap_or_default()
    }
}

/// Modbus TCP parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModbusTcpSpec {
    /// Host name or IP address.
    pub address: Option<String>,
    /// TCP port.
    pub port: Option<u16>,
    /// Slave (unit) id.
    pub slave_id: Option<u8>,
}

/// Modbus RTU parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModbusRtuSpec {
    /// Serial port, e.g. `/dev/ttyUSB0`.
    pub port_name: Option<String>,
    /// Baud rate.
    pub baud_rate: Option<u32>,
    /// Parity.
    pub parity: Option<Parity>,
    /// Slave id.
    pub slave_id: Option<u8>,
}

/// REST API interface description. Recognized but not served.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestApiInterfaceSpec {
    /// Server address.
    pub address: Option<String>,
    /// Server port.
    pub port: Option<u16>,
    /// Base path of the API.
    pub base_path: Option<String>,
}

/// Interface kinds that are recognized but carry nothing used here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpaqueInterfaceSpec {
    /// Free-form description.
    pub description: Option<String>,
}

// =============================================================================
// Profiles and Data Points
// =============================================================================

/// A functional profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionalProfileSpec {
    /// Profile name.
    pub name: String,
    /// Data points in declaration order.
    pub data_points: Vec<DataPointSpec>,
}

/// A data point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPointSpec {
    /// Data point name.
    pub name: String,
    /// Access direction. Constant when absent.
    pub direction: Option<DataDirection>,
    /// Modbus addressing.
    pub modbus: Option<ModbusDataPointSpec>,
}

/// Modbus addressing of a data point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModbusDataPointSpec {
    /// Register kind.
    pub register_type: Option<RegisterType>,
    /// Start address.
    pub address: Option<u16>,
    /// Value type.
    pub data_type: Option<ModbusDataType>,
    /// Register or bit count.
    pub size: Option<u16>,
}

/// A device configuration parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationParameterSpec {
    /// Parameter name.
    pub name: String,
    /// Default value.
    pub default_value: Option<String>,
    /// Description.
    pub description: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================
