// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus vocabulary shared by device frames, data points and transports.
//!
//! - **RegisterType**: the four Modbus addressing classes
//! - **ModbusDataType**: how a register block is interpreted
//! - **ByteOrder**: word and byte ordering for multi-register values
//! - **DataDirection**: read/write legality of a data point
//! - **ModbusTcpConfig** / **ModbusRtuConfig**: transport settings with builders
//!
//! # Examples
//!
//! ```
//! use gridlink_modbus::types::{ModbusRtuConfig, Parity, RegisterType};
//!
//! let config = ModbusRtuConfig::builder()
//!     .port("/dev/ttyUSB0")
//!     .baud_rate(9600)
//!     .parity(Parity::Even)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.line_settings(), "9600/8E1");
//!
//! let kind: RegisterType = "HR".parse().unwrap();
//! assert!(kind.is_writable());
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ModbusError};

// =============================================================================
// RegisterType
// =============================================================================

/// Modbus register kind.
///
/// Each kind has its own read function code and write legality: coils and
/// holding registers are writable, discrete inputs and input registers are
/// read-only on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterType {
    /// Coil (read/write, 1 bit). FC01 read, FC05/FC15 write.
    #[serde(alias = "COIL", alias = "C")]
    Coil,

    /// Discrete input (read-only, 1 bit). FC02 read.
    #[serde(alias = "DISCRETE_INPUT", alias = "DI")]
    DiscreteInput,

    /// Holding register (read/write, 16 bits). FC03 read, FC06/FC16 write.
    #[serde(alias = "HOLD_REGISTER", alias = "HOLDING_REGISTER", alias = "HR")]
    HoldingRegister,

    /// Input register (read-only, 16 bits). FC04 read.
    #[serde(alias = "INPUT_REGISTER", alias = "IR")]
    InputRegister,
}

impl RegisterType {
    /// Returns `true` if this register type is writable.
    #[inline]
    pub const fn is_writable(&self) -> bool {
        matches!(self, Self::Coil | Self::HoldingRegister)
    }

    /// Returns `true` if this is a bit-type register (1-bit).
    #[inline]
    pub const fn is_bit(&self) -> bool {
        matches!(self, Self::Coil | Self::DiscreteInput)
    }

    /// Returns the function code for reading this register type.
    #[inline]
    pub const fn read_function_code(&self) -> u8 {
        match self {
            Self::Coil => 0x01,
            Self::DiscreteInput => 0x02,
            Self::HoldingRegister => 0x03,
            Self::InputRegister => 0x04,
        }
    }

    /// Returns the function code for writing `count` items, or `None` for
    /// read-only register types.
    #[inline]
    pub const fn write_function_code(&self, count: u16) -> Option<u8> {
        match (self, count) {
            (Self::Coil, 1) => Some(0x05),
            (Self::Coil, _) => Some(0x0F),
            (Self::HoldingRegister, 1) => Some(0x06),
            (Self::HoldingRegister, _) => Some(0x10),
            (Self::DiscreteInput | Self::InputRegister, _) => None,
        }
    }

    /// Returns the short name for this register type.
    pub const fn short_name(&self) -> &'static str {
        match self {
            Self::Coil => "C",
            Self::DiscreteInput => "DI",
            Self::InputRegister => "IR",
            Self::HoldingRegister => "HR",
        }
    }

    /// Returns the full name for this register type.
    pub const fn full_name(&self) -> &'static str {
        match self {
            Self::Coil => "Coil",
            Self::DiscreteInput => "Discrete Input",
            Self::InputRegister => "Input Register",
            Self::HoldingRegister => "Holding Register",
        }
    }
}

impl fmt::Display for RegisterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

impl FromStr for RegisterType {
    type Err = ModbusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "C" | "COIL" => Ok(Self::Coil),
            "DI" | "DISCRETE" | "DISCRETE_INPUT" => Ok(Self::DiscreteInput),
            "IR" | "INPUT" | "INPUT_REGISTER" => Ok(Self::InputRegister),
            "HR" | "HOLDING" | "HOLD_REGISTER" | "HOLDING_REGISTER" => Ok(Self::HoldingRegister),
            _ => Err(ModbusError::configuration(ConfigurationError::invalid_value(
                "register_type",
                s,
                "expected C, DI, IR or HR",
            ))),
        }
    }
}

// =============================================================================
// ModbusDataType
// =============================================================================

/// Interpretation of a register block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModbusDataType {
    /// Boolean (single bit for coils and discrete inputs).
    #[serde(rename = "bool", alias = "BOOLEAN", alias = "BIT", alias = "boolean")]
    Bool,

    /// 8-bit signed integer (low byte of register).
    #[serde(rename = "int8", alias = "INT8")]
    Int8,

    /// 8-bit unsigned integer (low byte of register).
    #[serde(rename = "uint8", alias = "UINT8")]
    UInt8,

    /// 16-bit signed integer (1 register).
    #[serde(rename = "int16", alias = "INT16")]
    Int16,

    /// 16-bit unsigned integer (1 register).
    #[serde(rename = "uint16", alias = "UINT16")]
    UInt16,

    /// 32-bit signed integer (2 registers).
    #[serde(rename = "int32", alias = "INT32")]
    Int32,

    /// 32-bit unsigned integer (2 registers).
    #[serde(rename = "uint32", alias = "UINT32")]
    UInt32,

    /// 64-bit signed integer (4 registers).
    #[serde(rename = "int64", alias = "INT64")]
    Int64,

    /// 64-bit unsigned integer (4 registers).
    #[serde(rename = "uint64", alias = "UINT64")]
    UInt64,

    /// 32-bit IEEE 754 float (2 registers).
    #[serde(rename = "float32", alias = "FLOAT32")]
    Float32,

    /// 64-bit IEEE 754 float (4 registers).
    #[serde(rename = "float64", alias = "FLOAT64")]
    Float64,

    /// ASCII string (2 chars per register).
    #[serde(rename = "string", alias = "STRING")]
    String,
}

impl ModbusDataType {
    /// Returns the number of registers required for this data type.
    ///
    /// Strings are variable length; the minimum of one register is returned.
    #[inline]
    pub const fn register_count(&self) -> u16 {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 | Self::Int16 | Self::UInt16 => 1,
            Self::Int32 | Self::UInt32 | Self::Float32 => 2,
            Self::Int64 | Self::UInt64 | Self::Float64 => 4,
            Self::String => 1,
        }
    }

    /// Returns `true` if this is a variable-length type.
    #[inline]
    pub const fn is_variable_length(&self) -> bool {
        matches!(self, Self::String)
    }

    /// Returns `true` if this type can be carried by coils and discrete inputs.
    #[inline]
    pub const fn is_bit_compatible(&self) -> bool {
        matches!(self, Self::Bool)
    }

    /// Returns the canonical lowercase name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ModbusDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModbusDataType {
    type Err = ModbusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bool" | "boolean" | "bit" => Ok(Self::Bool),
            "int8" | "i8" => Ok(Self::Int8),
            "uint8" | "u8" => Ok(Self::UInt8),
            "int16" | "i16" => Ok(Self::Int16),
            "uint16" | "u16" => Ok(Self::UInt16),
            "int32" | "i32" => Ok(Self::Int32),
            "uint32" | "u32" => Ok(Self::UInt32),
            "int64" | "i64" => Ok(Self::Int64),
            "uint64" | "u64" => Ok(Self::UInt64),
            "float32" | "f32" | "float" => Ok(Self::Float32),
            "float64" | "f64" | "double" => Ok(Self::Float64),
            "string" | "str" => Ok(Self::String),
            _ => Err(ModbusError::configuration(ConfigurationError::invalid_value(
                "data_type",
                s,
                "unknown data type",
            ))),
        }
    }
}

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order for multi-register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Big-endian, ABCD. The default when a frame does not specify one.
    #[default]
    #[serde(alias = "BIG_ENDIAN", alias = "ABCD")]
    BigEndian,

    /// Little-endian, DCBA.
    #[serde(alias = "LITTLE_ENDIAN", alias = "DCBA")]
    LittleEndian,

    /// Big-endian bytes with swapped words, CDAB.
    #[serde(alias = "CDAB")]
    MidBigEndian,

    /// Little-endian words with swapped bytes, BADC.
    #[serde(alias = "BADC")]
    MidLittleEndian,
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BigEndian => "big_endian",
            Self::LittleEndian => "little_endian",
            Self::MidBigEndian => "mid_big_endian",
            Self::MidLittleEndian => "mid_little_endian",
        };
        f.write_str(s)
    }
}

impl FromStr for ByteOrder {
    type Err = ModbusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "bigendian" | "big" | "be" | "abcd" => Ok(Self::BigEndian),
            "littleendian" | "little" | "le" | "dcba" => Ok(Self::LittleEndian),
            "midbigendian" | "cdab" | "wordswap" => Ok(Self::MidBigEndian),
            "midlittleendian" | "badc" | "byteswap" => Ok(Self::MidLittleEndian),
            _ => Err(ModbusError::configuration(ConfigurationError::invalid_value(
                "byte_order",
                s,
                "expected big_endian, little_endian, mid_big_endian or mid_little_endian",
            ))),
        }
    }
}

// =============================================================================
// DataDirection
// =============================================================================

/// Read/write legality of a data point.
///
/// Points without a declared direction are constants, which are readable
/// but never writable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataDirection {
    /// Read-only.
    #[serde(alias = "R")]
    Read,
    /// Write-only.
    #[serde(alias = "W")]
    Write,
    /// Readable and writable.
    #[serde(alias = "RW")]
    ReadWrite,
    /// Constant value, read-only.
    #[default]
    #[serde(alias = "C")]
    Constant,
}

impl DataDirection {
    /// Returns `true` if `get` is permitted.
    #[inline]
    pub const fn is_readable(&self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite | Self::Constant)
    }

    /// Returns `true` if `set` is permitted.
    #[inline]
    pub const fn is_writable(&self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }

    /// Returns the short code used in device frames.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Read => "R",
            Self::Write => "W",
            Self::ReadWrite => "RW",
            Self::Constant => "C",
        }
    }
}

impl fmt::Display for DataDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// TransportKind
// =============================================================================

/// Transport family of a device interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Modbus TCP.
    Tcp,
    /// Modbus RTU over a serial line.
    Rtu,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::Rtu => f.write_str("rtu"),
        }
    }
}

// =============================================================================
// ModbusTcpConfig
// =============================================================================

/// Configuration for Modbus TCP connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModbusTcpConfig {
    /// Target host address.
    pub host: String,

    /// Target port (default: 502).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Unit ID / slave address (default: 1).
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,

    /// Connection timeout.
    #[serde(default = "default_connect_timeout")]
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Read/write operation timeout.
    #[serde(default = "default_operation_timeout")]
    #[serde(with = "humantime_serde")]
    pub operation_timeout: Duration,

    /// Enable TCP_NODELAY.
    #[serde(default = "default_true")]
    pub tcp_nodelay: bool,

    /// Byte order for multi-register values.
    #[serde(default)]
    pub byte_order: ByteOrder,
}

fn default_port() -> u16 {
    502
}

fn default_unit_id() -> u8 {
    1
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_operation_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_true() -> bool {
    true
}

fn default_baud_rate() -> u32 {
    9600
}

impl ModbusTcpConfig {
    /// Creates a new builder for ModbusTcpConfig.
    pub fn builder() -> ModbusTcpConfigBuilder {
        ModbusTcpConfigBuilder::default()
    }

    /// Creates configuration with host and port.
    pub fn with_port(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Returns the socket address string.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), ModbusError> {
        if self.host.is_empty() {
            return Err(ModbusError::missing_field("host"));
        }

        if self.port == 0 {
            return Err(ModbusError::configuration(ConfigurationError::invalid_value(
                "port",
                "0",
                "port must be greater than 0",
            )));
        }

        if self.connect_timeout.is_zero() || self.operation_timeout.is_zero() {
            return Err(ModbusError::configuration(ConfigurationError::InvalidTimeout {
                duration: self.connect_timeout.min(self.operation_timeout),
                reason: "timeouts must be greater than 0".to_string(),
            }));
        }

        Ok(())
    }
}

impl Default for ModbusTcpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            unit_id: default_unit_id(),
            connect_timeout: default_connect_timeout(),
            operation_timeout: default_operation_timeout(),
            tcp_nodelay: true,
            byte_order: ByteOrder::default(),
        }
    }
}

/// Builder for ModbusTcpConfig.
#[derive(Debug, Default)]
pub struct ModbusTcpConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    unit_id: Option<u8>,
    connect_timeout: Option<Duration>,
    operation_timeout: Option<Duration>,
    tcp_nodelay: Option<bool>,
    byte_order: Option<ByteOrder>,
}

impl ModbusTcpConfigBuilder {
    /// Sets the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the unit ID.
    pub fn unit_id(mut self, unit_id: u8) -> Self {
        self.unit_id = Some(unit_id);
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the operation timeout.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Sets TCP_NODELAY.
    pub fn tcp_nodelay(mut self, nodelay: bool) -> Self {
        self.tcp_nodelay = Some(nodelay);
        self
    }

    /// Sets the byte order.
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = Some(order);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Result<ModbusTcpConfig, ModbusError> {
        let host = self.host.ok_or_else(|| ModbusError::missing_field("host"))?;

        let config = ModbusTcpConfig {
            host,
            port: self.port.unwrap_or_else(default_port),
            unit_id: self.unit_id.unwrap_or_else(default_unit_id),
            connect_timeout: self.connect_timeout.unwrap_or_else(default_connect_timeout),
            operation_timeout: self
                .operation_timeout
                .unwrap_or_else(default_operation_timeout),
            tcp_nodelay: self.tcp_nodelay.unwrap_or(true),
            byte_order: self.byte_order.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// ModbusRtuConfig
// =============================================================================

/// Configuration for Modbus RTU connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModbusRtuConfig {
    /// Serial port path (e.g., "/dev/ttyUSB0" or "COM1").
    pub port: String,

    /// Baud rate.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Data bits.
    #[serde(default)]
    pub data_bits: DataBits,

    /// Parity.
    #[serde(default)]
    pub parity: Parity,

    /// Stop bits.
    #[serde(default)]
    pub stop_bits: StopBits,

    /// Default unit ID for the line. Each call names its own slave.
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,

    /// Read/write operation timeout.
    #[serde(default = "default_operation_timeout")]
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Byte order for multi-register values.
    #[serde(default)]
    pub byte_order: ByteOrder,
}

impl ModbusRtuConfig {
    /// Creates a new builder for ModbusRtuConfig.
    pub fn builder() -> ModbusRtuConfigBuilder {
        ModbusRtuConfigBuilder::default()
    }

    /// Creates a configuration for `port` with 9600/8N1 defaults.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Default::default()
        }
    }

    /// Returns the line settings in the usual `9600/8N1` notation.
    pub fn line_settings(&self) -> String {
        format!(
            "{}/{}{}{}",
            self.baud_rate, self.data_bits, self.parity, self.stop_bits
        )
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), ModbusError> {
        if self.port.is_empty() {
            return Err(ModbusError::missing_field("port"));
        }

        // Any non-zero rate.
        if self.baud_rate == 0 {
            return Err(ModbusError::configuration(
                ConfigurationError::InvalidBaudRate {
                    baud_rate: self.baud_rate,
                },
            ));
        }

        if self.timeout.is_zero() {
            return Err(ModbusError::configuration(ConfigurationError::InvalidTimeout {
                duration: self.timeout,
                reason: "timeout must be greater than 0".to_string(),
            }));
        }

        Ok(())
    }
}

impl Default for ModbusRtuConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: default_baud_rate(),
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            unit_id: default_unit_id(),
            timeout: default_operation_timeout(),
            byte_order: ByteOrder::default(),
        }
    }
}

/// Builder for ModbusRtuConfig.
#[derive(Debug, Default)]
pub struct ModbusRtuConfigBuilder {
    port: Option<String>,
    baud_rate: Option<u32>,
    data_bits: Option<DataBits>,
    parity: Option<Parity>,
    stop_bits: Option<StopBits>,
    unit_id: Option<u8>,
    timeout: Option<Duration>,
    byte_order: Option<ByteOrder>,
}

impl ModbusRtuConfigBuilder {
    /// Sets the serial port.
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Sets the baud rate.
    pub fn baud_rate(mut self, rate: u32) -> Self {
        self.baud_rate = Some(rate);
        self
    }

    /// Sets the data bits.
    pub fn data_bits(mut self, bits: DataBits) -> Self {
        self.data_bits = Some(bits);
        self
    }

    /// Sets the parity.
    pub fn parity(mut self, parity: Parity) -> Self {
        self.parity = Some(parity);
        self
    }

    /// Sets the stop bits.
    pub fn stop_bits(mut self, bits: StopBits) -> Self {
        self.stop_bits = Some(bits);
        self
    }

    /// Sets the unit ID.
    pub fn unit_id(mut self, id: u8) -> Self {
        self.unit_id = Some(id);
        self
    }

    /// Sets the operation timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the byte order.
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = Some(order);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Result<ModbusRtuConfig, ModbusError> {
        let port = self.port.ok_or_else(|| ModbusError::missing_field("port"))?;

        let config = ModbusRtuConfig {
            port,
            baud_rate: self.baud_rate.unwrap_or_else(default_baud_rate),
            data_bits: self.data_bits.unwrap_or_default(),
            parity: self.parity.unwrap_or_default(),
            stop_bits: self.stop_bits.unwrap_or_default(),
            unit_id: self.unit_id.unwrap_or_else(default_unit_id),
            timeout: self.timeout.unwrap_or_else(default_operation_timeout),
            byte_order: self.byte_order.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Serial Port Settings
// =============================================================================

/// Data bits configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataBits {
    /// 5 data bits.
    Five,
    /// 6 data bits.
    Six,
    /// 7 data bits.
    Seven,
    /// 8 data bits (default).
    #[default]
    Eight,
}

impl DataBits {
    /// Returns the number of bits.
    pub const fn bits(&self) -> u8 {
        match self {
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }
}

impl fmt::Display for DataBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Parity configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    /// No parity (default).
    #[default]
    #[serde(alias = "N", alias = "NONE")]
    None,
    /// Odd parity.
    #[serde(alias = "O", alias = "ODD")]
    Odd,
    /// Even parity.
    #[serde(alias = "E", alias = "EVEN")]
    Even,
}

impl Parity {
    /// Returns the number of parity bits.
    pub const fn bits(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Odd | Self::Even => 1,
        }
    }

    /// Returns the short character representation.
    pub const fn char(&self) -> char {
        match self {
            Self::None => 'N',
            Self::Odd => 'O',
            Self::Even => 'E',
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl FromStr for Parity {
    type Err = ModbusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "N" | "NONE" => Ok(Self::None),
            "O" | "ODD" => Ok(Self::Odd),
            "E" | "EVEN" => Ok(Self::Even),
            _ => Err(ModbusError::configuration(ConfigurationError::invalid_value(
                "parity",
                s,
                "expected N, E or O",
            ))),
        }
    }
}

/// Stop bits configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StopBits {
    /// 1 stop bit (default).
    #[default]
    One,
    /// 2 stop bits.
    Two,
}

impl StopBits {
    /// Returns the number of stop bits.
    pub const fn bits(&self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_type_properties() {
        assert!(RegisterType::HoldingRegister.is_writable());
        assert!(RegisterType::Coil.is_writable());
        assert!(!RegisterType::InputRegister.is_writable());
        assert!(!RegisterType::DiscreteInput.is_writable());

        assert_eq!(RegisterType::HoldingRegister.write_function_code(1), Some(0x06));
        assert_eq!(RegisterType::HoldingRegister.write_function_code(2), Some(0x10));
        assert_eq!(RegisterType::Coil.write_function_code(1), Some(0x05));
        assert_eq!(RegisterType::Coil.write_function_code(8), Some(0x0F));
        assert_eq!(RegisterType::InputRegister.write_function_code(1), None);
    }

    #[test]
    fn test_register_type_from_str() {
        assert_eq!("hr".parse::<RegisterType>().unwrap(), RegisterType::HoldingRegister);
        assert_eq!(
            "HOLD_REGISTER".parse::<RegisterType>().unwrap(),
            RegisterType::HoldingRegister
        );
        assert_eq!("di".parse::<RegisterType>().unwrap(), RegisterType::DiscreteInput);
        assert!("xyz".parse::<RegisterType>().is_err());
    }

    #[test]
    fn test_serde_aliases() {
        let kind: RegisterType = serde_json::from_str("\"HOLD_REGISTER\"").unwrap();
        assert_eq!(kind, RegisterType::HoldingRegister);

        let data_type: ModbusDataType = serde_json::from_str("\"FLOAT32\"").unwrap();
        assert_eq!(data_type, ModbusDataType::Float32);

        let parity: Parity = serde_json::from_str("\"E\"").unwrap();
        assert_eq!(parity, Parity::Even);

        let direction: DataDirection = serde_json::from_str("\"RW\"").unwrap();
        assert_eq!(direction, DataDirection::ReadWrite);
    }

    #[test]
    fn test_data_direction() {
        assert_eq!(DataDirection::default(), DataDirection::Constant);
        assert!(DataDirection::Constant.is_readable());
        assert!(!DataDirection::Constant.is_writable());
        assert!(!DataDirection::Write.is_readable());
        assert!(DataDirection::ReadWrite.is_readable());
        assert!(DataDirection::ReadWrite.is_writable());
    }

    #[test]
    fn test_data_type_register_count() {
        assert_eq!(ModbusDataType::UInt16.register_count(), 1);
        assert_eq!(ModbusDataType::Float32.register_count(), 2);
        assert_eq!(ModbusDataType::Float64.register_count(), 4);
        assert_eq!("double".parse::<ModbusDataType>().unwrap(), ModbusDataType::Float64);
    }

    #[test]
    fn test_byte_order_default_and_parse() {
        assert_eq!(ByteOrder::default(), ByteOrder::BigEndian);
        assert_eq!("CDAB".parse::<ByteOrder>().unwrap(), ByteOrder::MidBigEndian);
        assert_eq!("little-endian".parse::<ByteOrder>().unwrap(), ByteOrder::LittleEndian);
    }

    #[test]
    fn test_tcp_config_builder() {
        let config = ModbusTcpConfig::builder()
            .host("10.0.0.5")
            .port(502)
            .unit_id(1)
            .operation_timeout(Duration::from_millis(500))
            .build()
            .unwrap();

        assert_eq!(config.socket_addr(), "10.0.0.5:502");
        assert_eq!(config.operation_timeout, Duration::from_millis(500));
        assert!(ModbusTcpConfig::builder().build().is_err());
    }

    #[test]
    fn test_rtu_config_validation() {
        let config = ModbusRtuConfig::builder()
            .port("/dev/ttyUSB0")
            .baud_rate(19200)
            .parity(Parity::Even)
            .build()
            .unwrap();
        assert_eq!(config.line_settings(), "19200/8E1");

        let custom = ModbusRtuConfig::builder()
            .port("/dev/ttyUSB0")
            .baud_rate(250_000)
            .build()
            .unwrap();
        assert_eq!(custom.line_settings(), "250000/8N1");

        let invalid = ModbusRtuConfig::builder().port("/dev/ttyUSB0").baud_rate(0).build();
        assert!(matches!(
            invalid,
            Err(ModbusError::Configuration(ConfigurationError::InvalidBaudRate { baud_rate: 0 }))
        ));
    }

    #[test]
    fn test_rtu_config_humantime() {
        let json = r#"{"port": "/dev/ttyUSB0", "timeout": "250ms"}"#;
        let config: ModbusRtuConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.parity, Parity::None);
    }
}
