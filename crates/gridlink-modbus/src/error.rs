// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for device interfaces, the shared client registry and the
//! Modbus transports.
//!
//! Every failure surfaced by this crate is a [`ModbusError`]. The variants
//! separate construction-time problems (a malformed frame, a conflicting
//! shared port) from per-call failures (direction violations, transport
//! faults, timeouts) so callers can decide what to do with each.
//!
//! # Error Categories
//!
//! ```text
//! ModbusError
//! ├── Configuration        - malformed frame, shared-port parameter mismatch
//! ├── UnsupportedOperation - register kind not valid for the request
//! ├── Direction            - read of a write-only point, write of a read-only point
//! ├── ResourceState        - unaddressed data point, released interface
//! ├── Connection           - transport I/O failures
//! ├── Protocol             - Modbus exception responses
//! ├── Conversion           - value encode/decode failures
//! └── Timeout              - transport call exceeded its deadline
//! ```
//!
//! # Examples
//!
//! ```
//! use gridlink_modbus::error::{ConnectionError, ErrorSeverity, ModbusError};
//!
//! let error = ModbusError::connection(ConnectionError::refused("10.0.0.5", 502));
//! assert!(error.is_transport());
//! assert_eq!(error.severity(), ErrorSeverity::Error);
//! assert_eq!(error.error_code().to_string(), "GL-0101");
//! ```

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;
use tracing::Level;

use crate::types::{DataDirection, ModbusDataType, RegisterType};

// =============================================================================
// ModbusError - Main Error Type
// =============================================================================

/// The main error type for gridlink Modbus operations.
#[derive(Debug, Error)]
pub enum ModbusError {
    /// Malformed or incomplete device frame, or a shared-port mismatch.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// The register kind does not support the requested operation.
    #[error("{0}")]
    UnsupportedOperation(#[from] UnsupportedOperationError),

    /// The data point direction forbids the requested operation.
    #[error("{0}")]
    Direction(#[from] DirectionError),

    /// The target is not in a state that allows I/O.
    #[error("{0}")]
    ResourceState(#[from] ResourceStateError),

    /// Transport I/O failure.
    #[error("{0}")]
    Connection(#[from] ConnectionError),

    /// Modbus protocol failure reported by the device.
    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    /// Value could not be encoded into or decoded from registers.
    #[error("{0}")]
    Conversion(#[from] ConversionError),

    /// Transport call exceeded its deadline.
    #[error("{0}")]
    Timeout(#[from] TimeoutError),
}

impl ModbusError {
    // =========================================================================
    // Factory Methods
    // =========================================================================

    /// Creates a configuration error.
    #[inline]
    pub fn configuration(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }

    /// Creates an unsupported operation error.
    #[inline]
    pub fn unsupported(error: UnsupportedOperationError) -> Self {
        Self::UnsupportedOperation(error)
    }

    /// Creates a direction error.
    #[inline]
    pub fn direction(error: DirectionError) -> Self {
        Self::Direction(error)
    }

    /// Creates a resource state error.
    #[inline]
    pub fn resource_state(error: ResourceStateError) -> Self {
        Self::ResourceState(error)
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(error: ConnectionError) -> Self {
        Self::Connection(error)
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(error: ProtocolError) -> Self {
        Self::Protocol(error)
    }

    /// Creates a conversion error.
    #[inline]
    pub fn conversion(error: ConversionError) -> Self {
        Self::Conversion(error)
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(error: TimeoutError) -> Self {
        Self::Timeout(error)
    }

    // =========================================================================
    // Convenience Factory Methods
    // =========================================================================

    /// Creates a not connected error.
    pub fn not_connected() -> Self {
        Self::Connection(ConnectionError::NotConnected)
    }

    /// Creates a missing field configuration error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::Configuration(ConfigurationError::missing_field(field))
    }

    /// Creates a read timeout.
    pub fn read_timeout(duration: Duration) -> Self {
        Self::Timeout(TimeoutError::read(duration))
    }

    /// Creates a write timeout.
    pub fn write_timeout(duration: Duration) -> Self {
        Self::Timeout(TimeoutError::write(duration))
    }

    /// Creates an exception response error.
    pub fn exception(function_code: u8, exception_code: u8) -> Self {
        Self::Protocol(ProtocolError::exception_response(function_code, exception_code))
    }

    /// Creates a data type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::Conversion(ConversionError::type_mismatch(expected, actual))
    }

    // =========================================================================
    // Error Properties
    // =========================================================================

    /// Returns `true` for failures that originate in the transport
    /// (I/O, protocol exceptions and timeouts).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Protocol(_) | Self::Timeout(_)
        )
    }

    /// Returns `true` if repeating the same call could succeed.
    ///
    /// This is advisory. Nothing in this crate retries on its own; a failed
    /// read has no side effect, and a failed write must be treated as not
    /// applied.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(e) => e.is_retryable(),
            Self::Protocol(e) => e.is_retryable(),
            Self::Timeout(_) => true,
            Self::Configuration(_)
            | Self::UnsupportedOperation(_)
            | Self::Direction(_)
            | Self::ResourceState(_)
            | Self::Conversion(_) => false,
        }
    }

    /// Returns the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Connection(e) => e.severity(),
            Self::Protocol(e) => e.severity(),
            Self::Timeout(_) => ErrorSeverity::Warning,
            Self::Direction(_) | Self::UnsupportedOperation(_) => ErrorSeverity::Error,
            Self::ResourceState(_) | Self::Conversion(_) => ErrorSeverity::Error,
            Self::Configuration(_) => ErrorSeverity::Critical,
        }
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::UnsupportedOperation(_) => "unsupported_operation",
            Self::Direction(_) => "direction",
            Self::ResourceState(_) => "resource_state",
            Self::Connection(_) => "connection",
            Self::Protocol(_) => "protocol",
            Self::Conversion(_) => "conversion",
            Self::Timeout(_) => "timeout",
        }
    }

    /// Returns a unique error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Configuration(e) => e.error_code(),
            Self::UnsupportedOperation(e) => e.error_code(),
            Self::Direction(e) => e.error_code(),
            Self::ResourceState(e) => e.error_code(),
            Self::Connection(e) => e.error_code(),
            Self::Protocol(e) => e.error_code(),
            Self::Conversion(e) => e.error_code(),
            Self::Timeout(e) => e.error_code(),
        }
    }

    /// Returns recovery hints for this error.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::Configuration(e) => e.recovery_hints(),
            Self::Connection(e) => e.recovery_hints(),
            Self::Protocol(e) => e.recovery_hints(),
            Self::Timeout(_) => vec![
                "Check the device is powered and responding",
                "Increase the operation timeout",
            ],
            Self::Direction(_) => vec!["Check the data point direction in the device frame"],
            Self::UnsupportedOperation(_) => {
                vec!["Input registers and discrete inputs are read-only on the wire"]
            }
            Self::ResourceState(_) => vec![
                "Check the data point has an address, size, data type and register type",
                "Do not use data points after releasing their interface",
            ],
            Self::Conversion(_) => vec!["Check the data type and register count of the data point"],
        }
    }

    /// Returns the tracing level for this error.
    pub fn tracing_level(&self) -> Level {
        self.severity().to_tracing_level()
    }

    /// Logs this error with appropriate level and context.
    pub fn log(&self, context: &str) {
        let level = self.tracing_level();
        let code = self.error_code();

        match level {
            Level::ERROR => tracing::error!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            Level::WARN => tracing::warn!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            _ => tracing::debug!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
        }
    }
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Specification and parameter errors raised while building interfaces or
/// registering shared clients.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The frame declares no Modbus TCP or RTU transport.
    #[error("Device frame declares no Modbus TCP or RTU transport")]
    MissingTransport,

    /// The frame declares an interface this crate cannot drive.
    #[error("Unsupported device interface: {interface}")]
    UnsupportedInterface {
        /// Interface name (e.g. `rest_api`).
        interface: String,
    },

    /// Missing required field.
    #[error("Missing required configuration: {field}")]
    MissingField {
        /// The missing field.
        field: String,
    },

    /// A field holds a value that cannot be used.
    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Offending value.
        value: String,
        /// Reason.
        reason: String,
    },

    /// Invalid unit ID.
    #[error("Invalid unit ID: {unit_id} (valid range: 1-247)")]
    InvalidUnitId {
        /// The invalid unit ID.
        unit_id: u8,
    },

    /// Invalid baud rate.
    #[error("Invalid baud rate: {baud_rate}")]
    InvalidBaudRate {
        /// The invalid baud rate.
        baud_rate: u32,
    },

    /// Invalid timeout.
    #[error("Invalid timeout: {duration:?} ({reason})")]
    InvalidTimeout {
        /// The invalid duration.
        duration: Duration,
        /// Reason.
        reason: String,
    },

    /// A pooled serial port is already open with different line settings.
    #[error(
        "Shared port '{port}' is already registered with {field} {existing}, requested {requested}"
    )]
    SharedPortMismatch {
        /// Serial port identifier.
        port: String,
        /// Mismatching setting.
        field: &'static str,
        /// Setting of the existing entry.
        existing: String,
        /// Setting of the rejected request.
        requested: String,
    },
}

impl ConfigurationError {
    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsupported interface error.
    pub fn unsupported_interface(interface: impl Into<String>) -> Self {
        Self::UnsupportedInterface {
            interface: interface.into(),
        }
    }

    /// Creates an invalid unit ID error.
    pub fn invalid_unit_id(unit_id: u8) -> Self {
        Self::InvalidUnitId { unit_id }
    }

    /// Creates a shared port mismatch error.
    pub fn shared_port_mismatch(
        port: impl Into<String>,
        field: &'static str,
        existing: impl fmt::Display,
        requested: impl fmt::Display,
    ) -> Self {
        Self::SharedPortMismatch {
            port: port.into(),
            field,
            existing: existing.to_string(),
            requested: requested.to_string(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingTransport => ErrorCode::new(5, 1),
            Self::UnsupportedInterface { .. } => ErrorCode::new(5, 2),
            Self::MissingField { .. } => ErrorCode::new(5, 3),
            Self::InvalidValue { .. } => ErrorCode::new(5, 4),
            Self::InvalidUnitId { .. } => ErrorCode::new(5, 5),
            Self::InvalidBaudRate { .. } => ErrorCode::new(5, 6),
            Self::InvalidTimeout { .. } => ErrorCode::new(5, 7),
            Self::SharedPortMismatch { .. } => ErrorCode::new(5, 8),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::MissingTransport | Self::MissingField { .. } => vec![
                "TCP needs address, port and slave id",
                "RTU needs port name, baud rate, parity and slave id",
            ],
            Self::UnsupportedInterface { .. } => {
                vec!["Only Modbus TCP and RTU device frames can be driven"]
            }
            Self::SharedPortMismatch { .. } => vec![
                "All devices on one serial line must use the same baud rate and parity",
                "Check the frames of every device sharing the port",
            ],
            Self::InvalidUnitId { .. } => vec!["Unit ID should be 1-247 for standard Modbus"],
            _ => vec!["Check the device frame"],
        }
    }
}

// =============================================================================
// UnsupportedOperationError
// =============================================================================

/// Operations the addressed register kind cannot perform.
#[derive(Debug, Error)]
pub enum UnsupportedOperationError {
    /// Write to an input register or discrete input.
    #[error("Cannot write to {register_type} at address {address}: register kind is read-only")]
    ReadOnlyRegister {
        /// Register kind.
        register_type: RegisterType,
        /// Register address.
        address: u16,
    },

    /// The data type cannot be carried by the register kind.
    #[error("Data type {data_type} is not supported on {register_type}")]
    DataType {
        /// Register kind.
        register_type: RegisterType,
        /// Requested data type.
        data_type: ModbusDataType,
    },
}

impl UnsupportedOperationError {
    /// Creates a read-only register error.
    pub fn read_only(register_type: RegisterType, address: u16) -> Self {
        Self::ReadOnlyRegister {
            register_type,
            address,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::ReadOnlyRegister { .. } => ErrorCode::new(3, 1),
            Self::DataType { .. } => ErrorCode::new(3, 2),
        }
    }
}

// =============================================================================
// DirectionError
// =============================================================================

/// Direction violations on a data point.
#[derive(Debug, Error)]
pub enum DirectionError {
    /// Read of a write-only data point.
    #[error("Data point {profile}/{data_point} is not readable (direction {direction})")]
    NotReadable {
        /// Functional profile name.
        profile: String,
        /// Data point name.
        data_point: String,
        /// Declared direction.
        direction: DataDirection,
    },

    /// Write of a read-only or constant data point.
    #[error("Data point {profile}/{data_point} is not writable (direction {direction})")]
    NotWritable {
        /// Functional profile name.
        profile: String,
        /// Data point name.
        data_point: String,
        /// Declared direction.
        direction: DataDirection,
    },
}

impl DirectionError {
    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotReadable { .. } => ErrorCode::new(7, 1),
            Self::NotWritable { .. } => ErrorCode::new(7, 2),
        }
    }
}

// =============================================================================
// ResourceStateError
// =============================================================================

/// Operations on resources that cannot perform I/O.
#[derive(Debug, Error)]
pub enum ResourceStateError {
    /// The data point lacks part of its register layout.
    #[error("Data point {profile}/{data_point} has no {missing}")]
    Unaddressed {
        /// Functional profile name.
        profile: String,
        /// Data point name.
        data_point: String,
        /// Missing layout field.
        missing: &'static str,
    },

    /// The owning interface has been released or dropped.
    #[error("Device interface {device_id} has been released")]
    InterfaceReleased {
        /// Logical device identifier.
        device_id: String,
    },

    /// The client was closed for good, for example by a registry shutdown.
    #[error("Client {transport} has been closed and cannot reconnect")]
    ClientClosed {
        /// Transport display name.
        transport: String,
    },
}

impl ResourceStateError {
    /// Creates an unaddressed data point error.
    pub fn unaddressed(
        profile: impl Into<String>,
        data_point: impl Into<String>,
        missing: &'static str,
    ) -> Self {
        Self::Unaddressed {
            profile: profile.into(),
            data_point: data_point.into(),
            missing,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Unaddressed { .. } => ErrorCode::new(8, 1),
            Self::InterfaceReleased { .. } => ErrorCode::new(8, 2),
            Self::ClientClosed { .. } => ErrorCode::new(8, 3),
        }
    }
}

// =============================================================================
// ConnectionError
// =============================================================================

/// Transport I/O errors for TCP and RTU.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// TCP connection refused.
    #[error("Connection refused to {host}:{port}")]
    Refused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
        /// Underlying error.
        #[source]
        source: Option<io::Error>,
    },

    /// TCP connection timed out.
    #[error("Connection timed out to {host}:{port} after {duration:?}")]
    TimedOut {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
        /// Timeout duration.
        duration: Duration,
    },

    /// DNS resolution failed.
    #[error("Failed to resolve hostname '{hostname}'")]
    DnsResolutionFailed {
        /// The hostname that failed to resolve.
        hostname: String,
        /// Underlying error.
        #[source]
        source: Option<io::Error>,
    },

    /// Serial port not found (RTU).
    #[error("Serial port not found: {port}")]
    SerialPortNotFound {
        /// Port path.
        port: String,
    },

    /// Serial port access denied (RTU).
    #[error("Serial port access denied: {port}")]
    SerialPortAccessDenied {
        /// Port path.
        port: String,
    },

    /// Serial port could not be opened with the requested settings (RTU).
    #[error("Serial port configuration failed for '{port}': {message}")]
    SerialConfigurationFailed {
        /// Port path.
        port: String,
        /// Error message.
        message: String,
    },

    /// Connection closed unexpectedly.
    #[error("Connection closed unexpectedly")]
    Closed {
        /// Reason for closure.
        reason: Option<String>,
    },

    /// Not connected.
    #[error("Not connected to Modbus device")]
    NotConnected,

    /// Generic I/O error.
    #[error("I/O error: {message}")]
    Io {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl ConnectionError {
    /// Creates a connection refused error.
    pub fn refused(host: impl Into<String>, port: u16) -> Self {
        Self::Refused {
            host: host.into(),
            port,
            source: None,
        }
    }

    /// Creates a connection refused error with source.
    pub fn refused_with(host: impl Into<String>, port: u16, source: io::Error) -> Self {
        Self::Refused {
            host: host.into(),
            port,
            source: Some(source),
        }
    }

    /// Creates a connection timed out error.
    pub fn timed_out(host: impl Into<String>, port: u16, duration: Duration) -> Self {
        Self::TimedOut {
            host: host.into(),
            port,
            duration,
        }
    }

    /// Creates a connection closed error.
    pub fn closed(reason: Option<String>) -> Self {
        Self::Closed { reason }
    }

    /// Creates an I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Refused { .. }
            | Self::TimedOut { .. }
            | Self::DnsResolutionFailed { .. }
            | Self::Closed { .. }
            | Self::NotConnected => true,
            Self::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::Interrupted
            ),
            Self::SerialPortNotFound { .. }
            | Self::SerialPortAccessDenied { .. }
            | Self::SerialConfigurationFailed { .. } => false,
        }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotConnected | Self::TimedOut { .. } | Self::Closed { .. } => {
                ErrorSeverity::Warning
            }
            Self::SerialPortAccessDenied { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Refused { .. } => ErrorCode::new(1, 1),
            Self::TimedOut { .. } => ErrorCode::new(1, 2),
            Self::DnsResolutionFailed { .. } => ErrorCode::new(1, 3),
            Self::SerialPortNotFound { .. } => ErrorCode::new(1, 5),
            Self::SerialPortAccessDenied { .. } => ErrorCode::new(1, 6),
            Self::SerialConfigurationFailed { .. } => ErrorCode::new(1, 7),
            Self::Closed { .. } => ErrorCode::new(1, 8),
            Self::NotConnected => ErrorCode::new(1, 9),
            Self::Io { .. } => ErrorCode::new(1, 10),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::Refused { .. } => vec![
                "Check if the Modbus device is powered on",
                "Verify the IP address and port are correct",
            ],
            Self::TimedOut { .. } => vec![
                "Check network connectivity to the device",
                "Increase the connection timeout setting",
            ],
            Self::DnsResolutionFailed { .. } => vec!["Try using an IP address instead"],
            Self::SerialPortNotFound { .. } => vec![
                "Verify the serial port path is correct",
                "Check if the USB-to-Serial adapter is connected",
            ],
            Self::SerialPortAccessDenied { .. } => vec!["Add user to the 'dialout' group on Linux"],
            Self::SerialConfigurationFailed { .. } => {
                vec!["Verify baud rate, parity, data bits and stop bits match the device"]
            }
            Self::NotConnected => vec!["Call connect() before performing operations"],
            Self::Closed { .. } | Self::Io { .. } => vec!["Reconnect and retry the operation"],
        }
    }
}

impl From<io::Error> for ConnectionError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotConnected => Self::NotConnected,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => Self::Closed {
                reason: Some(error.to_string()),
            },
            _ => Self::Io {
                message: error.to_string(),
                source: error,
            },
        }
    }
}

// =============================================================================
// ProtocolError
// =============================================================================

/// Modbus protocol-level errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Modbus exception response received.
    #[error("Modbus exception: function code {function_code:#04x}, exception {exception_code} ({exception_name})")]
    ExceptionResponse {
        /// The function code that caused the exception.
        function_code: u8,
        /// The exception code.
        exception_code: u8,
        /// Human-readable exception name.
        exception_name: String,
    },

    /// Response did not match the request.
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        /// Error message.
        message: String,
    },
}

impl ProtocolError {
    /// Creates an exception response error.
    pub fn exception_response(function_code: u8, exception_code: u8) -> Self {
        Self::ExceptionResponse {
            function_code,
            exception_code,
            exception_name: Self::exception_name(exception_code).to_string(),
        }
    }

    /// Creates an unexpected response error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            message: message.into(),
        }
    }

    /// Returns the human-readable name for an exception code.
    pub fn exception_name(code: u8) -> &'static str {
        match code {
            0x01 => "Illegal Function",
            0x02 => "Illegal Data Address",
            0x03 => "Illegal Data Value",
            0x04 => "Slave Device Failure",
            0x05 => "Acknowledge",
            0x06 => "Slave Device Busy",
            0x08 => "Memory Parity Error",
            0x0A => "Gateway Path Unavailable",
            0x0B => "Gateway Target Device Failed to Respond",
            _ => "Unknown Exception",
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ExceptionResponse { exception_code, .. } => {
                matches!(exception_code, 0x05 | 0x06 | 0x0B)
            }
            Self::UnexpectedResponse { .. } => true,
        }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ExceptionResponse { exception_code, .. } => match exception_code {
                0x05 | 0x06 => ErrorSeverity::Warning,
                0x01..=0x03 => ErrorSeverity::Error,
                _ => ErrorSeverity::Critical,
            },
            Self::UnexpectedResponse { .. } => ErrorSeverity::Warning,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::ExceptionResponse { exception_code, .. } => ErrorCode::new(2, *exception_code),
            Self::UnexpectedResponse { .. } => ErrorCode::new(2, 28),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::ExceptionResponse { exception_code, .. } => match exception_code {
                0x01 => vec!["The function code is not supported by this device"],
                0x02 => vec![
                    "The register address is out of range",
                    "Check the device memory map against the frame",
                ],
                0x03 => vec!["The value is not valid for this register"],
                0x06 => vec!["The device is busy, retry after a delay"],
                _ => vec!["Check device status and documentation"],
            },
            Self::UnexpectedResponse { .. } => vec!["Check the slave id and serial settings"],
        }
    }
}

// =============================================================================
// ConversionError
// =============================================================================

/// Data type conversion errors.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Type mismatch.
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type.
        expected: String,
        /// Actual type.
        actual: String,
    },

    /// Not enough data.
    #[error("Not enough data: expected {expected} bytes, got {actual}")]
    InsufficientData {
        /// Expected bytes.
        expected: usize,
        /// Actual bytes.
        actual: usize,
    },

    /// Value overflow.
    #[error("Value overflow: {value} exceeds range for {target_type}")]
    Overflow {
        /// The value that overflowed.
        value: String,
        /// Target type.
        target_type: String,
    },

    /// Invalid string encoding.
    #[error("Invalid string encoding: {message}")]
    InvalidEncoding {
        /// Error message.
        message: String,
    },
}

impl ConversionError {
    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an insufficient data error.
    pub fn insufficient_data(expected: usize, actual: usize) -> Self {
        Self::InsufficientData { expected, actual }
    }

    /// Creates an overflow error.
    pub fn overflow(value: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self::Overflow {
            value: value.into(),
            target_type: target_type.into(),
        }
    }

    /// Creates an invalid encoding error.
    pub fn invalid_encoding(message: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            message: message.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::TypeMismatch { .. } => ErrorCode::new(4, 1),
            Self::InsufficientData { .. } => ErrorCode::new(4, 2),
            Self::Overflow { .. } => ErrorCode::new(4, 3),
            Self::InvalidEncoding { .. } => ErrorCode::new(4, 4),
        }
    }
}

// =============================================================================
// TimeoutError
// =============================================================================

/// Timeout errors.
#[derive(Debug, Error)]
pub enum TimeoutError {
    /// Connection timeout.
    #[error("Connection timed out after {duration:?}")]
    Connection {
        /// Timeout duration.
        duration: Duration,
    },

    /// Read operation timeout.
    #[error("Read operation timed out after {duration:?}")]
    Read {
        /// Timeout duration.
        duration: Duration,
    },

    /// Write operation timeout.
    #[error("Write operation timed out after {duration:?}")]
    Write {
        /// Timeout duration.
        duration: Duration,
    },
}

impl TimeoutError {
    /// Creates a connection timeout.
    pub fn connection(duration: Duration) -> Self {
        Self::Connection { duration }
    }

    /// Creates a read timeout.
    pub fn read(duration: Duration) -> Self {
        Self::Read { duration }
    }

    /// Creates a write timeout.
    pub fn write(duration: Duration) -> Self {
        Self::Write { duration }
    }

    /// Returns the timeout duration.
    pub fn duration(&self) -> Duration {
        match self {
            Self::Connection { duration } | Self::Read { duration } | Self::Write { duration } => {
                *duration
            }
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Connection { .. } => ErrorCode::new(6, 1),
            Self::Read { .. } => ErrorCode::new(6, 2),
            Self::Write { .. } => ErrorCode::new(6, 3),
        }
    }
}

// =============================================================================
// ErrorSeverity
// =============================================================================

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational - no action required.
    Info,
    /// Warning - action may be required.
    Warning,
    /// Error - action required, but recoverable.
    Error,
    /// Critical - immediate action required.
    Critical,
}

impl ErrorSeverity {
    /// Converts to tracing level.
    pub fn to_tracing_level(self) -> Level {
        match self {
            Self::Info => Level::INFO,
            Self::Warning => Level::WARN,
            Self::Error | Self::Critical => Level::ERROR,
        }
    }

    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// ErrorCode
// =============================================================================

/// Structured error code for categorization.
///
/// Categories: 1=connection, 2=protocol, 3=unsupported operation,
/// 4=conversion, 5=configuration, 6=timeout, 7=direction, 8=resource state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// Category.
    pub category: u8,
    /// Specific error within category.
    pub code: u8,
}

impl ErrorCode {
    /// Creates a new error code.
    pub const fn new(category: u8, code: u8) -> Self {
        Self { category, code }
    }

    /// Returns the full error code as a u16.
    pub fn as_u16(&self) -> u16 {
        ((self.category as u16) << 8) | (self.code as u16)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GL-{:02X}{:02X}", self.category, self.code)
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// A Result type with ModbusError.
pub type ModbusResult<T> = Result<T, ModbusError>;

// =============================================================================
// Tests
// =============================================================================
