// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Transport contract required by device interfaces.
//!
//! A [`ModbusTransport`] performs typed register and coil I/O for any slave
//! on its line. Decoding (byte order, width) is the transport's job; device
//! interfaces only route calls to it. Transports are constructed through a
//! [`TransportFactory`] so the registry and interface builders can be fed
//! recording mocks in tests.

use std::fmt;

use async_trait::async_trait;

use crate::error::ModbusResult;
use crate::types::{ModbusDataType, ModbusRtuConfig, ModbusTcpConfig};

use super::TypedValue;

// =============================================================================
// TransportState
// =============================================================================

/// Connection state of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportState {
    /// Transport is disconnected.
    #[default]
    Disconnected,
    /// Transport is connecting.
    Connecting,
    /// Transport is connected and ready.
    Connected,
    /// The last connect attempt failed.
    Error,
}

impl TransportState {
    /// Returns `true` if the transport is connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

// =============================================================================
// ModbusTransport Trait
// =============================================================================

/// Typed Modbus transport.
///
/// Every call names its slave so one transport can serve several devices on
/// a shared serial line. Operations take `&mut self`; callers serialize access
/// through the lock held by their [`ClientWrapper`](super::ClientWrapper).
///
/// `connect` and `disconnect` must be idempotent: calling either while
/// already in the target state is a successful no-op.
///
/// Transports are `Send` but not necessarily `Sync`; they are only reached
/// through the wrapper's mutex.
#[async_trait]
pub trait ModbusTransport: Send {
    // =========================================================================
    // Connection Management
    // =========================================================================

    /// Opens the physical connection.
    async fn connect(&mut self) -> ModbusResult<()>;

    /// Closes the physical connection.
    async fn disconnect(&mut self) -> ModbusResult<()>;

    /// Returns `true` if the physical connection is open.
    fn is_connected(&self) -> bool;

    /// Returns the current transport state.
    fn state(&self) -> TransportState;

    // =========================================================================
    // Read Operations (Function Codes 1-4)
    // =========================================================================

    /// Reads `size` input registers (FC 04) and decodes them as `data_type`.
    async fn read_input_registers(
        &mut self,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue>;

    /// Reads `size` holding registers (FC 03) and decodes them as `data_type`.
    async fn read_holding_registers(
        &mut self,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue>;

    /// Reads `size` coils (FC 01).
    async fn read_coils(
        &mut self,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue>;

    /// Reads `size` discrete inputs (FC 02).
    async fn read_discrete_inputs(
        &mut self,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue>;

    // =========================================================================
    // Write Operations (Function Codes 5, 6, 15, 16)
    // =========================================================================

    /// Encodes `value` as `data_type` and writes it to holding registers
    /// (FC 06 for one register, FC 16 otherwise).
    async fn write_holding_registers(
        &mut self,
        slave_id: u8,
        address: u16,
        data_type: ModbusDataType,
        value: &TypedValue,
    ) -> ModbusResult<()>;

    /// Writes `value` to coils (FC 05 for one coil, FC 15 otherwise).
    async fn write_coils(
        &mut self,
        slave_id: u8,
        address: u16,
        data_type: ModbusDataType,
        value: &TypedValue,
    ) -> ModbusResult<()>;

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Returns a display name for this transport.
    fn display_name(&self) -> String;
}

// =============================================================================
// TransportFactory
// =============================================================================

/// Constructs transports from configuration.
///
/// Construction never touches the wire; the connection opens on the first
/// `connect`.
pub trait TransportFactory: Send + Sync {
    /// Creates a Modbus TCP transport.
    fn tcp(&self, config: &ModbusTcpConfig) -> Box<dyn ModbusTransport>;

    /// Creates a Modbus RTU transport.
    fn rtu(&self, config: &ModbusRtuConfig) -> Box<dyn ModbusTransport>;
}

/// Factory producing the `tokio-modbus` backed transports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeTransportFactory;

impl TransportFactory for NativeTransportFactory {
    fn tcp(&self, config: &ModbusTcpConfig) -> Box<dyn ModbusTransport> {
        Box::new(super::ModbusTcpTransport::new(config.clone()))
    }

    fn rtu(&self, config: &ModbusRtuConfig) -> Box<dyn ModbusTransport> {
        Box::new(super::ModbusRtuTransport::new(config.clone()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_state() {
        assert!(TransportState::Connected.is_connected());
        assert!(!TransportState::Disconnected.is_connected());
        assert!(!TransportState::Error.is_connected());
        assert_eq!(TransportState::default(), TransportState::Disconnected);
    }

    #[test]
    fn test_transport_state_display() {
        assert_eq!(TransportState::Connected.to_string(), "connected");
        assert_eq!(TransportState::Disconnected.to_string(), "disconnected");
    }

    #[test]
    fn test_native_factory_builds_disconnected_transports() {
        let factory = NativeTransportFactory;

        let tcp = factory.tcp(&ModbusTcpConfig::with_port("127.0.0.1", 502));
        assert!(!tcp.is_connected());
        assert!(tcp.display_name().contains("127.0.0.1:502"));

        let rtu = factory.rtu(&ModbusRtuConfig::new("/dev/ttyUSB0"));
        assert_eq!(rtu.state(), TransportState::Disconnected);
        assert!(rtu.display_name().contains("/dev/ttyUSB0"));
    }
}
