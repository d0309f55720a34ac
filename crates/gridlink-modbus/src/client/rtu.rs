// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus RTU transport implementation.
//!
//! Serial communication uses `tokio-serial`; framing is done by
//! `tokio-modbus`. One RTU transport owns one serial line and may address
//! any slave on it, which is what allows a shared port to serve several
//! device interfaces.
//!
//! # Example
//!
//! ```rust,ignore
//! use gridlink_modbus::client::{ModbusRtuTransport, ModbusTransport};
//! use gridlink_modbus::types::{ModbusDataType, ModbusRtuConfig, Parity};
//!
//! let config = ModbusRtuConfig::builder()
//!     .port("/dev/ttyUSB0")
//!     .baud_rate(9600)
//!     .parity(Parity::Even)
//!     .build()?;
//!
//! let mut transport = ModbusRtuTransport::new(config);
//! transport.connect().await?;
//!
//! let value = transport.read_coils(3, 0, 1, ModbusDataType::Bool).await?;
//! ```

use async_trait::async_trait;
use tokio_modbus::client::Context as ModbusContext;
use tokio_modbus::prelude::*;
use tokio_serial::{
    DataBits as SerialDataBits, Parity as SerialParity, SerialPortBuilderExt,
    StopBits as SerialStopBits,
};

use crate::error::{ConnectionError, ModbusError, ModbusResult};
use crate::types::{DataBits, ModbusDataType, ModbusRtuConfig, Parity, RegisterType, StopBits};

use super::session::Session;
use super::transport::{ModbusTransport, TransportState};
use super::{ClientStats, TypedValue};

// =============================================================================
// ModbusRtuTransport
// =============================================================================

/// Modbus RTU transport using tokio-modbus over a serial port.
pub struct ModbusRtuTransport {
    config: ModbusRtuConfig,
    session: Session,
    state: TransportState,
}

impl ModbusRtuTransport {
    /// Creates a new RTU transport with the given configuration.
    pub fn new(config: ModbusRtuConfig) -> Self {
        let session = Session::new(config.byte_order, config.timeout);
        Self {
            config,
            session,
            state: TransportState::Disconnected,
        }
    }

    /// Creates an RTU transport with default line settings (9600 8N1).
    pub fn simple(port: impl Into<String>) -> Self {
        Self::new(ModbusRtuConfig::new(port))
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &ModbusRtuConfig {
        &self.config
    }

    /// Returns the serial port path.
    pub fn port(&self) -> &str {
        &self.config.port
    }

    /// Returns request statistics.
    pub fn stats(&self) -> &ClientStats {
        self.session.stats()
    }

    /// Converts DataBits to tokio-serial DataBits.
    fn convert_data_bits(bits: DataBits) -> SerialDataBits {
        match bits {
            DataBits::Five => SerialDataBits::Five,
            DataBits::Six => SerialDataBits::Six,
            DataBits::Seven => SerialDataBits::Seven,
            DataBits::Eight => SerialDataBits::Eight,
        }
    }

    /// Converts Parity to tokio-serial Parity.
    fn convert_parity(parity: Parity) -> SerialParity {
        match parity {
            Parity::None => SerialParity::None,
            Parity::Odd => SerialParity::Odd,
            Parity::Even => SerialParity::Even,
        }
    }

    /// Converts StopBits to tokio-serial StopBits.
    fn convert_stop_bits(bits: StopBits) -> SerialStopBits {
        match bits {
            StopBits::One => SerialStopBits::One,
            StopBits::Two => SerialStopBits::Two,
        }
    }

    /// Maps a serial open failure.
    fn map_serial_error(&self, error: tokio_serial::Error) -> ModbusError {
        let port = self.config.port.clone();
        let error = match error.kind {
            tokio_serial::ErrorKind::NoDevice => ConnectionError::SerialPortNotFound { port },
            tokio_serial::ErrorKind::Io(std::io::ErrorKind::NotFound) => {
                ConnectionError::SerialPortNotFound { port }
            }
            tokio_serial::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
                ConnectionError::SerialPortAccessDenied { port }
            }
            _ => ConnectionError::SerialConfigurationFailed {
                port,
                message: error.to_string(),
            },
        };
        ModbusError::connection(error)
    }

    fn open(&self) -> ModbusResult<ModbusContext> {
        let serial = tokio_serial::new(&self.config.port, self.config.baud_rate)
            .data_bits(Self::convert_data_bits(self.config.data_bits))
            .parity(Self::convert_parity(self.config.parity))
            .stop_bits(Self::convert_stop_bits(self.config.stop_bits))
            .open_native_async()
            .map_err(|e| self.map_serial_error(e))?;

        Ok(rtu::attach_slave(serial, Slave(self.config.unit_id)))
    }
}

#[async_trait]
impl ModbusTransport for ModbusRtuTransport {
    async fn connect(&mut self) -> ModbusResult<()> {
        if self.session.is_attached() {
            return Ok(());
        }

        self.state = TransportState::Connecting;

        match self.open() {
            Ok(ctx) => {
                self.session.attach(ctx);
                self.state = TransportState::Connected;

                tracing::info!(
                    port = %self.config.port,
                    line = %self.config.line_settings(),
                    "Connected to Modbus RTU line"
                );
                Ok(())
            }
            Err(e) => {
                self.state = TransportState::Error;
                Err(e)
            }
        }
    }

    async fn disconnect(&mut self) -> ModbusResult<()> {
        if !self.session.is_attached() {
            self.state = TransportState::Disconnected;
            return Ok(());
        }

        self.session.detach().await;
        self.state = TransportState::Disconnected;

        tracing::debug!(port = %self.config.port, "Disconnected from Modbus RTU line");

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.session.is_attached()
    }

    fn state(&self) -> TransportState {
        self.state
    }

    async fn read_input_registers(
        &mut self,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        self.session
            .read_registers(RegisterType::InputRegister, slave_id, address, size, data_type)
            .await
    }

    async fn read_holding_registers(
        &mut self,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        self.session
            .read_registers(RegisterType::HoldingRegister, slave_id, address, size, data_type)
            .await
    }

    async fn read_coils(
        &mut self,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        self.session
            .read_bits(RegisterType::Coil, slave_id, address, size, data_type)
            .await
    }

    async fn read_discrete_inputs(
        &mut self,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        self.session
            .read_bits(RegisterType::DiscreteInput, slave_id, address, size, data_type)
            .await
    }

    async fn write_holding_registers(
        &mut self,
        slave_id: u8,
        address: u16,
        data_type: ModbusDataType,
        value: &TypedValue,
    ) -> ModbusResult<()> {
        self.session
            .write_registers(slave_id, address, data_type, value)
            .await
    }

    async fn write_coils(
        &mut self,
        slave_id: u8,
        address: u16,
        data_type: ModbusDataType,
        value: &TypedValue,
    ) -> ModbusResult<()> {
        self.session.write_bits(slave_id, address, data_type, value).await
    }

    fn display_name(&self) -> String {
        format!(
            "Modbus RTU {} ({})",
            self.config.port,
            self.config.line_settings()
        )
    }
}

impl std::fmt::Debug for ModbusRtuTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModbusRtuTransport")
            .field("port", &self.config.port)
            .field("baud_rate", &self.config.baud_rate)
            .field("parity", &self.config.parity)
            .field("state", &self.state)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
