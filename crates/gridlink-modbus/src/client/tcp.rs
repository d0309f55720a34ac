// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus TCP transport implementation.
//!
//! This module provides the TCP transport for Modbus communication using
//! the `tokio-modbus` crate as the underlying implementation.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_modbus::client::Context as ModbusContext;
use tokio_modbus::prelude::*;

use crate::error::{ConnectionError, ModbusError, ModbusResult};
use crate::types::{ModbusDataType, ModbusTcpConfig, RegisterType};

use super::session::Session;
use super::transport::{ModbusTransport, TransportState};
use super::{ClientStats, TypedValue};

// =============================================================================
// ModbusTcpTransport
// =============================================================================

/// Modbus TCP transport using tokio-modbus.
///
/// The slave addressed by each request is chosen per call; the configured
/// `unit_id` only seeds the initial context.
///
/// # Example
///
/// ```rust,ignore
/// use gridlink_modbus::client::{ModbusTcpTransport, ModbusTransport};
/// use gridlink_modbus::types::{ModbusDataType, ModbusTcpConfig};
///
/// let config = ModbusTcpConfig::builder()
///     .host("192.168.1.100")
///     .port(502)
///     .build()?;
///
/// let mut transport = ModbusTcpTransport::new(config);
/// transport.connect().await?;
///
/// let value = transport
///     .read_holding_registers(1, 100, 2, ModbusDataType::Float32)
///     .await?;
/// ```
pub struct ModbusTcpTransport {
    config: ModbusTcpConfig,
    session: Session,
    state: TransportState,
}

impl ModbusTcpTransport {
    /// Creates a new TCP transport with the given configuration.
    pub fn new(config: ModbusTcpConfig) -> Self {
        let session = Session::new(config.byte_order, config.operation_timeout);
        Self {
            config,
            session,
            state: TransportState::Disconnected,
        }
    }

    /// Creates a simple TCP transport with host and port.
    pub fn simple(host: impl Into<String>, port: u16) -> Self {
        Self::new(ModbusTcpConfig::with_port(host, port))
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &ModbusTcpConfig {
        &self.config
    }

    /// Returns the socket address.
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Returns request statistics.
    pub fn stats(&self) -> &ClientStats {
        self.session.stats()
    }

    /// Returns the last request error, if the most recent request failed.
    pub fn last_error(&self) -> Option<&str> {
        self.session.last_error()
    }

    /// Resolves the socket address.
    async fn resolve_address(config: &ModbusTcpConfig) -> ModbusResult<SocketAddr> {
        let addr_str = config.socket_addr();

        if let Ok(addr) = addr_str.parse::<SocketAddr>() {
            return Ok(addr);
        }

        let mut addrs = tokio::net::lookup_host(&addr_str).await.map_err(|e| {
            ModbusError::connection(ConnectionError::DnsResolutionFailed {
                hostname: config.host.clone(),
                source: Some(e),
            })
        })?;

        addrs.next().ok_or_else(|| {
            ModbusError::connection(ConnectionError::DnsResolutionFailed {
                hostname: config.host.clone(),
                source: None,
            })
        })
    }

    /// Opens a context from an owned copy of the configuration.
    async fn open(config: ModbusTcpConfig) -> ModbusResult<ModbusContext> {
        let socket_addr = Self::resolve_address(&config).await?;

        let connect_future = async {
            let stream = TcpStream::connect(socket_addr).await.map_err(|e| {
                ModbusError::connection(ConnectionError::refused_with(&config.host, config.port, e))
            })?;

            stream.set_nodelay(config.tcp_nodelay).ok();

            Ok::<_, ModbusError>(tcp::attach_slave(stream, Slave(config.unit_id)))
        };

        timeout(config.connect_timeout, connect_future)
            .await
            .map_err(|_| {
                ModbusError::connection(ConnectionError::timed_out(
                    &config.host,
                    config.port,
                    config.connect_timeout,
                ))
            })?
    }
}

#[async_trait]
impl ModbusTransport for ModbusTcpTransport {
    async fn connect(&mut self) -> ModbusResult<()> {
        if self.session.is_attached() {
            return Ok(());
        }

        self.state = TransportState::Connecting;

        match Self::open(self.config.clone()).await {
            Ok(ctx) => {
                self.session.attach(ctx);
                self.state = TransportState::Connected;

                tracing::info!(
                    host = %self.config.host,
                    port = self.config.port,
                    "Connected to Modbus TCP device"
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

        tracing::debug!(
            host = %self.config.host,
            port = self.config.port,
            "Disconnected from Modbus TCP device"
        );

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
        format!("Modbus TCP {}:{}", self.config.host, self.config.port)
    }
}

impl std::fmt::Debug for ModbusTcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModbusTcpTransport")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("byte_order", &self.config.byte_order)
            .field("state", &self.state)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_simple_constructor() {
        let transport = ModbusTcpTransport::simple("127.0.0.1", 502);
        assert_eq!(transport.config().host, "127.0.0.1");
        assert_eq!(transport.config().port, 502);
        assert_eq!(transport.state(), TransportState::Disconnected);
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_socket_addr() {
        let transport = ModbusTcpTransport::simple("192.168.1.100", 502);
        assert_eq!(transport.socket_addr(), "192.168.1.100:502");
    }

    #[test]
    fn test_display_name() {
        let config = ModbusTcpConfig::builder()
            .host("plc.local")
            .port(1502)
            .build()
            .unwrap();
        let transport = ModbusTcpTransport::new(config);
        assert_eq!(transport.display_name(), "Modbus TCP plc.local:1502");
    }

    #[tokio::test]
    async fn test_disconnect_when_disconnected_is_noop() {
        let mut transport = ModbusTcpTransport::simple("127.0.0.1", 502);
        transport.disconnect().await.unwrap();
        transport.disconnect().await.unwrap();
        assert_eq!(transport.state(), TransportState::Disconnected);
    }

    #[tokio::test]
    async fn test_read_without_connect_fails() {
        let mut transport = ModbusTcpTransport::simple("127.0.0.1", 502);
        let err = transport
            .read_holding_registers(1, 100, 2, ModbusDataType::Float32)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ModbusError::Connection(ConnectionError::NotConnected)
        ));
        assert_eq!(transport.stats().failed_requests(), 1);
    }

    #[tokio::test]
    async fn test_connect_refused_sets_error_state() {
        // Bind then drop a listener to obtain a port with nothing behind it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ModbusTcpConfig::builder()
            .host("127.0.0.1")
            .port(port)
            .connect_timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        let mut transport = ModbusTcpTransport::new(config);

        let err = transport.connect().await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(transport.state(), TransportState::Error);
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_boxed_transport_connects_on_spawned_task() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ModbusTcpConfig::builder()
            .host("localhost")
            .port(port)
            .connect_timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        let mut transport: Box<dyn ModbusTransport> = Box::new(ModbusTcpTransport::new(config));

        let (result, transport) = tokio::spawn(async move {
            let result = transport.connect().await;
            (result, transport)
        })
        .await
        .unwrap();

        assert!(result.unwrap_err().is_transport());
        assert_eq!(transport.state(), TransportState::Error);
    }

    #[test]
    fn test_debug_impl() {
        let transport = ModbusTcpTransport::simple("127.0.0.1", 502);
        let debug_str = format!("{:?}", transport);
        assert!(debug_str.contains("127.0.0.1"));
        assert!(debug_str.contains("502"));
    }
}
