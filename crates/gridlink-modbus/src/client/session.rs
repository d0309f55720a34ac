// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Typed request execution over an attached `tokio-modbus` context.
//!
//! TCP and RTU transports differ only in how they open the context; once
//! attached, every request goes through [`Session`].

use std::time::{Duration, Instant};

use tokio::time::timeout;
use tokio_modbus::client::{Client, Context as ModbusContext, Reader, Writer};
use tokio_modbus::prelude::*;
use tokio_modbus::{Error as TokioModbusError, ExceptionCode};

use crate::error::{ConnectionError, ModbusError, ModbusResult, ProtocolError};
use crate::types::{ByteOrder, ModbusDataType, RegisterType};

use super::{ClientStats, DataConverter, TypedValue};

/// Attached context plus per-request bookkeeping.
pub(super) struct Session {
    context: Option<ModbusContext>,
    converter: DataConverter,
    operation_timeout: Duration,
    last_success: Option<Instant>,
    last_error: Option<String>,
    stats: ClientStats,
}

impl Session {
    pub(super) fn new(byte_order: ByteOrder, operation_timeout: Duration) -> Self {
        Self {
            context: None,
            converter: DataConverter::new(byte_order),
            operation_timeout,
            last_success: None,
            last_error: None,
            stats: ClientStats::new(),
        }
    }

    pub(super) fn is_attached(&self) -> bool {
        self.context.is_some()
    }

    pub(super) fn attach(&mut self, context: ModbusContext) {
        self.context = Some(context);
        self.last_success = Some(Instant::now());
        self.last_error = None;
        self.stats.record_connection();
    }

    /// Drops the context, closing it gracefully first.
    pub(super) async fn detach(&mut self) {
        if let Some(mut ctx) = self.context.take() {
            if let Err(e) = ctx.disconnect().await {
                tracing::warn!(error = %e, "Error disconnecting from Modbus device");
            }
        }
    }

    pub(super) fn stats(&self) -> &ClientStats {
        &self.stats
    }

    pub(super) fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn context(&mut self, slave_id: u8) -> ModbusResult<&mut ModbusContext> {
        let ctx = self
            .context
            .as_mut()
            .ok_or_else(|| ModbusError::connection(ConnectionError::NotConnected))?;
        ctx.set_slave(Slave(slave_id));
        Ok(ctx)
    }

    fn finish<T>(&mut self, started: Instant, result: ModbusResult<T>) -> ModbusResult<T> {
        match &result {
            Ok(_) => {
                self.last_success = Some(Instant::now());
                self.last_error = None;
                self.stats.record_success(started.elapsed());
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                self.stats.record_error();
            }
        }
        result
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub(super) async fn read_registers(
        &mut self,
        register_type: RegisterType,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        let started = Instant::now();
        let result = self
            .read_registers_inner(register_type, slave_id, address, size, data_type)
            .await;
        self.finish(started, result)
    }

    async fn read_registers_inner(
        &mut self,
        register_type: RegisterType,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        let limit = self.operation_timeout;
        let function_code = register_type.read_function_code();
        let ctx = self.context(slave_id)?;

        let registers = match register_type {
            RegisterType::InputRegister => {
                timeout(limit, ctx.read_input_registers(address, size)).await
            }
            _ => timeout(limit, ctx.read_holding_registers(address, size)).await,
        }
        .map_err(|_| ModbusError::read_timeout(limit))?
        .map_err(map_modbus_error)?
        .map_err(|e| map_exception(function_code, e))?;

        self.converter.decode_registers(&registers, data_type)
    }

    pub(super) async fn read_bits(
        &mut self,
        register_type: RegisterType,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        let started = Instant::now();
        let result = self
            .read_bits_inner(register_type, slave_id, address, size, data_type)
            .await;
        self.finish(started, result)
    }

    async fn read_bits_inner(
        &mut self,
        register_type: RegisterType,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        DataConverter::check_bit_type(register_type, data_type)?;

        let limit = self.operation_timeout;
        let function_code = register_type.read_function_code();
        let count = size.max(1);
        let ctx = self.context(slave_id)?;

        let bits = match register_type {
            RegisterType::DiscreteInput => {
                timeout(limit, ctx.read_discrete_inputs(address, count)).await
            }
            _ => timeout(limit, ctx.read_coils(address, count)).await,
        }
        .map_err(|_| ModbusError::read_timeout(limit))?
        .map_err(map_modbus_error)?
        .map_err(|e| map_exception(function_code, e))?;

        DataConverter::decode_bits(&bits, count)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub(super) async fn write_registers(
        &mut self,
        slave_id: u8,
        address: u16,
        data_type: ModbusDataType,
        value: &TypedValue,
    ) -> ModbusResult<()> {
        let started = Instant::now();
        let result = self
            .write_registers_inner(slave_id, address, data_type, value)
            .await;
        self.finish(started, result)
    }

    async fn write_registers_inner(
        &mut self,
        slave_id: u8,
        address: u16,
        data_type: ModbusDataType,
        value: &TypedValue,
    ) -> ModbusResult<()> {
        let registers = self.converter.encode_registers(value, data_type)?;
        let limit = self.operation_timeout;
        let ctx = self.context(slave_id)?;

        match registers.as_slice() {
            [single] => timeout(limit, ctx.write_single_register(address, *single))
                .await
                .map_err(|_| ModbusError::write_timeout(limit))?
                .map_err(map_modbus_error)?
                .map_err(|e| map_exception(0x06, e)),
            many => timeout(limit, ctx.write_multiple_registers(address, many))
                .await
                .map_err(|_| ModbusError::write_timeout(limit))?
                .map_err(map_modbus_error)?
                .map_err(|e| map_exception(0x10, e)),
        }
    }

    pub(super) async fn write_bits(
        &mut self,
        slave_id: u8,
        address: u16,
        data_type: ModbusDataType,
        value: &TypedValue,
    ) -> ModbusResult<()> {
        let started = Instant::now();
        let result = self.write_bits_inner(slave_id, address, data_type, value).await;
        self.finish(started, result)
    }

    async fn write_bits_inner(
        &mut self,
        slave_id: u8,
        address: u16,
        data_type: ModbusDataType,
        value: &TypedValue,
    ) -> ModbusResult<()> {
        DataConverter::check_bit_type(RegisterType::Coil, data_type)?;

        let bits = DataConverter::encode_bits(value)?;
        let limit = self.operation_timeout;
        let ctx = self.context(slave_id)?;

        match bits.as_slice() {
            [single] => timeout(limit, ctx.write_single_coil(address, *single))
                .await
                .map_err(|_| ModbusError::write_timeout(limit))?
                .map_err(map_modbus_error)?
                .map_err(|e| map_exception(0x05, e)),
            many => timeout(limit, ctx.write_multiple_coils(address, many))
                .await
                .map_err(|_| ModbusError::write_timeout(limit))?
                .map_err(map_modbus_error)?
                .map_err(|e| map_exception(0x0F, e)),
        }
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Maps a `tokio-modbus` transport or framing error.
fn map_modbus_error(error: TokioModbusError) -> ModbusError {
    match error {
        TokioModbusError::Transport(io_error) => ModbusError::connection(io_error.into()),
        TokioModbusError::Protocol(protocol_error) => {
            ModbusError::protocol(ProtocolError::unexpected(protocol_error.to_string()))
        }
    }
}

/// Maps an exception response from the slave.
fn map_exception(function_code: u8, exception: ExceptionCode) -> ModbusError {
    ModbusError::exception(function_code, exception_code_to_u8(&exception))
}

fn exception_code_to_u8(code: &ExceptionCode) -> u8 {
    match code {
        ExceptionCode::IllegalFunction => 0x01,
        ExceptionCode::IllegalDataAddress => 0x02,
        ExceptionCode::IllegalDataValue => 0x03,
        ExceptionCode::ServerDeviceFailure => 0x04,
        ExceptionCode::Acknowledge => 0x05,
        ExceptionCode::ServerDeviceBusy => 0x06,
        ExceptionCode::MemoryParityError => 0x08,
        ExceptionCode::GatewayPathUnavailable => 0x0A,
        ExceptionCode::GatewayTargetDevice => 0x0B,
        _ => 0xFF,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_exception_mapping() {
        let err = map_exception(0x03, ExceptionCode::IllegalDataAddress);
        match err {
            ModbusError::Protocol(ProtocolError::ExceptionResponse {
                function_code,
                exception_code,
                ..
            }) => {
                assert_eq!(function_code, 0x03);
                assert_eq!(exception_code, 0x02);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_transport_error_mapping() {
        let err = map_modbus_error(TokioModbusError::Transport(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "pipe",
        )));
        assert!(matches!(
            err,
            ModbusError::Connection(ConnectionError::Closed { .. })
        ));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_detached_session_reports_not_connected() {
        let mut session = Session::new(ByteOrder::BigEndian, Duration::from_millis(50));
        assert!(!session.is_attached());

        let err = session
            .read_registers(RegisterType::HoldingRegister, 1, 0, 1, ModbusDataType::UInt16)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ModbusError::Connection(ConnectionError::NotConnected)
        ));
        assert_eq!(session.stats().failed_requests(), 1);
        assert!(session.last_error().is_some());
    }

    #[tokio::test]
    async fn test_bit_read_rejects_wide_types_before_io() {
        let mut session = Session::new(ByteOrder::BigEndian, Duration::from_millis(50));
        let err = session
            .read_bits(RegisterType::Coil, 1, 0, 1, ModbusDataType::Float32)
            .await
            .unwrap_err();
        assert!(matches!(err, ModbusError::UnsupportedOperation(_)));
    }
}
