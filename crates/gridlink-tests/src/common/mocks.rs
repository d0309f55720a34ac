// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! A recording [`MockTransport`] and the factory that hands it out.
//!
//! ## Design Principles
//!
//! - Every call is recorded twice, when it starts and when it ends, into a
//!   [`CallLog`] shared by all transports of a factory, so tests can check
//!   that calls on one line never overlap
//! - Latency, failures and timeouts can be injected per transport
//! - Handles are cheap clones; the test keeps one while the device owns
//!   another

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use gridlink_modbus::{
    ModbusDataType, ModbusError, ModbusResult, ModbusRtuConfig, ModbusTcpConfig, ModbusTransport,
    TransportFactory, TransportState, TypedValue,
};

// =============================================================================
// CallLog
// =============================================================================

/// Phase of a recorded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    /// The call entered the transport.
    Start,
    /// The call left the transport.
    End,
}

/// One recorded call event.
#[derive(Debug, Clone, PartialEq)]
pub struct CallEvent {
    /// Display name of the transport that saw the call.
    pub transport: String,
    /// Start or end.
    pub phase: CallPhase,
    /// Transport method name, e.g. `read_holding_registers`.
    pub method: &'static str,
    /// Slave id of the call.
    pub slave_id: u8,
    /// Start address.
    pub address: u16,
    /// Register or bit count. Writes record the width of the value type.
    pub size: u16,
    /// Value type.
    pub data_type: ModbusDataType,
    /// Written value, for writes.
    pub value: Option<TypedValue>,
}

/// Ordered log of call events, shared across transports.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    events: Arc<Mutex<Vec<CallEvent>>>,
}

impl CallLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: CallEvent) {
        self.events.lock().push(event);
    }

    /// Returns every event in order.
    pub fn events(&self) -> Vec<CallEvent> {
        self.events.lock().clone()
    }

    /// Returns the start events, one per call.
    pub fn calls(&self) -> Vec<CallEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.phase == CallPhase::Start)
            .cloned()
            .collect()
    }

    /// Returns the calls seen by one transport.
    pub fn calls_on(&self, transport: &str) -> Vec<CallEvent> {
        self.calls()
            .into_iter()
            .filter(|e| e.transport == transport)
            .collect()
    }

    /// Returns the highest number of calls in flight at once on one
    /// transport.
    pub fn max_in_flight(&self, transport: &str) -> usize {
        let mut in_flight = 0usize;
        let mut max = 0usize;
        for event in self.events.lock().iter().filter(|e| e.transport == transport) {
            match event.phase {
                CallPhase::Start => {
                    in_flight += 1;
                    max = max.max(in_flight);
                }
                CallPhase::End => in_flight = in_flight.saturating_sub(1),
            }
        }
        max
    }

    /// Clears the log.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

// =============================================================================
// MockTransport
// =============================================================================

#[derive(Debug, Default)]
struct MockState {
    connected: AtomicBool,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    fail_connect: AtomicBool,
    fail_next_call: AtomicBool,
    timeout_next_call: AtomicBool,
    latency: Mutex<Duration>,
    registers: Mutex<HashMap<(&'static str, u8, u16), TypedValue>>,
}

/// A recording in-memory Modbus transport.
///
/// Writes are stored and returned by later reads of the same register kind,
/// slave and address. Unwritten registers read as zero of the requested
/// type.
#[derive(Debug, Clone)]
pub struct MockTransport {
    name: String,
    log: CallLog,
    state: Arc<MockState>,
}

impl MockTransport {
    /// Creates a transport recording into `log`.
    pub fn new(name: impl Into<String>, log: CallLog) -> Self {
        Self {
            name: name.into(),
            log,
            state: Arc::new(MockState::default()),
        }
    }

    /// Returns the display name used in the call log.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of physical connects.
    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// Number of physical disconnects.
    pub fn disconnect_count(&self) -> usize {
        self.state.disconnects.load(Ordering::SeqCst)
    }

    /// Returns `true` while physically connected.
    pub fn connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    /// Sets the time every call spends inside the transport.
    pub fn set_latency(&self, latency: Duration) {
        *self.state.latency.lock() = latency;
    }

    /// Makes every connect fail.
    pub fn fail_connect(&self, fail: bool) {
        self.state.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Makes the next call fail with an exception response.
    pub fn fail_next_call(&self) {
        self.state.fail_next_call.store(true, Ordering::SeqCst);
    }

    /// Makes the next call time out.
    pub fn timeout_next_call(&self) {
        self.state.timeout_next_call.store(true, Ordering::SeqCst);
    }

    /// Presets a holding register value.
    pub fn set_holding_register(&self, slave_id: u8, address: u16, value: TypedValue) {
        self.state
            .registers
            .lock()
            .insert(("holding", slave_id, address), value);
    }

    /// Presets an input register value.
    pub fn set_input_register(&self, slave_id: u8, address: u16, value: TypedValue) {
        self.state
            .registers
            .lock()
            .insert(("input", slave_id, address), value);
    }

    /// Presets a coil value.
    pub fn set_coil(&self, slave_id: u8, address: u16, value: bool) {
        self.state
            .registers
            .lock()
            .insert(("coil", slave_id, address), TypedValue::Bool(value));
    }

    fn event(
        &self,
        phase: CallPhase,
        method: &'static str,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
        value: Option<&TypedValue>,
    ) -> CallEvent {
        CallEvent {
            transport: self.name.clone(),
            phase,
            method,
            slave_id,
            address,
            size,
            data_type,
            value: value.cloned(),
        }
    }

    async fn call(
        &self,
        method: &'static str,
        kind: &'static str,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
        write: Option<&TypedValue>,
    ) -> ModbusResult<TypedValue> {
        if !self.connected() {
            return Err(ModbusError::not_connected());
        }

        self.log
            .push(self.event(CallPhase::Start, method, slave_id, address, size, data_type, write));

        let latency = *self.state.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let result = if self.state.fail_next_call.swap(false, Ordering::SeqCst) {
            Err(ModbusError::exception(function_code(method), 0x02))
        } else if self.state.timeout_next_call.swap(false, Ordering::SeqCst) {
            Err(ModbusError::read_timeout(latency))
        } else {
            let mut registers = self.state.registers.lock();
            match write {
                Some(value) => {
                    registers.insert((kind, slave_id, address), value.clone());
                    Ok(value.clone())
                }
                None => Ok(registers
                    .get(&(kind, slave_id, address))
                    .cloned()
                    .unwrap_or_else(|| zero_of(data_type))),
            }
        };

        self.log
            .push(self.event(CallPhase::End, method, slave_id, address, size, data_type, write));
        result
    }
}

#[async_trait]
impl ModbusTransport for MockTransport {
    async fn connect(&mut self) -> ModbusResult<()> {
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(ModbusError::connection(
                gridlink_modbus::ConnectionError::refused(self.name.clone(), 0),
            ));
        }
        if !self.state.connected.swap(true, Ordering::SeqCst) {
            self.state.connects.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> ModbusResult<()> {
        if self.state.connected.swap(false, Ordering::SeqCst) {
            self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected()
    }

    fn state(&self) -> TransportState {
        if self.connected() {
            TransportState::Connected
        } else {
            TransportState::Disconnected
        }
    }

    async fn read_input_registers(
        &mut self,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        self.call("read_input_registers", "input", slave_id, address, size, data_type, None)
            .await
    }

    async fn read_holding_registers(
        &mut self,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        self.call("read_holding_registers", "holding", slave_id, address, size, data_type, None)
            .await
    }

    async fn read_coils(
        &mut self,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        self.call("read_coils", "coil", slave_id, address, size, data_type, None)
            .await
    }

    async fn read_discrete_inputs(
        &mut self,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        self.call("read_discrete_inputs", "discrete", slave_id, address, size, data_type, None)
            .await
    }

    async fn write_holding_registers(
        &mut self,
        slave_id: u8,
        address: u16,
        data_type: ModbusDataType,
        value: &TypedValue,
    ) -> ModbusResult<()> {
        self.call("write_holding_registers", "holding", slave_id, address, data_type.register_count(), data_type, Some(value))
            .await
            .map(|_| ())
    }

    async fn write_coils(
        &mut self,
        slave_id: u8,
        address: u16,
        data_type: ModbusDataType,
        value: &TypedValue,
    ) -> ModbusResult<()> {
        self.call("write_coils", "coil", slave_id, address, data_type.register_count(), data_type, Some(value))
            .await
            .map(|_| ())
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

fn function_code(method: &str) -> u8 {
    match method {
        "read_coils" => 0x01,
        "read_discrete_inputs" => 0x02,
        "read_holding_registers" => 0x03,
        "read_input_registers" => 0x04,
        "write_coils" => 0x0F,
        _ => 0x10,
    }
}

fn zero_of(data_type: ModbusDataType) -> TypedValue {
    match data_type {
        ModbusDataType::Bool => TypedValue::Bool(false),
        ModbusDataType::String => TypedValue::String(String::new()),
        other => TypedValue::parse_as(other, "0").unwrap_or(TypedValue::UInt16(0)),
    }
}

// =============================================================================
// MockTransportFactory
// =============================================================================

/// Factory handing out [`MockTransport`]s that share one [`CallLog`].
///
/// TCP transports are named `host:port`, RTU transports by their serial
/// port.
#[derive(Debug, Clone, Default)]
pub struct MockTransportFactory {
    log: CallLog,
    latency: Arc<Mutex<Duration>>,
    created: Arc<Mutex<Vec<MockTransport>>>,
}

impl MockTransportFactory {
    /// Creates a factory with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the latency given to transports created from now on.
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.lock() = latency;
        self
    }

    /// Returns the shared call log.
    pub fn log(&self) -> &CallLog {
        &self.log
    }

    /// Returns every transport created so far.
    pub fn created(&self) -> Vec<MockTransport> {
        self.created.lock().clone()
    }

    /// Returns the transports created under `name`.
    pub fn transports(&self, name: &str) -> Vec<MockTransport> {
        self.created
            .lock()
            .iter()
            .filter(|t| t.name() == name)
            .cloned()
            .collect()
    }

    fn make(&self, name: String) -> Box<dyn ModbusTransport> {
        let transport = MockTransport::new(name, self.log.clone());
        transport.set_latency(*self.latency.lock());
        self.created.lock().push(transport.clone());
        Box::new(transport)
    }
}

impl TransportFactory for MockTransportFactory {
    fn tcp(&self, config: &ModbusTcpConfig) -> Box<dyn ModbusTransport> {
        self.make(format!("{}:{}", config.host, config.port))
    }

    fn rtu(&self, config: &ModbusRtuConfig) -> Box<dyn ModbusTransport> {
        self.make(config.port.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_start_and_end() {
        let log = CallLog::new();
        let mut transport = MockTransport::new("line", log.clone());
        transport.connect().await.unwrap();

        transport
            .write_holding_registers(1, 10, ModbusDataType::UInt16, &TypedValue::UInt16(7))
            .await
            .unwrap();
        let value = transport
            .read_holding_registers(1, 10, 1, ModbusDataType::UInt16)
            .await
            .unwrap();

        assert_eq!(value, TypedValue::UInt16(7));
        assert_eq!(log.events().len(), 4);
        assert_eq!(log.calls().len(), 2);
        assert_eq!(log.max_in_flight("line"), 1);
    }

    #[tokio::test]
    async fn test_mock_requires_connection() {
        let mut transport = MockTransport::new("line", CallLog::new());
        assert!(transport
            .read_coils(1, 0, 1, ModbusDataType::Bool)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let mut transport = MockTransport::new("line", CallLog::new());
        transport.connect().await.unwrap();

        transport.fail_next_call();
        let err = transport
            .read_input_registers(1, 0, 1, ModbusDataType::Int16)
            .await
            .unwrap_err();
        assert!(matches!(err, ModbusError::Protocol(_)));

        transport.timeout_next_call();
        let err = transport
            .read_input_registers(1, 0, 1, ModbusDataType::Int16)
            .await
            .unwrap_err();
        assert!(matches!(err, ModbusError::Timeout(_)));

        assert_eq!(
            transport
                .read_input_registers(1, 0, 1, ModbusDataType::Int16)
                .await
                .unwrap(),
            TypedValue::Int16(0)
        );
    }
}
