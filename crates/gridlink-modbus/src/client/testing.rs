// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory transport for unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{ModbusError, ModbusResult};
use crate::types::{ModbusDataType, ModbusRtuConfig, ModbusTcpConfig};

use super::{ModbusTransport, TransportFactory, TransportState, TypedValue};

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StubCall {
    pub method: &'static str,
    pub slave_id: u8,
    pub address: u16,
    pub size: Option<u16>,
    pub data_type: ModbusDataType,
    pub value: Option<TypedValue>,
}

#[derive(Debug, Default)]
struct StubState {
    connected: bool,
    connects: usize,
    disconnects: usize,
    fail_connect: bool,
    response: Option<TypedValue>,
    calls: Vec<StubCall>,
}

/// Transport that records calls and answers from memory.
#[derive(Debug, Clone, Default)]
pub(crate) struct StubTransport {
    state: Arc<Mutex<StubState>>,
}

impl StubTransport {
    pub fn connects(&self) -> usize {
        self.state.lock().connects
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().disconnects
    }

    pub fn calls(&self) -> Vec<StubCall> {
        self.state.lock().calls.clone()
    }

    pub fn fail_connect(&self, fail: bool) {
        self.state.lock().fail_connect = fail;
    }

    pub fn respond_with(&self, value: TypedValue) {
        self.state.lock().response = Some(value);
    }

    fn read(
        &self,
        method: &'static str,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(ModbusError::not_connected());
        }
        state.calls.push(StubCall {
            method,
            slave_id,
            address,
            size: Some(size),
            data_type,
            value: None,
        });
        Ok(state.response.clone().unwrap_or(TypedValue::UInt16(0)))
    }

    fn write(
        &self,
        method: &'static str,
        slave_id: u8,
        address: u16,
        data_type: ModbusDataType,
        value: &TypedValue,
    ) -> ModbusResult<()> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(ModbusError::not_connected());
        }
        state.calls.push(StubCall {
            method,
            slave_id,
            address,
            size: None,
            data_type,
            value: Some(value.clone()),
        });
        Ok(())
    }
}

#[async_trait]
impl ModbusTransport for StubTransport {
    async fn connect(&mut self) -> ModbusResult<()> {
        let mut state = self.state.lock();
        if state.fail_connect {
            return Err(ModbusError::connection(
                crate::error::ConnectionError::refused("stub", 0),
            ));
        }
        if !state.connected {
            state.connected = true;
            state.connects += 1;
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> ModbusResult<()> {
        let mut state = self.state.lock();
        if state.connected {
            state.connected = false;
            state.disconnects += 1;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn state(&self) -> TransportState {
        if self.is_connected() {
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
        self.read("read_input_registers", slave_id, address, size, data_type)
    }

    async fn read_holding_registers(
        &mut self,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        self.read("read_holding_registers", slave_id, address, size, data_type)
    }

    async fn read_coils(
        &mut self,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        self.read("read_coils", slave_id, address, size, data_type)
    }

    async fn read_discrete_inputs(
        &mut self,
        slave_id: u8,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        self.read("read_discrete_inputs", slave_id, address, size, data_type)
    }

    async fn write_holding_registers(
        &mut self,
        slave_id: u8,
        address: u16,
        data_type: ModbusDataType,
        value: &TypedValue,
    ) -> ModbusResult<()> {
        self.write("write_holding_registers", slave_id, address, data_type, value)
    }

    async fn write_coils(
        &mut self,
        slave_id: u8,
        address: u16,
        data_type: ModbusDataType,
        value: &TypedValue,
    ) -> ModbusResult<()> {
        self.write("write_coils", slave_id, address, data_type, value)
    }

    fn display_name(&self) -> String {
        "stub".to_string()
    }
}

/// Factory handing out stub transports and keeping a handle to each.
#[derive(Debug, Clone, Default)]
pub(crate) struct StubFactory {
    created: Arc<Mutex<Vec<StubTransport>>>,
}

impl StubFactory {
    pub fn created(&self) -> Vec<StubTransport> {
        self.created.lock().clone()
    }

    fn make(&self) -> Box<dyn ModbusTransport> {
        let stub = StubTransport::default();
        self.created.lock().push(stub.clone());
        Box::new(stub)
    }
}

impl TransportFactory for StubFactory {
    fn tcp(&self, _config: &ModbusTcpConfig) -> Box<dyn ModbusTransport> {
        self.make()
    }

    fn rtu(&self, _config: &ModbusRtuConfig) -> Box<dyn ModbusTransport> {
        self.make()
    }
}
