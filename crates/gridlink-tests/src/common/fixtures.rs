// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Device frames for consistent and reproducible testing.
//!
//! ## Design Principles
//!
//! - Every frame carries the same `Meter` profile, so routing tests work on
//!   any transport
//! - Frames are plain YAML text and go through the real loader
//! - Devices are built against a [`MockTransportFactory`]

use std::path::PathBuf;
use std::sync::Arc;

use gridlink_config::{load_frame_str, DeviceBuilder, FrameFormat};
use gridlink_modbus::{
    DeviceFrame, DeviceInterface, InterfaceOptions, SequentialIdSource, SharedClientRegistry,
};

use super::mocks::MockTransportFactory;

/// Default serial port of the RTU fixtures.
pub const SERIAL_PORT: &str = "/dev/ttyUSB0";

/// Profile block shared by every fixture frame.
///
/// | point      | register       | address | type    | direction |
/// |------------|----------------|---------|---------|-----------|
/// | total      | holding        | 100     | float32 | R         |
/// | setpoint   | holding        | 200     | uint16  | RW        |
/// | command    | holding        | 300     | uint16  | W         |
/// | status     | input          | 10      | int16   | R         |
/// | relay      | coil           | 5       | bool    | RW        |
/// | alarm      | discrete input | 7       | bool    | R         |
/// | serial     | holding        | 0       | uint16  | C         |
/// | note       | (none)         |         |         | R         |
pub const METER_PROFILES: &str = r#"
functional_profiles:
  - name: Meter
    data_points:
      - name: total
        direction: R
        modbus:
          register_type: HOLD_REGISTER
          address: 100
          data_type: FLOAT32
      - name: setpoint
        direction: RW
        modbus:
          register_type: HOLD_REGISTER
          address: 200
          data_type: UINT16
      - name: command
        direction: W
        modbus:
          register_type: HOLD_REGISTER
          address: 300
          data_type: UINT16
      - name: status
        direction: R
        modbus:
          register_type: INPUT_REGISTER
          address: 10
          data_type: INT16
      - name: relay
        direction: RW
        modbus:
          register_type: COIL
          address: 5
          data_type: BOOLEAN
      - name: alarm
        direction: R
        modbus:
          register_type: DISCRETE_INPUT
          address: 7
          data_type: BOOLEAN
      - name: serial
        direction: C
        modbus:
          register_type: HOLD_REGISTER
          address: 0
          data_type: UINT16
      - name: note
        direction: R
configuration:
  - name: poll_interval
    default_value: "5s"
    description: Polling interval
"#;

/// Fixture providing device frames.
pub struct FrameFixtures;

impl FrameFixtures {
    /// A Modbus TCP meter at `127.0.0.1:502`, slave 1.
    pub fn tcp_meter() -> String {
        Self::tcp_meter_at("127.0.0.1", 502, 1)
    }

    /// A Modbus TCP meter at the given endpoint.
    pub fn tcp_meter_at(address: &str, port: u16, slave_id: u8) -> String {
        format!(
            r#"
device_information:
  name: tcp-meter
  manufacturer: Acme
interface:
  modbus:
    tcp:
      address: "{address}"
      port: {port}
      slave_id: {slave_id}
{METER_PROFILES}"#
        )
    }

    /// A Modbus RTU meter on [`SERIAL_PORT`] at 9600 baud, even parity.
    pub fn rtu_meter(slave_id: u8) -> String {
        Self::rtu_meter_on(SERIAL_PORT, 9600, "E", slave_id)
    }

    /// A Modbus RTU meter with explicit line settings.
    pub fn rtu_meter_on(port: &str, baud_rate: u32, parity: &str, slave_id: u8) -> String {
        format!(
            r#"
device_information:
  name: rtu-meter-{slave_id}
interface:
  modbus:
    rtu:
      port_name: "{port}"
      baud_rate: {baud_rate}
      parity: "{parity}"
      slave_id: {slave_id}
{METER_PROFILES}"#
        )
    }

    /// An RTU meter with every line setting left to placeholders.
    ///
    /// Needs the `port`, `baud` and `slave` properties.
    pub fn rtu_meter_template() -> String {
        format!(
            r#"
device_information:
  name: templated-meter
interface:
  modbus:
    rtu:
      port_name: "{{{{port}}}}"
      baud_rate: {{{{baud}}}}
      parity: "N"
      slave_id: {{{{slave}}}}
{METER_PROFILES}"#
        )
    }

    /// A frame describing only a REST API device.
    pub fn rest_api_device() -> String {
        r#"
device_information:
  name: inverter
interface:
  rest_api:
    address: 10.0.0.20
    port: 8080
"#
        .to_string()
    }

    /// Parses a YAML fixture.
    pub fn parse(text: &str) -> DeviceFrame {
        load_frame_str(text, FrameFormat::Yaml).expect("fixture frame must parse")
    }

    /// Writes `content` to `name` inside `dir`.
    pub fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write fixture file");
        path
    }
}

/// Builds a device interface from `frame` against `factory`.
///
/// Device ids come from a sequential source with prefix `prefix`.
pub async fn build_device(
    frame: &str,
    factory: &MockTransportFactory,
    registry: Option<Arc<SharedClientRegistry>>,
    prefix: &str,
) -> DeviceInterface {
    let mut options = InterfaceOptions::default()
        .with_factory(Arc::new(factory.clone()))
        .with_id_source(Arc::new(SequentialIdSource::new(prefix)));
    if let Some(registry) = registry {
        options = options.with_shared_rtu(registry);
    }

    DeviceInterface::new(&FrameFixtures::parse(frame), options)
        .await
        .expect("fixture device must build")
}

/// Returns a builder wired to `factory`.
pub fn device_builder(factory: &MockTransportFactory) -> DeviceBuilder {
    DeviceBuilder::new()
        .transport_factory(Arc::new(factory.clone()))
        .id_source(Arc::new(SequentialIdSource::new("dev")))
}

/// Returns a shared registry whose lines come from `factory`.
pub fn shared_registry(factory: &MockTransportFactory) -> Arc<SharedClientRegistry> {
    Arc::new(SharedClientRegistry::with_factory(Arc::new(factory.clone())))
}
