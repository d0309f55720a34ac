// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Device Interface Integration Tests
//!
//! Exercises [`DeviceInterface`] end to end against the recording mock
//! transport:
//!
//! - Frame parsing into profiles and data points
//! - Register routing and slave ids
//! - Direction, read-only and addressing errors
//! - Connection state and release
//!
//! ## Test Categories
//!
//! - `test_frame_*`: Frame to interface mapping
//! - `test_routing_*`: Register kind and slave id routing
//! - `test_error_*`: Rejected operations
//! - `test_lifecycle_*`: Connect, disconnect and release

use gridlink_modbus::{
    ByteOrder, ConfigurationError, DataDirection, DirectionError, InterfaceOptions, ModbusDataType,
    ModbusError, RegisterType, ResourceStateError, TransportKind, TransportParams, TypedValue,
    UnsupportedOperationError,
};
use gridlink_modbus::{DeviceInterface, SequentialIdSource};
use gridlink_tests::prelude::*;
use std::sync::Arc;

// =============================================================================
// Frame Mapping
// =============================================================================

#[tokio::test]
async fn test_frame_profiles_and_metadata() {
    init_test_logging();
    let factory = MockTransportFactory::new();
    let device = build_device(&FrameFixtures::tcp_meter(), &factory, None, "meter").await;

    assert_eq!(device.device_id().as_str(), "meter-1");
    assert_eq!(device.transport_kind(), TransportKind::Tcp);
    assert_eq!(device.byte_order(), ByteOrder::default());
    assert!(!device.is_shared());
    assert_eq!(device.device_information().name.as_deref(), Some("tcp-meter"));
    assert_eq!(device.device_information().manufacturer.as_deref(), Some("Acme"));
    assert_eq!(device.configuration_parameters().len(), 1);
    assert_eq!(device.configuration_parameters()[0].name, "poll_interval");

    let profile = device.functional_profile("Meter").unwrap();
    assert_eq!(profile.len(), 8);
    assert_eq!(device.data_points().count(), 8);

    let total = device.data_point("Meter", "total").unwrap();
    assert_eq!(total.name(), ("Meter", "total"));
    assert_eq!(total.direction(), DataDirection::Read);
    let layout = total.layout().unwrap();
    assert_eq!(layout.register_type, RegisterType::HoldingRegister);
    assert_eq!(layout.address, 100);
    assert_eq!(layout.size, 2);
    assert_eq!(layout.data_type, ModbusDataType::Float32);

    let serial = device.data_point("Meter", "serial").unwrap();
    assert_eq!(serial.direction(), DataDirection::Constant);
    assert_eq!(serial.address(), Some(0));

    assert!(!device.data_point("Meter", "note").unwrap().is_addressed());
    assert!(device.data_point("Meter", "missing").is_none());
    assert!(device.data_point("Other", "total").is_none());

    // Nothing touches the transport until connect.
    assert_eq!(factory.created().len(), 1);
    assert_eq!(factory.created()[0].connect_count(), 0);
    assert!(!device.is_connected());
}

#[tokio::test]
async fn test_frame_same_structure_distinct_ids() {
    let factory = MockTransportFactory::new();
    let frame = FrameFixtures::parse(&FrameFixtures::tcp_meter());
    let options = InterfaceOptions::default().with_factory(Arc::new(factory.clone()));

    let first = DeviceInterface::new(&frame, options.clone()).await.unwrap();
    let second = DeviceInterface::new(&frame, options).await.unwrap();

    assert_ne!(first.device_id(), second.device_id());
    let shape = |device: &DeviceInterface| {
        device
            .data_points()
            .map(|p| (p.name().0.to_string(), p.name().1.to_string(), p.address(), p.direction()))
            .collect::<Vec<_>>()
    };
    assert_eq!(shape(&first), shape(&second));
}

#[tokio::test]
async fn test_frame_tcp_float_read_scenario() {
    let factory = MockTransportFactory::new();
    let device = build_device(&FrameFixtures::tcp_meter_at("10.0.0.5", 502, 1), &factory, None, "m").await;
    device.connect().await.unwrap();
    factory.transports("10.0.0.5:502")[0].set_holding_register(1, 100, TypedValue::Float32(230.5));

    let value = device.data_point("Meter", "total").unwrap().get().await.unwrap();
    assert_eq!(value, TypedValue::Float32(230.5));

    let calls = factory.log().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "read_holding_registers");
    assert_eq!(
        (calls[0].slave_id, calls[0].address, calls[0].size, calls[0].data_type),
        (1, 100, 2, ModbusDataType::Float32)
    );
}

#[tokio::test]
async fn test_frame_rtu_defaults_slave_id() {
    let factory = MockTransportFactory::new();
    let frame = FrameFixtures::rtu_meter(3).replace("      slave_id: 3\n", "");
    let device = build_device(&frame, &factory, None, "rtu").await;

    assert_eq!(device.transport_kind(), TransportKind::Rtu);
    assert_eq!(device.slave_id(), 1);
    assert!(matches!(
        device.transport_params(),
        TransportParams::Rtu { port_name, baud_rate: 9600, .. } if port_name == SERIAL_PORT
    ));
}

#[tokio::test]
async fn test_frame_without_modbus_is_rejected() {
    let factory = MockTransportFactory::new();
    let options = InterfaceOptions::default().with_factory(Arc::new(factory.clone()));

    let rest = FrameFixtures::parse(&FrameFixtures::rest_api_device());
    let err = DeviceInterface::new(&rest, options.clone()).await.unwrap_err();
    assert!(matches!(
        err,
        ModbusError::Configuration(ConfigurationError::UnsupportedInterface { ref interface }) if interface == "rest_api"
    ));

    let empty = FrameFixtures::parse("device_information:\n  name: bare\n");
    let err = DeviceInterface::new(&empty, options).await.unwrap_err();
    assert!(matches!(
        err,
        ModbusError::Configuration(ConfigurationError::MissingTransport)
    ));
    assert!(factory.created().is_empty());
}

#[tokio::test]
async fn test_frame_missing_tcp_address() {
    let factory = MockTransportFactory::new();
    let frame = FrameFixtures::tcp_meter().replace("      address: \"127.0.0.1\"\n", "");
    let options = InterfaceOptions::default()
        .with_factory(Arc::new(factory.clone()))
        .with_id_source(Arc::new(SequentialIdSource::new("x")));

    let err = DeviceInterface::new(&FrameFixtures::parse(&frame), options)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ModbusError::Configuration(ConfigurationError::MissingField { ref field }) if field.contains("address")
    ));
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn test_routing_register_kinds() {
    init_test_logging();
    let factory = MockTransportFactory::new();
    let device = build_device(&FrameFixtures::tcp_meter_at("10.0.0.5", 1502, 7), &factory, None, "m").await;
    device.connect().await.unwrap();

    let mock = factory.transports("10.0.0.5:1502").remove(0);
    mock.set_input_register(7, 10, TypedValue::Int16(-12));
    mock.set_coil(7, 5, true);

    let log = factory.log();
    log.clear();

    assert_eq!(
        device.data_point("Meter", "status").unwrap().get().await.unwrap(),
        TypedValue::Int16(-12)
    );
    assert_eq!(
        device.data_point("Meter", "relay").unwrap().get().await.unwrap(),
        TypedValue::Bool(true)
    );
    assert_eq!(
        device.data_point("Meter", "alarm").unwrap().get().await.unwrap(),
        TypedValue::Bool(false)
    );
    assert_eq!(
        device.data_point("Meter", "total").unwrap().get().await.unwrap(),
        TypedValue::Float32(0.0)
    );

    let methods: Vec<_> = log.calls().iter().map(|c| (c.method, c.address, c.slave_id)).collect();
    assert_eq!(
        methods,
        vec![
            ("read_input_registers", 10, 7),
            ("read_coils", 5, 7),
            ("read_discrete_inputs", 7, 7),
            ("read_holding_registers", 100, 7),
        ]
    );
}

#[tokio::test]
async fn test_routing_writes_then_reads_back() {
    let factory = MockTransportFactory::new();
    let device = build_device(&FrameFixtures::tcp_meter(), &factory, None, "m").await;
    device.connect().await.unwrap();

    let setpoint = device.data_point("Meter", "setpoint").unwrap();
    setpoint.set(TypedValue::UInt16(80)).await.unwrap();
    assert_eq!(setpoint.get().await.unwrap(), TypedValue::UInt16(80));

    let relay = device.data_point("Meter", "relay").unwrap();
    relay.set(TypedValue::Bool(true)).await.unwrap();
    assert_eq!(relay.get().await.unwrap(), TypedValue::Bool(true));

    device
        .data_point("Meter", "command")
        .unwrap()
        .set(TypedValue::UInt16(1))
        .await
        .unwrap();

    let writes: Vec<_> = factory
        .log()
        .calls()
        .into_iter()
        .filter(|c| c.method.starts_with("write"))
        .map(|c| (c.method, c.address, c.value))
        .collect();
    assert_eq!(
        writes,
        vec![
            ("write_holding_registers", 200, Some(TypedValue::UInt16(80))),
            ("write_coils", 5, Some(TypedValue::Bool(true))),
            ("write_holding_registers", 300, Some(TypedValue::UInt16(1))),
        ]
    );
}

#[tokio::test]
async fn test_routing_address_zero() {
    let factory = MockTransportFactory::new();
    let device = build_device(&FrameFixtures::tcp_meter(), &factory, None, "m").await;
    device.connect().await.unwrap();

    let mock = factory.created().remove(0);
    mock.set_holding_register(1, 0, TypedValue::UInt16(4242));

    let serial = device.data_point("Meter", "serial").unwrap();
    assert_eq!(serial.get().await.unwrap(), TypedValue::UInt16(4242));
    assert_eq!(factory.log().calls().last().unwrap().address, 0);
}

#[tokio::test]
async fn test_routing_set_slave_id() {
    let factory = MockTransportFactory::new();
    let device = build_device(&FrameFixtures::tcp_meter(), &factory, None, "m").await;
    device.connect().await.unwrap();

    let status = device.data_point("Meter", "status").unwrap();
    status.get().await.unwrap();
    device.set_slave_id(42);
    assert_eq!(device.slave_id(), 42);
    status.get().await.unwrap();

    let slaves: Vec<u8> = factory.log().calls().iter().map(|c| c.slave_id).collect();
    assert_eq!(slaves, vec![1, 42]);
}

#[tokio::test]
async fn test_routing_raw_read_and_write() {
    let factory = MockTransportFactory::new();
    let device = build_device(&FrameFixtures::tcp_meter(), &factory, None, "m").await;
    device.connect().await.unwrap();

    device
        .write(RegisterType::HoldingRegister, 900, ModbusDataType::Int32, &TypedValue::Int32(-5))
        .await
        .unwrap();
    let value = device
        .read(RegisterType::HoldingRegister, 900, 2, ModbusDataType::Int32)
        .await
        .unwrap();
    assert_eq!(value, TypedValue::Int32(-5));
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_error_direction() {
    let factory = MockTransportFactory::new();
    let device = build_device(&FrameFixtures::tcp_meter(), &factory, None, "m").await;
    device.connect().await.unwrap();
    factory.log().clear();

    let err = device
        .data_point("Meter", "total")
        .unwrap()
        .set(TypedValue::Float32(1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, ModbusError::Direction(DirectionError::NotWritable { .. })));

    let err = device
        .data_point("Meter", "serial")
        .unwrap()
        .set(TypedValue::UInt16(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ModbusError::Direction(DirectionError::NotWritable { .. })));

    let err = device.data_point("Meter", "command").unwrap().get().await.unwrap_err();
    assert!(matches!(err, ModbusError::Direction(DirectionError::NotReadable { .. })));

    // Constants are readable.
    device.data_point("Meter", "serial").unwrap().get().await.unwrap();

    assert_eq!(factory.log().calls().len(), 1);
}

#[tokio::test]
async fn test_error_read_only_registers() {
    let factory = MockTransportFactory::new();
    let device = build_device(&FrameFixtures::tcp_meter(), &factory, None, "m").await;
    device.connect().await.unwrap();
    factory.log().clear();

    for register_type in [RegisterType::InputRegister, RegisterType::DiscreteInput] {
        let err = device
            .write(register_type, 1, ModbusDataType::UInt16, &TypedValue::UInt16(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ModbusError::UnsupportedOperation(UnsupportedOperationError::ReadOnlyRegister { .. })
        ));
    }
    assert!(factory.log().calls().is_empty());
}

#[tokio::test]
async fn test_error_unaddressed_point() {
    let factory = MockTransportFactory::new();
    let device = build_device(&FrameFixtures::tcp_meter(), &factory, None, "m").await;
    device.connect().await.unwrap();

    let err = device.data_point("Meter", "note").unwrap().get().await.unwrap_err();
    assert!(matches!(
        err,
        ModbusError::ResourceState(ResourceStateError::Unaddressed { .. })
    ));
}

#[tokio::test]
async fn test_error_requires_connection() {
    let factory = MockTransportFactory::new();
    let device = build_device(&FrameFixtures::tcp_meter(), &factory, None, "m").await;

    let err = device.data_point("Meter", "total").unwrap().get().await.unwrap_err();
    assert!(err.is_transport());
    assert!(factory.log().calls().is_empty());
}

#[tokio::test]
async fn test_error_transport_failures_propagate() {
    let factory = MockTransportFactory::new();
    let device = build_device(&FrameFixtures::tcp_meter(), &factory, None, "m").await;
    device.connect().await.unwrap();
    let mock = factory.created().remove(0);
    let total = device.data_point("Meter", "total").unwrap();

    mock.fail_next_call();
    assert!(matches!(total.get().await.unwrap_err(), ModbusError::Protocol(_)));

    mock.timeout_next_call();
    let err = total.get().await.unwrap_err();
    assert!(matches!(err, ModbusError::Timeout(_)));
    assert!(err.is_retryable());

    // The transport stays usable.
    assert!(total.get().await.is_ok());
}

#[tokio::test]
async fn test_error_connect_failure() {
    let factory = MockTransportFactory::new();
    let device = build_device(&FrameFixtures::tcp_meter(), &factory, None, "m").await;
    factory.created()[0].fail_connect(true);

    let err = device.connect().await.unwrap_err();
    assert!(matches!(err, ModbusError::Connection(_)));
    assert!(!device.is_connected());
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_lifecycle_connect_disconnect() {
    let factory = MockTransportFactory::new();
    let device = build_device(&FrameFixtures::tcp_meter(), &factory, None, "m").await;
    let mock = factory.created().remove(0);

    device.connect().await.unwrap();
    device.connect().await.unwrap();
    assert!(device.is_connected());
    assert_eq!(mock.connect_count(), 1);

    device.disconnect().await.unwrap();
    assert!(!device.is_connected());
    assert!(!mock.connected());

    device.connect().await.unwrap();
    assert_eq!(mock.connect_count(), 2);
}

#[tokio::test]
async fn test_lifecycle_release_invalidates_points() {
    let factory = MockTransportFactory::new();
    let device = build_device(&FrameFixtures::tcp_meter(), &factory, None, "m").await;
    device.connect().await.unwrap();
    let mock = factory.created().remove(0);

    let total = device.data_point("Meter", "total").unwrap().clone();
    device.release().await.unwrap();

    assert!(!mock.connected());
    assert_eq!(mock.disconnect_count(), 1);
    let err = total.get().await.unwrap_err();
    assert!(matches!(
        err,
        ModbusError::ResourceState(ResourceStateError::InterfaceReleased { .. })
    ));
}

#[tokio::test]
async fn test_lifecycle_independent_tcp_devices() {
    let factory = MockTransportFactory::new();
    let a = build_device(&FrameFixtures::tcp_meter_at("10.0.0.1", 502, 1), &factory, None, "a").await;
    let b = build_device(&FrameFixtures::tcp_meter_at("10.0.0.2", 502, 1), &factory, None, "b").await;

    a.connect().await.unwrap();
    b.connect().await.unwrap();
    a.release().await.unwrap();

    assert!(b.is_connected());
    b.data_point("Meter", "total").unwrap().get().await.unwrap();
    assert_eq!(factory.log().calls_on("10.0.0.2:502").len(), 1);
    assert!(factory.log().calls_on("10.0.0.1:502").is_empty());
}
