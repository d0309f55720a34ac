// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Shared RTU Line Integration Tests
//!
//! Several devices on one serial port share a single client through
//! [`SharedClientRegistry`]. These tests cover:
//!
//! - Reference counting and line setting conflicts
//! - A single physical connection per port
//! - Serialized access under concurrent reads
//! - Lock release when a caller is cancelled
//! - Release, drop and shutdown
//!
//! ## Test Categories
//!
//! - `test_registry_*`: Registration bookkeeping
//! - `test_line_*`: Physical connection sharing
//! - `test_access_*`: Serialization and cancellation
//! - `test_release_*`: Teardown paths

use std::sync::Arc;
use std::time::Duration;

use gridlink_modbus::{
    ConfigurationError, DeviceId, DeviceInterface, InterfaceOptions, ModbusError, Parity,
    ResourceStateError, SequentialIdSource, SharedClientRegistry, TypedValue,
};
use gridlink_tests::prelude::*;

async fn shared_device(
    frame: &str,
    factory: &MockTransportFactory,
    registry: &Arc<SharedClientRegistry>,
    prefix: &str,
) -> DeviceInterface {
    build_device(frame, factory, Some(Arc::clone(registry)), prefix).await
}

// =============================================================================
// Registry Bookkeeping
// =============================================================================

#[tokio::test]
async fn test_registry_counts_devices_per_port() {
    init_test_logging();
    let factory = MockTransportFactory::new();
    let registry = shared_registry(&factory);

    let a = shared_device(&FrameFixtures::rtu_meter(1), &factory, &registry, "a").await;
    let b = shared_device(&FrameFixtures::rtu_meter(2), &factory, &registry, "b").await;

    assert!(a.is_shared());
    assert!(b.is_shared());
    assert_eq!(registry.reference_count(SERIAL_PORT).await, 2);
    assert_eq!(registry.ports().await, vec![SERIAL_PORT.to_string()]);

    let info = registry.entry_info(SERIAL_PORT).await.unwrap();
    assert_eq!(info.reference_count, 2);
    assert_eq!(info.devices, vec![DeviceId::new("a-1"), DeviceId::new("b-1")]);
    assert!(!info.physically_connected);

    // One transport for the whole line.
    assert_eq!(factory.created().len(), 1);
}

#[tokio::test]
async fn test_registry_rejects_mismatched_line_settings() {
    let factory = MockTransportFactory::new();
    let registry = shared_registry(&factory);
    let _a = shared_device(&FrameFixtures::rtu_meter(1), &factory, &registry, "a").await;

    for frame in [
        FrameFixtures::rtu_meter_on(SERIAL_PORT, 9600, "N", 2),
        FrameFixtures::rtu_meter_on(SERIAL_PORT, 19200, "E", 2),
    ] {
        let options = InterfaceOptions::default()
            .with_factory(Arc::new(factory.clone()))
            .with_id_source(Arc::new(SequentialIdSource::new("b")))
            .with_shared_rtu(Arc::clone(&registry));

        let err = DeviceInterface::new(&FrameFixtures::parse(&frame), options)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ModbusError::Configuration(ConfigurationError::SharedPortMismatch { .. })
        ));
    }

    assert_eq!(registry.reference_count(SERIAL_PORT).await, 1);
    assert_eq!(factory.created().len(), 1);
}

#[tokio::test]
async fn test_registry_register_is_idempotent() {
    let registry = SharedClientRegistry::with_factory(Arc::new(MockTransportFactory::new()));
    let device = DeviceId::new("meter");

    registry
        .register_port("/dev/ttyS1", Parity::None, 9600, &device)
        .await
        .unwrap();
    registry
        .register_port("/dev/ttyS1", Parity::None, 9600, &device)
        .await
        .unwrap();
    assert_eq!(registry.reference_count("/dev/ttyS1").await, 1);

    registry.unregister("/dev/ttyS1", &device).await;
    registry.unregister("/dev/ttyS1", &device).await;
    registry.unregister("/dev/unknown", &device).await;
    assert_eq!(registry.reference_count("/dev/ttyS1").await, 0);
    assert!(registry.ports().await.is_empty());
}

#[tokio::test]
async fn test_registry_concurrent_first_registration() {
    let factory = MockTransportFactory::new();
    let registry = shared_registry(&factory);
    let a = DeviceId::new("a");
    let b = DeviceId::new("b");

    let (wa, wb) = tokio::join!(
        registry.register_port("/dev/ttyS2", Parity::Even, 9600, &a),
        registry.register_port("/dev/ttyS2", Parity::Even, 9600, &b),
    );
    let (wa, wb) = (wa.unwrap(), wb.unwrap());

    assert_eq!(factory.created().len(), 1);
    assert_eq!(registry.reference_count("/dev/ttyS2").await, 2);

    wa.connect(&a).await.unwrap();
    assert!(wb.is_physically_connected());
}

#[tokio::test]
async fn test_registry_separate_ports() {
    let factory = MockTransportFactory::new();
    let registry = shared_registry(&factory);

    let _a = shared_device(&FrameFixtures::rtu_meter_on("/dev/ttyUSB0", 9600, "E", 1), &factory, &registry, "a").await;
    let _b = shared_device(&FrameFixtures::rtu_meter_on("/dev/ttyUSB1", 19200, "N", 1), &factory, &registry, "b").await;

    assert_eq!(
        registry.ports().await,
        vec!["/dev/ttyUSB0".to_string(), "/dev/ttyUSB1".to_string()]
    );
    assert_eq!(factory.created().len(), 2);
}

#[tokio::test]
async fn test_registry_ignored_for_tcp() {
    let factory = MockTransportFactory::new();
    let registry = shared_registry(&factory);

    let device = shared_device(&FrameFixtures::tcp_meter(), &factory, &registry, "t").await;
    assert!(!device.is_shared());
    assert!(registry.ports().await.is_empty());
}

// =============================================================================
// Physical Line
// =============================================================================

#[tokio::test]
async fn test_line_single_physical_connect() {
    let factory = MockTransportFactory::new();
    let registry = shared_registry(&factory);
    let a = shared_device(&FrameFixtures::rtu_meter(1), &factory, &registry, "a").await;
    let b = shared_device(&FrameFixtures::rtu_meter(2), &factory, &registry, "b").await;
    let line = factory.transports(SERIAL_PORT).remove(0);

    a.connect().await.unwrap();
    assert!(a.is_connected());
    assert!(!b.is_connected());

    b.connect().await.unwrap();
    assert!(b.is_connected());
    assert_eq!(line.connect_count(), 1);
    assert!(registry.entry_info(SERIAL_PORT).await.unwrap().physically_connected);

    // Disconnecting one device keeps the line open for the other.
    a.disconnect().await.unwrap();
    assert!(!a.is_connected());
    assert!(b.is_connected());
    assert!(line.connected());
    b.data_point("Meter", "status").unwrap().get().await.unwrap();
}

#[tokio::test]
async fn test_line_routes_by_slave_id() {
    let factory = MockTransportFactory::new();
    let registry = shared_registry(&factory);
    let a = shared_device(&FrameFixtures::rtu_meter(1), &factory, &registry, "a").await;
    let b = shared_device(&FrameFixtures::rtu_meter(2), &factory, &registry, "b").await;
    a.connect().await.unwrap();
    b.connect().await.unwrap();

    let line = factory.transports(SERIAL_PORT).remove(0);
    line.set_input_register(1, 10, TypedValue::Int16(11));
    line.set_input_register(2, 10, TypedValue::Int16(22));

    assert_eq!(
        a.data_point("Meter", "status").unwrap().get().await.unwrap(),
        TypedValue::Int16(11)
    );
    assert_eq!(
        b.data_point("Meter", "status").unwrap().get().await.unwrap(),
        TypedValue::Int16(22)
    );
}

// =============================================================================
// Serialized Access
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_access_concurrent_reads_never_overlap() {
    let factory = MockTransportFactory::new().with_latency(Duration::from_millis(20));
    let registry = shared_registry(&factory);
    let a = shared_device(&FrameFixtures::rtu_meter(1), &factory, &registry, "a").await;
    let b = shared_device(&FrameFixtures::rtu_meter(2), &factory, &registry, "b").await;
    a.connect().await.unwrap();
    b.connect().await.unwrap();

    let reads_a = async {
        for _ in 0..5 {
            a.data_point("Meter", "total").unwrap().get().await.unwrap();
        }
    };
    let reads_b = async {
        for _ in 0..5 {
            b.data_point("Meter", "relay").unwrap().get().await.unwrap();
        }
    };
    let writes_a = async {
        for value in 0..5u16 {
            a.data_point("Meter", "setpoint")
                .unwrap()
                .set(TypedValue::UInt16(value))
                .await
                .unwrap();
        }
    };
    tokio::join!(reads_a, reads_b, writes_a);

    let log = factory.log();
    assert_eq!(log.calls_on(SERIAL_PORT).len(), 15);
    assert_eq!(log.max_in_flight(SERIAL_PORT), 1);

    // Every start is immediately followed by its own end.
    let events = log.events();
    for pair in events.chunks(2) {
        assert_eq!(pair[0].phase, CallPhase::Start);
        assert_eq!(pair[1].phase, CallPhase::End);
        assert_eq!(pair[0].slave_id, pair[1].slave_id);
        assert_eq!(pair[0].address, pair[1].address);
    }
}

#[tokio::test(start_paused = true)]
async fn test_access_exclusive_devices_run_in_parallel() {
    let factory = MockTransportFactory::new().with_latency(Duration::from_millis(50));
    let a = build_device(&FrameFixtures::tcp_meter_at("10.0.0.1", 502, 1), &factory, None, "a").await;
    let b = build_device(&FrameFixtures::tcp_meter_at("10.0.0.2", 502, 1), &factory, None, "b").await;
    a.connect().await.unwrap();
    b.connect().await.unwrap();

    let started = tokio::time::Instant::now();
    let (ra, rb) = tokio::join!(
        a.data_point("Meter", "total").unwrap().get(),
        b.data_point("Meter", "total").unwrap().get(),
    );
    ra.unwrap();
    rb.unwrap();

    assert!(started.elapsed() < Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_access_timeout_releases_line() {
    let factory = MockTransportFactory::new().with_latency(Duration::from_millis(100));
    let registry = shared_registry(&factory);
    let a = shared_device(&FrameFixtures::rtu_meter(1), &factory, &registry, "a").await;
    let b = shared_device(&FrameFixtures::rtu_meter(2), &factory, &registry, "b").await;
    a.connect().await.unwrap();
    b.connect().await.unwrap();

    let cancelled = tokio::time::timeout(
        Duration::from_millis(10),
        a.data_point("Meter", "total").unwrap().get(),
    )
    .await;
    assert!(cancelled.is_err());

    let value = tokio::time::timeout(
        Duration::from_secs(1),
        b.data_point("Meter", "status").unwrap().get(),
    )
    .await
    .expect("line must be free after cancellation");
    assert!(value.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_access_aborted_task_releases_line() {
    let factory = MockTransportFactory::new().with_latency(Duration::from_secs(5));
    let registry = shared_registry(&factory);
    let a = shared_device(&FrameFixtures::rtu_meter(1), &factory, &registry, "a").await;
    let b = shared_device(&FrameFixtures::rtu_meter(2), &factory, &registry, "b").await;
    a.connect().await.unwrap();
    b.connect().await.unwrap();

    let total = a.data_point("Meter", "total").unwrap().clone();
    let handle = tokio::spawn(async move { total.get().await });
    for _ in 0..10 {
        if !factory.log().calls_on(SERIAL_PORT).is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(factory.log().calls_on(SERIAL_PORT).len(), 1);

    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());

    factory.created()[0].set_latency(Duration::from_millis(1));
    let value = tokio::time::timeout(
        Duration::from_secs(1),
        b.data_point("Meter", "status").unwrap().get(),
    )
    .await
    .expect("line must be free after abort");
    assert!(value.is_ok());
}

// =============================================================================
// Teardown
// =============================================================================

#[tokio::test]
async fn test_release_last_device_closes_line() {
    let factory = MockTransportFactory::new();
    let registry = shared_registry(&factory);
    let a = shared_device(&FrameFixtures::rtu_meter(1), &factory, &registry, "a").await;
    let b = shared_device(&FrameFixtures::rtu_meter(2), &factory, &registry, "b").await;
    a.connect().await.unwrap();
    b.connect().await.unwrap();
    let line = factory.transports(SERIAL_PORT).remove(0);

    a.release().await.unwrap();
    assert_eq!(registry.reference_count(SERIAL_PORT).await, 1);
    assert!(line.connected());
    assert!(b.is_connected());
    b.data_point("Meter", "total").unwrap().get().await.unwrap();

    b.release().await.unwrap();
    assert_eq!(registry.reference_count(SERIAL_PORT).await, 0);
    assert!(registry.entry_info(SERIAL_PORT).await.is_none());
    assert!(!line.connected());
    assert_eq!(line.disconnect_count(), 1);
}

#[tokio::test]
async fn test_release_reopens_fresh_line() {
    let factory = MockTransportFactory::new();
    let registry = shared_registry(&factory);

    let a = shared_device(&FrameFixtures::rtu_meter(1), &factory, &registry, "a").await;
    a.release().await.unwrap();

    // Other line settings are fine once the port is free again.
    let b = shared_device(
        &FrameFixtures::rtu_meter_on(SERIAL_PORT, 19200, "N", 1),
        &factory,
        &registry,
        "b",
    )
    .await;
    assert_eq!(factory.transports(SERIAL_PORT).len(), 2);
    assert_eq!(registry.reference_count(SERIAL_PORT).await, 1);
    b.release().await.unwrap();
}

#[tokio::test]
async fn test_release_on_drop() {
    let factory = MockTransportFactory::new();
    let registry = shared_registry(&factory);
    let a = shared_device(&FrameFixtures::rtu_meter(1), &factory, &registry, "a").await;
    let _b = shared_device(&FrameFixtures::rtu_meter(2), &factory, &registry, "b").await;

    drop(a);
    for _ in 0..10 {
        if registry.reference_count(SERIAL_PORT).await == 1 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(registry.reference_count(SERIAL_PORT).await, 1);
}

#[tokio::test]
async fn test_release_shutdown_closes_everything() {
    let factory = MockTransportFactory::new();
    let registry = shared_registry(&factory);
    let a = shared_device(&FrameFixtures::rtu_meter_on("/dev/ttyUSB0", 9600, "E", 1), &factory, &registry, "a").await;
    let b = shared_device(&FrameFixtures::rtu_meter_on("/dev/ttyUSB1", 9600, "E", 1), &factory, &registry, "b").await;
    a.connect().await.unwrap();
    b.connect().await.unwrap();

    registry.shutdown().await;

    assert!(registry.ports().await.is_empty());
    assert!(factory.created().iter().all(|t| !t.connected()));
    assert!(!a.is_connected());
    assert!(!b.is_connected());

    // Releasing after shutdown is harmless.
    a.release().await.unwrap();
    b.release().await.unwrap();
}

#[tokio::test]
async fn test_release_no_reconnect_after_shutdown() {
    let factory = MockTransportFactory::new();
    let registry = shared_registry(&factory);
    let a = shared_device(&FrameFixtures::rtu_meter(1), &factory, &registry, "a").await;
    a.connect().await.unwrap();

    registry.shutdown().await;

    let err = a.connect().await.unwrap_err();
    assert!(matches!(
        err,
        ModbusError::ResourceState(ResourceStateError::ClientClosed { .. })
    ));
    assert!(!a.is_connected());

    // A device registered afterwards gets a fresh line, the only open one.
    let b = shared_device(&FrameFixtures::rtu_meter(2), &factory, &registry, "b").await;
    b.connect().await.unwrap();

    let lines = factory.transports(SERIAL_PORT);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines.iter().filter(|line| line.connected()).count(), 1);
    assert_eq!(registry.reference_count(SERIAL_PORT).await, 1);

    a.release().await.unwrap();
    assert_eq!(lines.iter().filter(|line| line.connected()).count(), 1);

    b.release().await.unwrap();
    assert!(lines.iter().all(|line| !line.connected()));
    assert!(registry.ports().await.is_empty());
}
