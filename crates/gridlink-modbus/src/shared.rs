// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Pool of shared RTU clients.
//!
//! A serial line carries one transaction at a time and must not be opened
//! twice. [`SharedClientRegistry`] keeps one [`ClientWrapper`] per serial
//! port and hands clones of it to every device interface registered on that
//! port. The wrapper's lock serializes their requests.
//!
//! The registry is an ordinary value: create one at startup, pass an
//! `Arc` to the builders that need it, and call [`shutdown`] on exit.
//!
//! ```text
//!  DeviceInterface a ──┐
//!  DeviceInterface b ──┼──▶ entry "/dev/ttyUSB0" ──▶ ClientWrapper ──▶ RTU transport
//!  DeviceInterface c ──┘        devices {a,b,c}        (port lock)
//! ```
//!
//! [`shutdown`]: SharedClientRegistry::shutdown

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::client::{ClientWrapper, NativeTransportFactory, Sharing, TransportFactory};
use crate::error::{ConfigurationError, ModbusError, ModbusResult};
use crate::id::DeviceId;
use crate::types::{ModbusRtuConfig, Parity};

// =============================================================================
// Entries
// =============================================================================

struct SharedEntry {
    config: ModbusRtuConfig,
    wrapper: ClientWrapper,
    devices: BTreeSet<DeviceId>,
}

impl SharedEntry {
    /// Rejects a registration whose line settings differ from the pooled ones.
    fn check_compatible(&self, requested: &ModbusRtuConfig) -> ModbusResult<()> {
        let existing = &self.config;
        let port = existing.port.as_str();

        let mismatch = if existing.baud_rate != requested.baud_rate {
            Some(ConfigurationError::shared_port_mismatch(
                port,
                "baud_rate",
                existing.baud_rate,
                requested.baud_rate,
            ))
        } else if existing.parity != requested.parity {
            Some(ConfigurationError::shared_port_mismatch(
                port,
                "parity",
                existing.parity,
                requested.parity,
            ))
        } else if existing.data_bits != requested.data_bits {
            Some(ConfigurationError::shared_port_mismatch(
                port,
                "data_bits",
                existing.data_bits,
                requested.data_bits,
            ))
        } else if existing.stop_bits != requested.stop_bits {
            Some(ConfigurationError::shared_port_mismatch(
                port,
                "stop_bits",
                existing.stop_bits,
                requested.stop_bits,
            ))
        } else if existing.byte_order != requested.byte_order {
            Some(ConfigurationError::shared_port_mismatch(
                port,
                "byte_order",
                existing.byte_order,
                requested.byte_order,
            ))
        } else {
            None
        };

        match mismatch {
            Some(error) => Err(ModbusError::configuration(error)),
            None => Ok(()),
        }
    }
}

/// Snapshot of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedEntryInfo {
    /// Number of registered device interfaces.
    pub reference_count: usize,
    /// Registered device ids, sorted.
    pub devices: Vec<DeviceId>,
    /// Whether the serial line is open.
    pub physically_connected: bool,
}

// =============================================================================
// SharedClientRegistry
// =============================================================================

/// Reference-counted table of shared RTU clients keyed by serial port.
///
/// The reference count of an entry is the size of its device set, so the
/// two cannot disagree. Every mutation happens under one table lock, which
/// also makes construction of a new entry race-free.
pub struct SharedClientRegistry {
    factory: Arc<dyn TransportFactory>,
    entries: Mutex<HashMap<String, SharedEntry>>,
}

impl SharedClientRegistry {
    /// Creates a registry backed by the native RTU transport.
    pub fn new() -> Self {
        Self::with_factory(Arc::new(NativeTransportFactory))
    }

    /// Creates a registry that builds transports with `factory`.
    pub fn with_factory(factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            factory,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Registers `device` on the port described by `config` and returns the
    /// shared wrapper.
    ///
    /// The first registration creates the entry; the line stays closed until
    /// a device connects. Later registrations must use the same line
    /// settings or fail with [`ConfigurationError::SharedPortMismatch`],
    /// leaving the entry untouched. Registering the same device twice is a
    /// no-op.
    pub async fn register(
        &self,
        config: &ModbusRtuConfig,
        device: &DeviceId,
    ) -> ModbusResult<ClientWrapper> {
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get_mut(&config.port) {
            entry.check_compatible(config)?;
            entry.devices.insert(device.clone());

            tracing::debug!(
                port = %config.port,
                device_id = %device,
                reference_count = entry.devices.len(),
                "Registered device on shared RTU port"
            );
            return Ok(entry.wrapper.clone());
        }

        let wrapper = ClientWrapper::new(self.factory.rtu(config), Sharing::Shared);
        let mut devices = BTreeSet::new();
        devices.insert(device.clone());
        entries.insert(
            config.port.clone(),
            SharedEntry {
                config: config.clone(),
                wrapper: wrapper.clone(),
                devices,
            },
        );

        tracing::debug!(
            port = %config.port,
            device_id = %device,
            line = %config.line_settings(),
            "Created shared RTU client"
        );
        Ok(wrapper)
    }

    /// Registers `device` on `port` with the given parity and baud rate and
    /// default values for everything else.
    pub async fn register_port(
        &self,
        port: &str,
        parity: Parity,
        baud_rate: u32,
        device: &DeviceId,
    ) -> ModbusResult<ClientWrapper> {
        let config = ModbusRtuConfig {
            port: port.to_string(),
            baud_rate,
            parity,
            ..ModbusRtuConfig::default()
        };
        self.register(&config, device).await
    }

    /// Removes `device` from `port`.
    ///
    /// When the last device leaves, the serial line is closed and the entry
    /// removed. Unknown ports and devices are ignored.
    pub async fn unregister(&self, port: &str, device: &DeviceId) {
        let mut entries = self.entries.lock().await;

        let Some(entry) = entries.get_mut(port) else {
            tracing::debug!(port, device_id = %device, "Unregister for unknown port ignored");
            return;
        };

        if !entry.devices.remove(device) {
            tracing::debug!(port, device_id = %device, "Unregister for unknown device ignored");
            return;
        }
        entry.wrapper.forget(device);

        tracing::debug!(
            port,
            device_id = %device,
            reference_count = entry.devices.len(),
            "Unregistered device from shared RTU port"
        );

        if entry.devices.is_empty() {
            if let Some(entry) = entries.remove(port) {
                Self::close_entry(port, &entry).await;
            }
        }
    }

    /// Returns the number of devices registered on `port`.
    pub async fn reference_count(&self, port: &str) -> usize {
        self.entries
            .lock()
            .await
            .get(port)
            .map_or(0, |entry| entry.devices.len())
    }

    /// Returns a snapshot of the entry for `port`.
    pub async fn entry_info(&self, port: &str) -> Option<SharedEntryInfo> {
        self.entries.lock().await.get(port).map(|entry| SharedEntryInfo {
            reference_count: entry.devices.len(),
            devices: entry.devices.iter().cloned().collect(),
            physically_connected: entry.wrapper.is_physically_connected(),
        })
    }

    /// Returns the registered ports, sorted.
    pub async fn ports(&self) -> Vec<String> {
        let mut ports: Vec<String> = self.entries.lock().await.keys().cloned().collect();
        ports.sort();
        ports
    }

    /// Closes every serial line and clears the table.
    pub async fn shutdown(&self) {
        let mut entries = self.entries.lock().await;
        for (port, entry) in entries.drain() {
            Self::close_entry(&port, &entry).await;
        }
        tracing::info!("Shared RTU registry shut down");
    }

    async fn close_entry(port: &str, entry: &SharedEntry) {
        match entry.wrapper.close().await {
            Ok(()) => tracing::info!(port, "Closed shared RTU port"),
            Err(e) => tracing::warn!(port, error = %e, "Failed to close shared RTU port"),
        }
    }
}

impl Default for SharedClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ports = self.entries.try_lock().map(|entries| entries.len()).ok();
        f.debug_struct("SharedClientRegistry")
            .field("ports", &ports)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
