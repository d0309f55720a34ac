// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Lock-guarded handle to one physical transport.
//!
//! A [`ClientWrapper`] pairs a transport with the async mutex that
//! serializes every request on its port. Clones share both, so all device
//! interfaces on a shared serial line contend for the same lock.
//!
//! Connection state is split in two:
//!
//! - **physical**: whether the transport's link is open
//! - **logical**: which device interfaces consider themselves connected
//!
//! A device is connected only when both hold. On a shared wrapper a device
//! disconnect clears only its logical flag; the link stays open for the
//! other devices until the registry closes it. A closed wrapper is retired:
//! it never reopens its link.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex as SyncMutex;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::{ModbusError, ModbusResult, ResourceStateError};
use crate::id::DeviceId;

use super::ModbusTransport;

/// Ownership mode of a wrapper's physical link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sharing {
    /// Owned by a single device interface.
    Exclusive,
    /// Owned by the shared client registry.
    Shared,
}

/// Cloneable handle to a lock-guarded transport.
#[derive(Clone)]
pub struct ClientWrapper {
    transport: Arc<Mutex<Box<dyn ModbusTransport>>>,
    physical: Arc<AtomicBool>,
    retired: Arc<AtomicBool>,
    logical: Arc<SyncMutex<HashSet<DeviceId>>>,
    sharing: Sharing,
    name: Arc<str>,
}

impl ClientWrapper {
    /// Wraps a transport.
    pub fn new(transport: Box<dyn ModbusTransport>, sharing: Sharing) -> Self {
        let name: Arc<str> = Arc::from(transport.display_name());
        Self {
            transport: Arc::new(Mutex::new(transport)),
            physical: Arc::new(AtomicBool::new(false)),
            retired: Arc::new(AtomicBool::new(false)),
            logical: Arc::new(SyncMutex::new(HashSet::new())),
            sharing,
            name,
        }
    }

    /// Returns the sharing mode.
    pub fn sharing(&self) -> Sharing {
        self.sharing
    }

    /// Returns the transport display name.
    pub fn display_name(&self) -> &str {
        &self.name
    }

    /// Acquires the port lock.
    ///
    /// The guard grants exclusive use of the transport; dropping it,
    /// including by cancelling the awaiting future, releases the port.
    pub async fn lock(&self) -> MutexGuard<'_, Box<dyn ModbusTransport>> {
        self.transport.lock().await
    }

    /// Opens the physical link if needed and marks `device` connected.
    ///
    /// Fails with [`ResourceStateError::ClientClosed`] once the wrapper has
    /// been closed.
    pub async fn connect(&self, device: &DeviceId) -> ModbusResult<()> {
        let mut transport = self.transport.lock().await;
        if self.is_retired() {
            return Err(ModbusError::resource_state(ResourceStateError::ClientClosed {
                transport: self.name.to_string(),
            }));
        }
        if !transport.is_connected() {
            transport.connect().await?;
        }
        self.physical.store(true, Ordering::Release);
        self.logical.lock().insert(device.clone());

        tracing::debug!(
            device_id = %device,
            transport = %self.name,
            "Device logically connected"
        );
        Ok(())
    }

    /// Marks `device` disconnected.
    ///
    /// Exclusive wrappers also close the physical link.
    pub async fn disconnect(&self, device: &DeviceId) -> ModbusResult<()> {
        let removed = self.logical.lock().remove(device);

        if self.sharing == Sharing::Exclusive {
            let mut transport = self.transport.lock().await;
            transport.disconnect().await?;
            self.physical.store(false, Ordering::Release);
        }

        if removed {
            tracing::debug!(
                device_id = %device,
                transport = %self.name,
                "Device logically disconnected"
            );
        }
        Ok(())
    }

    /// Returns `true` when the link is open and `device` is logically
    /// connected. Never waits on the port lock.
    pub fn is_connected(&self, device: &DeviceId) -> bool {
        self.is_physically_connected() && self.logical.lock().contains(device)
    }

    /// Returns `true` if the physical link is open.
    pub fn is_physically_connected(&self) -> bool {
        self.physical.load(Ordering::Acquire)
    }

    /// Returns `true` once [`close`](Self::close) has run.
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    /// Returns the number of logically connected devices.
    pub fn logical_connections(&self) -> usize {
        self.logical.lock().len()
    }

    /// Forgets `device` without touching the link.
    pub(crate) fn forget(&self, device: &DeviceId) {
        self.logical.lock().remove(device);
    }

    /// Closes the physical link, clears every logical flag and retires the
    /// wrapper.
    pub async fn close(&self) -> ModbusResult<()> {
        let mut transport = self.transport.lock().await;
        self.retired.store(true, Ordering::Release);
        self.logical.lock().clear();
        self.physical.store(false, Ordering::Release);
        transport.disconnect().await
    }
}

impl fmt::Debug for ClientWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientWrapper")
            .field("transport", &self.name)
            .field("sharing", &self.sharing)
            .field("physical", &self.is_physically_connected())
            .field("retired", &self.is_retired())
            .field("logical", &self.logical_connections())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
