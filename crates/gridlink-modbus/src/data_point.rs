// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Functional profiles and data points.
//!
//! A [`DataPoint`] is a thin handle: it carries its addressing and direction
//! and forwards `get`/`set` to the interface that built it. The link back is
//! weak, so a data point never keeps its interface alive; once the interface
//! is gone every call fails with [`ResourceStateError::InterfaceReleased`].

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::client::TypedValue;
use crate::error::{DirectionError, ModbusError, ModbusResult, ResourceStateError};
use crate::frame::{DataPointSpec, FunctionalProfileSpec};
use crate::id::DeviceId;
use crate::interface::InterfaceCore;
use crate::types::{DataDirection, ModbusDataType, RegisterType};

// =============================================================================
// RegisterLayout
// =============================================================================

/// Fully resolved Modbus addressing of a data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterLayout {
    /// Register kind.
    pub register_type: RegisterType,
    /// Start address.
    pub address: u16,
    /// Register or bit count.
    pub size: u16,
    /// Value type.
    pub data_type: ModbusDataType,
}

/// Options for [`DataPoint::get_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Accepted for compatibility. There is no cache, so reads always reach
    /// the device.
    pub skip_cache: bool,
}

// =============================================================================
// DataPoint
// =============================================================================

/// One addressable value of a device.
#[derive(Clone)]
pub struct DataPoint {
    profile: String,
    name: String,
    direction: DataDirection,
    register_type: Option<RegisterType>,
    address: Option<u16>,
    size: Option<u16>,
    data_type: Option<ModbusDataType>,
    device_id: DeviceId,
    interface: Weak<InterfaceCore>,
}

impl DataPoint {
    pub(crate) fn from_spec(
        profile: &str,
        spec: &DataPointSpec,
        device_id: &DeviceId,
        interface: Weak<InterfaceCore>,
    ) -> Self {
        let modbus = spec.modbus.clone().unwrap_or_default();
        Self {
            profile: profile.to_string(),
            name: spec.name.clone(),
            direction: spec.direction.unwrap_or_default(),
            register_type: modbus.register_type,
            address: modbus.address,
            size: modbus.size,
            data_type: modbus.data_type,
            device_id: device_id.clone(),
            interface,
        }
    }

    /// Returns `(profile name, data point name)`.
    pub fn name(&self) -> (&str, &str) {
        (&self.profile, &self.name)
    }

    /// Returns the access direction.
    pub fn direction(&self) -> DataDirection {
        self.direction
    }

    /// Returns the declared register kind, if any.
    pub fn register_type(&self) -> Option<RegisterType> {
        self.register_type
    }

    /// Returns the declared address, if any.
    pub fn address(&self) -> Option<u16> {
        self.address
    }

    /// Returns the declared value type, if any.
    pub fn data_type(&self) -> Option<ModbusDataType> {
        self.data_type
    }

    /// Resolves the register layout.
    ///
    /// A missing size falls back to the width of the data type. A missing
    /// register kind, address or data type leaves the point unaddressed.
    pub fn layout(&self) -> ModbusResult<RegisterLayout> {
        let register_type = self.register_type.ok_or_else(|| self.unaddressed("register_type"))?;
        let address = self.address.ok_or_else(|| self.unaddressed("address"))?;
        let data_type = self.data_type.ok_or_else(|| self.unaddressed("data_type"))?;
        let size = self.size.unwrap_or_else(|| data_type.register_count());

        Ok(RegisterLayout {
            register_type,
            address,
            size,
            data_type,
        })
    }

    /// Returns `true` if the point can be used for I/O.
    pub fn is_addressed(&self) -> bool {
        self.layout().is_ok()
    }

    /// Reads the current value.
    pub async fn get(&self) -> ModbusResult<TypedValue> {
        self.get_with(ReadOptions::default()).await
    }

    /// Reads the current value with options.
    pub async fn get_with(&self, _options: ReadOptions) -> ModbusResult<TypedValue> {
        if !self.direction.is_readable() {
            return Err(ModbusError::direction(DirectionError::NotReadable {
                profile: self.profile.clone(),
                data_point: self.name.clone(),
                direction: self.direction,
            }));
        }

        let layout = self.layout()?;
        let interface = self.interface()?;
        interface
            .read(layout.register_type, layout.address, layout.size, layout.data_type)
            .await
    }

    /// Writes a value.
    pub async fn set(&self, value: TypedValue) -> ModbusResult<()> {
        if !self.direction.is_writable() {
            return Err(ModbusError::direction(DirectionError::NotWritable {
                profile: self.profile.clone(),
                data_point: self.name.clone(),
                direction: self.direction,
            }));
        }

        let layout = self.layout()?;
        let interface = self.interface()?;
        interface
            .write(layout.register_type, layout.address, layout.data_type, &value)
            .await
    }

    fn interface(&self) -> ModbusResult<Arc<InterfaceCore>> {
        self.interface.upgrade().ok_or_else(|| {
            ModbusError::resource_state(ResourceStateError::InterfaceReleased {
                device_id: self.device_id.to_string(),
            })
        })
    }

    fn unaddressed(&self, missing: &'static str) -> ModbusError {
        ModbusError::resource_state(ResourceStateError::unaddressed(
            self.profile.clone(),
            self.name.clone(),
            missing,
        ))
    }
}

impl std::fmt::Debug for DataPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataPoint")
            .field("profile", &self.profile)
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("register_type", &self.register_type)
            .field("address", &self.address)
            .field("size", &self.size)
            .field("data_type", &self.data_type)
            .finish()
    }
}

// =============================================================================
// FunctionalProfile
// =============================================================================

/// Named, ordered collection of data points.
#[derive(Debug, Clone)]
pub struct FunctionalProfile {
    name: String,
    points: Vec<DataPoint>,
    index: HashMap<String, usize>,
}

impl FunctionalProfile {
    /// Builds a profile from its frame description.
    ///
    /// A repeated data point name replaces the earlier point in place, so
    /// the later declaration wins but keeps the first position.
    pub(crate) fn from_spec(
        spec: &FunctionalProfileSpec,
        device_id: &DeviceId,
        interface: &Weak<InterfaceCore>,
    ) -> Self {
        let mut profile = Self {
            name: spec.name.clone(),
            points: Vec::with_capacity(spec.data_points.len()),
            index: HashMap::with_capacity(spec.data_points.len()),
        };

        for dp in &spec.data_points {
            let point = DataPoint::from_spec(&spec.name, dp, device_id, interface.clone());
            match profile.index.get(&dp.name) {
                Some(&slot) => {
                    tracing::debug!(
                        profile = %spec.name,
                        data_point = %dp.name,
                        "Duplicate data point name, later declaration wins"
                    );
                    profile.points[slot] = point;
                }
                None => {
                    profile.index.insert(dp.name.clone(), profile.points.len());
                    profile.points.push(point);
                }
            }
        }

        profile
    }

    /// Returns the profile name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the data points in declaration order.
    pub fn data_points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Looks up a data point by name.
    pub fn data_point(&self, name: &str) -> Option<&DataPoint> {
        self.index.get(name).map(|&i| &self.points[i])
    }

    /// Returns the number of data points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the profile has no data points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
