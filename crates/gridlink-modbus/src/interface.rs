// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Device interface.
//!
//! A [`DeviceInterface`] is built once from a [`DeviceFrame`]. Construction
//! resolves the transport parameters, obtains a client wrapper (a new
//! exclusive one, or a shared one from a [`SharedClientRegistry`]), and
//! builds the functional profile and data point graph. After that the
//! interface routes reads and writes by register kind:
//!
//! | Register kind     | Read                     | Write                     |
//! |-------------------|--------------------------|---------------------------|
//! | Input register    | `read_input_registers`   | unsupported               |
//! | Holding register  | `read_holding_registers` | `write_holding_registers` |
//! | Coil              | `read_coils`             | `write_coils`             |
//! | Discrete input    | `read_discrete_inputs`   | unsupported               |
//!
//! Interfaces on a shared line must be given back with
//! [`DeviceInterface::release`] so the registry can close the line once the
//! last one is gone.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::client::{ClientWrapper, NativeTransportFactory, Sharing, TransportFactory, TypedValue};
use crate::data_point::{DataPoint, FunctionalProfile};
use crate::error::{ConfigurationError, ModbusError, ModbusResult, UnsupportedOperationError};
use crate::frame::{
    ConfigurationParameterSpec, DeviceFrame, DeviceInformation, ModbusInterfaceSelection,
    ModbusInterfaceSpec,
};
use crate::id::{DeviceId, IdSource, RandomIdSource};
use crate::shared::SharedClientRegistry;
use crate::types::{
    ByteOrder, ModbusDataType, ModbusRtuConfig, ModbusTcpConfig, Parity, RegisterType,
    TransportKind,
};

/// Slave id used for RTU devices whose frame does not name one.
pub const DEFAULT_RTU_SLAVE_ID: u8 = 1;

// =============================================================================
// TransportParams
// =============================================================================

/// Resolved transport parameters of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportParams {
    /// Modbus TCP.
    Tcp {
        /// Host name or IP address.
        address: String,
        /// TCP port.
        port: u16,
        /// Slave id.
        slave_id: u8,
    },
    /// Modbus RTU.
    Rtu {
        /// Serial port.
        port_name: String,
        /// Baud rate.
        baud_rate: u32,
        /// Parity.
        parity: Parity,
        /// Slave id.
        slave_id: u8,
    },
}

impl TransportParams {
    /// Resolves the parameters of a Modbus interface block.
    ///
    /// TCP needs address, port and slave id. RTU needs port name, baud rate
    /// and parity; the slave id defaults to [`DEFAULT_RTU_SLAVE_ID`].
    pub fn resolve(spec: &ModbusInterfaceSpec) -> ModbusResult<Self> {
        match spec.selected() {
            Some(ModbusInterfaceSelection::Tcpip) => {
                let tcp = spec
                    .tcp
                    .as_ref()
                    .ok_or_else(|| ModbusError::missing_field("interface.modbus.tcp"))?;
                Ok(Self::Tcp {
                    address: tcp
                        .address
                        .clone()
                        .filter(|a| !a.trim().is_empty())
                        .ok_or_else(|| ModbusError::missing_field("interface.modbus.tcp.address"))?,
                    port: tcp
                        .port
                        .ok_or_else(|| ModbusError::missing_field("interface.modbus.tcp.port"))?,
                    slave_id: tcp
                        .slave_id
                        .ok_or_else(|| ModbusError::missing_field("interface.modbus.tcp.slave_id"))?,
                })
            }
            Some(ModbusInterfaceSelection::Rtu) => {
                let rtu = spec
                    .rtu
                    .as_ref()
                    .ok_or_else(|| ModbusError::missing_field("interface.modbus.rtu"))?;
                Ok(Self::Rtu {
                    port_name: rtu
                        .port_name
                        .clone()
                        .filter(|p| !p.trim().is_empty())
                        .ok_or_else(|| ModbusError::missing_field("interface.modbus.rtu.port_name"))?,
                    baud_rate: rtu
                        .baud_rate
                        .ok_or_else(|| ModbusError::missing_field("interface.modbus.rtu.baud_rate"))?,
                    parity: rtu
                        .parity
                        .ok_or_else(|| ModbusError::missing_field("interface.modbus.rtu.parity"))?,
                    slave_id: rtu.slave_id.unwrap_or(DEFAULT_RTU_SLAVE_ID),
                })
            }
            None => Err(ModbusError::configuration(ConfigurationError::MissingTransport)),
        }
    }

    /// Returns the transport kind.
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Tcp { .. } => TransportKind::Tcp,
            Self::Rtu { .. } => TransportKind::Rtu,
        }
    }

    /// Returns the slave id declared in the frame.
    pub fn slave_id(&self) -> u8 {
        match self {
            Self::Tcp { slave_id, .. } | Self::Rtu { slave_id, .. } => *slave_id,
        }
    }
}

impl fmt::Display for TransportParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp {
                address,
                port,
                slave_id,
            } => write!(f, "tcp {}:{} slave {}", address, port, slave_id),
            Self::Rtu {
                port_name,
                baud_rate,
                parity,
                slave_id,
            } => write!(f, "rtu {} {} {} slave {}", port_name, baud_rate, parity, slave_id),
        }
    }
}

// =============================================================================
// InterfaceOptions
// =============================================================================

/// Construction options for [`DeviceInterface`].
#[derive(Clone)]
pub struct InterfaceOptions {
    /// Registry to take RTU clients from. `None` gives each RTU interface
    /// its own serial connection. Ignored for TCP.
    pub shared_rtu: Option<Arc<SharedClientRegistry>>,
    /// Builds transports.
    pub factory: Arc<dyn TransportFactory>,
    /// Issues device ids.
    pub id_source: Arc<dyn IdSource>,
    /// Overrides the TCP connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Overrides the per-request timeout.
    pub operation_timeout: Option<Duration>,
}

impl InterfaceOptions {
    /// Uses the shared client registry for RTU devices.
    pub fn with_shared_rtu(mut self, registry: Arc<SharedClientRegistry>) -> Self {
        self.shared_rtu = Some(registry);
        self
    }

    /// Uses `factory` to build transports.
    pub fn with_factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Uses `source` to issue device ids.
    pub fn with_id_source(mut self, source: Arc<dyn IdSource>) -> Self {
        self.id_source = source;
        self
    }

    /// Overrides the per-request timeout.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }
}

impl Default for InterfaceOptions {
    fn default() -> Self {
        Self {
            shared_rtu: None,
            factory: Arc::new(NativeTransportFactory),
            id_source: Arc::new(RandomIdSource),
            connect_timeout: None,
            operation_timeout: None,
        }
    }
}

impl fmt::Debug for InterfaceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceOptions")
            .field("shared_rtu", &self.shared_rtu.is_some())
            .field("connect_timeout", &self.connect_timeout)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

// =============================================================================
// InterfaceCore
// =============================================================================

/// State shared between an interface and its data points.
pub(crate) struct InterfaceCore {
    device_id: DeviceId,
    slave_id: AtomicU8,
    wrapper: ClientWrapper,
}

impl InterfaceCore {
    pub(crate) async fn read(
        &self,
        register_type: RegisterType,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        self.ensure_connected()?;
        let slave_id = self.slave_id.load(Ordering::Acquire);

        let mut transport = self.wrapper.lock().await;
        let result = match register_type {
            RegisterType::InputRegister => {
                transport
                    .read_input_registers(slave_id, address, size, data_type)
                    .await
            }
            RegisterType::HoldingRegister => {
                transport
                    .read_holding_registers(slave_id, address, size, data_type)
                    .await
            }
            RegisterType::Coil => transport.read_coils(slave_id, address, size, data_type).await,
            RegisterType::DiscreteInput => {
                transport
                    .read_discrete_inputs(slave_id, address, size, data_type)
                    .await
            }
        };
        drop(transport);

        result.map_err(|e| {
            e.log(&format!("read {}@{} on {}", register_type, address, self.device_id));
            e
        })
    }

    pub(crate) async fn write(
        &self,
        register_type: RegisterType,
        address: u16,
        data_type: ModbusDataType,
        value: &TypedValue,
    ) -> ModbusResult<()> {
        if !register_type.is_writable() {
            return Err(ModbusError::unsupported(UnsupportedOperationError::read_only(
                register_type,
                address,
            )));
        }
        self.ensure_connected()?;
        let slave_id = self.slave_id.load(Ordering::Acquire);

        let mut transport = self.wrapper.lock().await;
        let result = match register_type {
            RegisterType::HoldingRegister => {
                transport
                    .write_holding_registers(slave_id, address, data_type, value)
                    .await
            }
            RegisterType::Coil => transport.write_coils(slave_id, address, data_type, value).await,
            RegisterType::InputRegister | RegisterType::DiscreteInput => {
                Err(ModbusError::unsupported(UnsupportedOperationError::read_only(
                    register_type,
                    address,
                )))
            }
        };
        drop(transport);

        result.map_err(|e| {
            e.log(&format!("write {}@{} on {}", register_type, address, self.device_id));
            e
        })
    }

    fn ensure_connected(&self) -> ModbusResult<()> {
        if self.wrapper.is_connected(&self.device_id) {
            Ok(())
        } else {
            Err(ModbusError::not_connected())
        }
    }
}

// =============================================================================
// DeviceInterface
// =============================================================================

struct SharedRegistration {
    registry: Arc<SharedClientRegistry>,
    port: String,
}

/// Uniform read/write interface to one device.
pub struct DeviceInterface {
    core: Arc<InterfaceCore>,
    params: TransportParams,
    byte_order: ByteOrder,
    profiles: Vec<FunctionalProfile>,
    profile_index: HashMap<String, usize>,
    information: DeviceInformation,
    configuration: Vec<ConfigurationParameterSpec>,
    shared: Option<SharedRegistration>,
    released: bool,
}

impl DeviceInterface {
    /// Builds an interface from a frame.
    ///
    /// Fails with a configuration error when the frame has no Modbus
    /// interface or lacks required transport parameters. Nothing is
    /// registered when construction fails.
    pub async fn new(frame: &DeviceFrame, options: InterfaceOptions) -> ModbusResult<Self> {
        let modbus = match (&frame.interface.modbus, frame.interface.alternative()) {
            (Some(modbus), _) => modbus,
            (None, Some(other)) => {
                return Err(ModbusError::configuration(
                    ConfigurationError::unsupported_interface(other),
                ));
            }
            (None, None) => {
                return Err(ModbusError::configuration(ConfigurationError::MissingTransport));
            }
        };

        let params = TransportParams::resolve(modbus)?;
        let byte_order = modbus.byte_order();
        let device_id = options.id_source.next_id();

        let (wrapper, shared) = Self::obtain_wrapper(&params, byte_order, &device_id, &options).await?;

        let core = Arc::new(InterfaceCore {
            device_id: device_id.clone(),
            slave_id: AtomicU8::new(params.slave_id()),
            wrapper,
        });
        let weak = Arc::downgrade(&core);

        let mut profiles: Vec<FunctionalProfile> = Vec::with_capacity(frame.functional_profiles.len());
        let mut profile_index = HashMap::with_capacity(frame.functional_profiles.len());
        for spec in &frame.functional_profiles {
            let profile = FunctionalProfile::from_spec(spec, &device_id, &weak);
            match profile_index.get(&spec.name) {
                Some(&slot) => profiles[slot] = profile,
                None => {
                    profile_index.insert(spec.name.clone(), profiles.len());
                    profiles.push(profile);
                }
            }
        }

        tracing::info!(
            device_id = %device_id,
            device = frame.name().unwrap_or("<unnamed>"),
            transport = %params,
            shared = shared.is_some(),
            profiles = profiles.len(),
            "Device interface created"
        );

        Ok(Self {
            core,
            params,
            byte_order,
            profiles,
            profile_index,
            information: frame.device_information.clone(),
            configuration: frame.configuration.clone(),
            shared,
            released: false,
        })
    }

    async fn obtain_wrapper(
        params: &TransportParams,
        byte_order: ByteOrder,
        device_id: &DeviceId,
        options: &InterfaceOptions,
    ) -> ModbusResult<(ClientWrapper, Option<SharedRegistration>)> {
        match params {
            TransportParams::Tcp {
                address,
                port,
                slave_id,
            } => {
                let mut config = ModbusTcpConfig {
                    host: address.clone(),
                    port: *port,
                    unit_id: *slave_id,
                    byte_order,
                    ..ModbusTcpConfig::default()
                };
                if let Some(timeout) = options.connect_timeout {
                    config.connect_timeout = timeout;
                }
                if let Some(timeout) = options.operation_timeout {
                    config.operation_timeout = timeout;
                }
                config.validate()?;

                let wrapper = ClientWrapper::new(options.factory.tcp(&config), Sharing::Exclusive);
                Ok((wrapper, None))
            }
            TransportParams::Rtu {
                port_name,
                baud_rate,
                parity,
                slave_id,
            } => {
                let mut config = ModbusRtuConfig {
                    port: port_name.clone(),
                    baud_rate: *baud_rate,
                    parity: *parity,
                    unit_id: *slave_id,
                    byte_order,
                    ..ModbusRtuConfig::default()
                };
                if let Some(timeout) = options.operation_timeout {
                    config.timeout = timeout;
                }
                config.validate()?;

                match &options.shared_rtu {
                    Some(registry) => {
                        tracing::debug!(port = %port_name, device_id = %device_id, "Using shared RTU client");
                        let wrapper = registry.register(&config, device_id).await?;
                        let registration = SharedRegistration {
                            registry: Arc::clone(registry),
                            port: port_name.clone(),
                        };
                        Ok((wrapper, Some(registration)))
                    }
                    None => {
                        let wrapper =
                            ClientWrapper::new(options.factory.rtu(&config), Sharing::Exclusive);
                        Ok((wrapper, None))
                    }
                }
            }
        }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Returns the logical device id of this instance.
    pub fn device_id(&self) -> &DeviceId {
        &self.core.device_id
    }

    /// Returns the transport kind.
    pub fn transport_kind(&self) -> TransportKind {
        self.params.kind()
    }

    /// Returns the resolved transport parameters.
    pub fn transport_params(&self) -> &TransportParams {
        &self.params
    }

    /// Returns the register word order.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Returns `true` if the interface uses a shared RTU client.
    pub fn is_shared(&self) -> bool {
        self.shared.is_some()
    }

    /// Returns the slave id used for requests.
    pub fn slave_id(&self) -> u8 {
        self.core.slave_id.load(Ordering::Acquire)
    }

    /// Changes the slave id used for subsequent requests.
    pub fn set_slave_id(&self, slave_id: u8) {
        let previous = self.core.slave_id.swap(slave_id, Ordering::AcqRel);
        tracing::debug!(device_id = %self.core.device_id, previous, slave_id, "Slave id changed");
    }

    /// Returns the device identity from the frame.
    pub fn device_information(&self) -> &DeviceInformation {
        &self.information
    }

    /// Returns the configuration parameters from the frame.
    pub fn configuration_parameters(&self) -> &[ConfigurationParameterSpec] {
        &self.configuration
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Returns the functional profiles in frame order.
    pub fn functional_profiles(&self) -> &[FunctionalProfile] {
        &self.profiles
    }

    /// Looks up a functional profile by name.
    pub fn functional_profile(&self, name: &str) -> Option<&FunctionalProfile> {
        self.profile_index.get(name).map(|&i| &self.profiles[i])
    }

    /// Looks up a data point by profile and data point name.
    pub fn data_point(&self, profile: &str, data_point: &str) -> Option<&DataPoint> {
        self.functional_profile(profile)?.data_point(data_point)
    }

    /// Iterates over every data point.
    pub fn data_points(&self) -> impl Iterator<Item = &DataPoint> {
        self.profiles.iter().flat_map(|fp| fp.data_points())
    }

    // =========================================================================
    // Connection
    // =========================================================================

    /// Connects this device. On a shared line the first connect opens it.
    pub async fn connect(&self) -> ModbusResult<()> {
        self.core.wrapper.connect(&self.core.device_id).await
    }

    /// Disconnects this device. A shared line stays open for the others.
    pub async fn disconnect(&self) -> ModbusResult<()> {
        self.core.wrapper.disconnect(&self.core.device_id).await
    }

    /// Returns `true` if this device is connected.
    pub fn is_connected(&self) -> bool {
        self.core.wrapper.is_connected(&self.core.device_id)
    }

    // =========================================================================
    // I/O
    // =========================================================================

    /// Reads `size` registers or bits of `register_type` at `address`.
    pub async fn read(
        &self,
        register_type: RegisterType,
        address: u16,
        size: u16,
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        self.core.read(register_type, address, size, data_type).await
    }

    /// Writes `value` to `register_type` at `address`.
    ///
    /// Input registers and discrete inputs are read-only and fail with an
    /// unsupported operation error before touching the transport.
    pub async fn write(
        &self,
        register_type: RegisterType,
        address: u16,
        data_type: ModbusDataType,
        value: &TypedValue,
    ) -> ModbusResult<()> {
        self.core.write(register_type, address, data_type, value).await
    }

    // =========================================================================
    // Release
    // =========================================================================

    /// Releases the interface.
    ///
    /// A shared interface is unregistered from its registry, which closes
    /// the line when no other device uses it. An exclusive interface closes
    /// its connection. Data points obtained from this interface fail after
    /// release.
    pub async fn release(mut self) -> ModbusResult<()> {
        let result = match &self.shared {
            Some(shared) => {
                shared
                    .registry
                    .unregister(&shared.port, &self.core.device_id)
                    .await;
                Ok(())
            }
            None => self.core.wrapper.disconnect(&self.core.device_id).await,
        };
        self.released = true;

        tracing::debug!(device_id = %self.core.device_id, "Device interface released");
        result
    }
}

impl Drop for DeviceInterface {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let Some(shared) = self.shared.take() else {
            return;
        };

        let device_id = self.core.device_id.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(
                    device_id = %device_id,
                    port = %shared.port,
                    "Device interface dropped without release, unregistering in background"
                );
                handle.spawn(async move {
                    shared.registry.unregister(&shared.port, &device_id).await;
                });
            }
            Err(_) => {
                tracing::warn!(
                    device_id = %device_id,
                    port = %shared.port,
                    "Device interface dropped without release outside a runtime, registration leaked"
                );
            }
        }
    }
}

impl fmt::Debug for DeviceInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceInterface")
            .field("device_id", &self.core.device_id)
            .field("transport", &self.params)
            .field("byte_order", &self.byte_order)
            .field("shared", &self.shared.is_some())
            .field("profiles", &self.profiles.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
