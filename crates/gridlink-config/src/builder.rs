// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Device builder.
//!
//! ```no_run
//! # async fn demo() -> gridlink_config::ConfigResult<()> {
//! use std::sync::Arc;
//! use gridlink_config::DeviceBuilder;
//! use gridlink_modbus::SharedClientRegistry;
//!
//! let registry = Arc::new(SharedClientRegistry::new());
//! let meter = DeviceBuilder::new()
//!     .frame_path("frames/meter.yaml")
//!     .property("serial_port", "/dev/ttyUSB0")
//!     .shared_rtu(registry)
//!     .build()
//!     .await?;
//! meter.connect().await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gridlink_modbus::{
    ConfigurationError, DeviceFrame, DeviceInterface, IdSource, InterfaceOptions, ModbusError,
    SharedClientRegistry, TransportFactory,
};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::loader::{FrameFormat, FrameLoader};
use crate::properties::Properties;

// =============================================================================
// DeviceProtocol
// =============================================================================

/// Communication protocol declared by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceProtocol {
    /// Modbus TCP or RTU.
    Modbus,
    /// REST API.
    RestApi,
    /// Message broker.
    Messaging,
    /// Dry contact.
    Contact,
    /// No interface declared.
    Generic,
}

impl DeviceProtocol {
    /// Resolves the protocol of a frame.
    ///
    /// A REST API block takes precedence over Modbus, then messaging and
    /// contact are considered.
    pub fn resolve(frame: &DeviceFrame) -> Self {
        let interfaces = &frame.interface;
        if interfaces.rest_api.is_some() {
            DeviceProtocol::RestApi
        } else if interfaces.modbus.is_some() {
            DeviceProtocol::Modbus
        } else if interfaces.messaging.is_some() {
            DeviceProtocol::Messaging
        } else if interfaces.contact.is_some() {
            DeviceProtocol::Contact
        } else {
            DeviceProtocol::Generic
        }
    }

    /// Returns the interface name used in the frame.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceProtocol::Modbus => "modbus",
            DeviceProtocol::RestApi => "rest_api",
            DeviceProtocol::Messaging => "messaging",
            DeviceProtocol::Contact => "contact",
            DeviceProtocol::Generic => "generic",
        }
    }
}

impl fmt::Display for DeviceProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// DeviceBuilder
// =============================================================================

#[derive(Debug, Clone)]
enum FrameSource {
    Path(PathBuf),
    Text(String),
}

/// Builds a [`DeviceInterface`] from a frame and its properties.
#[derive(Debug, Clone, Default)]
pub struct DeviceBuilder {
    source: Option<FrameSource>,
    format: Option<FrameFormat>,
    properties: Properties,
    properties_path: Option<PathBuf>,
    skip_env_vars: bool,
    options: InterfaceOptions,
}

impl DeviceBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the frame from a file.
    pub fn frame_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(FrameSource::Path(path.into()));
        self
    }

    /// Uses in-memory frame text.
    pub fn frame_str(mut self, text: impl Into<String>) -> Self {
        self.source = Some(FrameSource::Text(text.into()));
        self
    }

    /// Sets the frame format, overriding extension or content detection.
    pub fn format(mut self, format: FrameFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Adds properties from a map.
    pub fn properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.properties.extend(properties.into_iter().collect());
        self
    }

    /// Adds one property.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key, value);
        self
    }

    /// Reads properties from an INI file. Explicit properties win over the
    /// file.
    pub fn properties_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.properties_path = Some(path.into());
        self
    }

    /// Enables or disables `${VAR}` resolution. Enabled by default.
    pub fn env_vars(mut self, enabled: bool) -> Self {
        self.skip_env_vars = !enabled;
        self
    }

    /// Takes RTU clients from `registry`.
    pub fn shared_rtu(mut self, registry: Arc<SharedClientRegistry>) -> Self {
        self.options = self.options.with_shared_rtu(registry);
        self
    }

    /// Builds transports with `factory`.
    pub fn transport_factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.options = self.options.with_factory(factory);
        self
    }

    /// Issues device ids from `source`.
    pub fn id_source(mut self, source: Arc<dyn IdSource>) -> Self {
        self.options = self.options.with_id_source(source);
        self
    }

    /// Overrides the per-request timeout.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_operation_timeout(timeout);
        self
    }

    /// Overrides the TCP connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = Some(timeout);
        self
    }

    /// Loads and parses the frame without building a device.
    pub fn load_frame(&self) -> ConfigResult<DeviceFrame> {
        let loader = FrameLoader::new()
            .with_properties(self.resolved_properties()?)
            .with_env_vars(!self.skip_env_vars);

        match &self.source {
            Some(FrameSource::Path(path)) => match self.format {
                Some(format) => {
                    let content = std::fs::read_to_string(path).map_err(|e| {
                        if e.kind() == std::io::ErrorKind::NotFound {
                            ConfigError::file_not_found(path)
                        } else {
                            ConfigError::io(path, e)
                        }
                    })?;
                    loader.load_from_str(&content, format)
                }
                None => loader.load(path),
            },
            Some(FrameSource::Text(text)) => {
                let format = self.format.unwrap_or_else(|| FrameFormat::detect(text));
                loader.load_from_str(text, format)
            }
            None => Err(ConfigError::MissingFrame),
        }
    }

    /// Loads the frame and builds the device interface.
    ///
    /// Frames declaring anything other than a Modbus interface are
    /// rejected with a configuration error naming the interface.
    pub async fn build(self) -> ConfigResult<DeviceInterface> {
        let frame = self.load_frame()?;

        let protocol = DeviceProtocol::resolve(&frame);
        debug!(protocol = %protocol, device = frame.name().unwrap_or("<unnamed>"), "Resolved device protocol");
        match protocol {
            DeviceProtocol::Modbus => {}
            DeviceProtocol::Generic => {
                return Err(ModbusError::configuration(ConfigurationError::MissingTransport).into());
            }
            other => {
                return Err(ModbusError::configuration(ConfigurationError::unsupported_interface(
                    other.as_str(),
                ))
                .into());
            }
        }

        Ok(DeviceInterface::new(&frame, self.options).await?)
    }

    fn resolved_properties(&self) -> ConfigResult<Properties> {
        let mut properties = match &self.properties_path {
            Some(path) => Properties::from_path(path)?,
            None => Properties::new(),
        };
        properties.extend(self.properties.clone());
        Ok(properties)
    }
}

// =============================================================================
// Tests
// =============================================================================
