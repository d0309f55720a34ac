// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus client layer.
//!
//! - **Transport**: the [`ModbusTransport`] contract and its factory
//! - **TCP / RTU**: `tokio-modbus` backed transports
//! - **Conversion**: register and bit decoding with byte order support
//! - **Wrapper**: [`ClientWrapper`], the per-port serialization lock
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       DeviceInterface                           │
//! │                 (routes reads and writes)                       │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       ClientWrapper                             │
//! │        (one lock per physical port, logical connections)        │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      ModbusTransport                            │
//! └─────────────────────────────────────────────────────────────────┘
//!            │                                     │
//!            ▼                                     ▼
//! ┌─────────────────────┐             ┌─────────────────────┐
//! │  ModbusTcpTransport │             │  ModbusRtuTransport │
//! │   (tokio-modbus)    │             │   (tokio-modbus)    │
//! └─────────────────────┘             └─────────────────────┘
//! ```

mod conversion;
mod rtu;
mod session;
mod tcp;
#[cfg(test)]
pub(crate) mod testing;
mod transport;
mod wrapper;

pub use conversion::DataConverter;
pub use rtu::ModbusRtuTransport;
pub use tcp::ModbusTcpTransport;
pub use transport::{ModbusTransport, NativeTransportFactory, TransportFactory, TransportState};
pub use wrapper::{ClientWrapper, Sharing};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, ModbusError, ModbusResult};
use crate::types::ModbusDataType;

// =============================================================================
// TypedValue
// =============================================================================

/// A decoded Modbus value.
///
/// Serializes untagged, so `Float32(50.0)` renders as `50.0` and
/// `Bits([true, false])` as `[true, false]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypedValue {
    /// Boolean value.
    Bool(bool),
    /// Block of bits read from several coils or discrete inputs.
    Bits(Vec<bool>),
    /// 8-bit signed integer.
    Int8(i8),
    /// 8-bit unsigned integer.
    UInt8(u8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 16-bit unsigned integer.
    UInt16(u16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit unsigned integer.
    UInt64(u64),
    /// 32-bit float.
    Float32(f32),
    /// 64-bit float.
    Float64(f64),
    /// String value.
    String(String),
}

impl TypedValue {
    /// Returns the value as a boolean.
    pub fn as_bool(&self) -> ModbusResult<bool> {
        match self {
            Self::Bool(v) => Ok(*v),
            Self::Bits(bits) if bits.len() == 1 => Ok(bits[0]),
            Self::String(_) | Self::Bits(_) => {
                Err(ModbusError::type_mismatch("bool", self.kind_name()))
            }
            Self::Float32(v) => Ok(*v != 0.0),
            Self::Float64(v) => Ok(*v != 0.0),
            _ => Ok(self.as_integer()? != 0),
        }
    }

    /// Returns the value as an i64.
    pub fn as_i64(&self) -> ModbusResult<i64> {
        let value = self.as_integer()?;
        i64::try_from(value).map_err(|_| {
            ModbusError::conversion(ConversionError::overflow(value.to_string(), "int64"))
        })
    }

    /// Returns the value as an f64.
    pub fn as_f64(&self) -> ModbusResult<f64> {
        match self {
            Self::Float32(v) => Ok(f64::from(*v)),
            Self::Float64(v) => Ok(*v),
            _ => Ok(self.as_integer()? as f64),
        }
    }

    /// Returns the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the data type of this value. Bit blocks report `Bool`.
    pub fn data_type(&self) -> ModbusDataType {
        match self {
            Self::Bool(_) | Self::Bits(_) => ModbusDataType::Bool,
            Self::Int8(_) => ModbusDataType::Int8,
            Self::UInt8(_) => ModbusDataType::UInt8,
            Self::Int16(_) => ModbusDataType::Int16,
            Self::UInt16(_) => ModbusDataType::UInt16,
            Self::Int32(_) => ModbusDataType::Int32,
            Self::UInt32(_) => ModbusDataType::UInt32,
            Self::Int64(_) => ModbusDataType::Int64,
            Self::UInt64(_) => ModbusDataType::UInt64,
            Self::Float32(_) => ModbusDataType::Float32,
            Self::Float64(_) => ModbusDataType::Float64,
            Self::String(_) => ModbusDataType::String,
        }
    }

    /// Parses text into a value of `data_type`.
    pub fn parse_as(data_type: ModbusDataType, text: &str) -> ModbusResult<Self> {
        let text = text.trim();
        let invalid = || ModbusError::type_mismatch(data_type.as_str(), text);

        let value = match data_type {
            ModbusDataType::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" => Self::Bool(true),
                "false" | "0" | "off" => Self::Bool(false),
                _ => return Err(invalid()),
            },
            ModbusDataType::Int8 => Self::Int8(text.parse().map_err(|_| invalid())?),
            ModbusDataType::UInt8 => Self::UInt8(text.parse().map_err(|_| invalid())?),
            ModbusDataType::Int16 => Self::Int16(text.parse().map_err(|_| invalid())?),
            ModbusDataType::UInt16 => Self::UInt16(text.parse().map_err(|_| invalid())?),
            ModbusDataType::Int32 => Self::Int32(text.parse().map_err(|_| invalid())?),
            ModbusDataType::UInt32 => Self::UInt32(text.parse().map_err(|_| invalid())?),
            ModbusDataType::Int64 => Self::Int64(text.parse().map_err(|_| invalid())?),
            ModbusDataType::UInt64 => Self::UInt64(text.parse().map_err(|_| invalid())?),
            ModbusDataType::Float32 => Self::Float32(text.parse().map_err(|_| invalid())?),
            ModbusDataType::Float64 => Self::Float64(text.parse().map_err(|_| invalid())?),
            ModbusDataType::String => Self::String(text.to_string()),
        };

        Ok(value)
    }

    /// Converts this value to `data_type` without loss.
    pub(crate) fn coerce(&self, data_type: ModbusDataType) -> ModbusResult<Self> {
        if self.data_type() == data_type && !matches!(self, Self::Bits(_)) {
            return Ok(self.clone());
        }

        let overflow = |value: i128| {
            ModbusError::conversion(ConversionError::overflow(value.to_string(), data_type.as_str()))
        };

        let value = match data_type {
            ModbusDataType::Bool => Self::Bool(self.as_bool()?),
            ModbusDataType::Float32 => Self::Float32(self.as_f64()? as f32),
            ModbusDataType::Float64 => Self::Float64(self.as_f64()?),
            ModbusDataType::String => {
                return Err(ModbusError::type_mismatch("string", self.kind_name()));
            }
            integer => {
                let v = self.as_integer()?;
                match integer {
                    ModbusDataType::Int8 => Self::Int8(i8::try_from(v).map_err(|_| overflow(v))?),
                    ModbusDataType::UInt8 => Self::UInt8(u8::try_from(v).map_err(|_| overflow(v))?),
                    ModbusDataType::Int16 => Self::Int16(i16::try_from(v).map_err(|_| overflow(v))?),
                    ModbusDataType::UInt16 => {
                        Self::UInt16(u16::try_from(v).map_err(|_| overflow(v))?)
                    }
                    ModbusDataType::Int32 => Self::Int32(i32::try_from(v).map_err(|_| overflow(v))?),
                    ModbusDataType::UInt32 => {
                        Self::UInt32(u32::try_from(v).map_err(|_| overflow(v))?)
                    }
                    ModbusDataType::Int64 => Self::Int64(i64::try_from(v).map_err(|_| overflow(v))?),
                    _ => Self::UInt64(u64::try_from(v).map_err(|_| overflow(v))?),
                }
            }
        };

        Ok(value)
    }

    /// Widens integral values. Floats qualify only when they hold a whole number.
    fn as_integer(&self) -> ModbusResult<i128> {
        match self {
            Self::Bool(v) => Ok(i128::from(*v)),
            Self::Int8(v) => Ok(i128::from(*v)),
            Self::UInt8(v) => Ok(i128::from(*v)),
            Self::Int16(v) => Ok(i128::from(*v)),
            Self::UInt16(v) => Ok(i128::from(*v)),
            Self::Int32(v) => Ok(i128::from(*v)),
            Self::UInt32(v) => Ok(i128::from(*v)),
            Self::Int64(v) => Ok(i128::from(*v)),
            Self::UInt64(v) => Ok(i128::from(*v)),
            Self::Float32(v) if v.fract() == 0.0 && v.is_finite() => Ok(*v as i128),
            Self::Float64(v) if v.fract() == 0.0 && v.is_finite() => Ok(*v as i128),
            _ => Err(ModbusError::type_mismatch("integer", self.kind_name())),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Bits(_) => "bits",
            other => other.data_type().as_str(),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Bits(bits) => {
                let rendered: Vec<&str> =
                    bits.iter().map(|b| if *b { "1" } else { "0" }).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Self::Int8(v) => write!(f, "{v}"),
            Self::UInt8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
        }
    }
}

// =============================================================================
// ClientStats
// =============================================================================

/// Request counters kept by each transport.
#[derive(Debug, Default)]
pub struct ClientStats {
    total_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_response_time_us: AtomicU64,
    connections: AtomicU64,
}

impl ClientStats {
    /// Creates new statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful operation.
    pub fn record_success(&self, duration: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// Records a failed operation.
    pub fn record_error(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an established connection.
    pub fn record_connection(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the total number of requests.
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Returns the number of failed requests.
    pub fn failed_requests(&self) -> u64 {
        self.failed_requests.load(Ordering::Relaxed)
    }

    /// Returns the number of connections established.
    pub fn connections(&self) -> u64 {
        self.connections.load(Ordering::Relaxed)
    }

    /// Returns the average response time of successful requests.
    pub fn average_response_time(&self) -> Duration {
        let success = self.total_requests() - self.failed_requests();
        if success == 0 {
            return Duration::ZERO;
        }
        let total_us = self.total_response_time_us.load(Ordering::Relaxed);
        Duration::from_micros(total_us / success)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_value_conversions() {
        let bool_val = TypedValue::Bool(true);
        assert!(bool_val.as_bool().unwrap());
        assert_eq!(bool_val.as_i64().unwrap(), 1);
        assert_eq!(bool_val.as_f64().unwrap(), 1.0);

        let int_val = TypedValue::Int16(42);
        assert_eq!(int_val.as_i64().unwrap(), 42);
        assert_eq!(int_val.as_f64().unwrap(), 42.0);

        let float_val = TypedValue::Float32(3.5);
        assert!((float_val.as_f64().unwrap() - 3.5).abs() < f64::EPSILON);
        assert!(float_val.as_i64().is_err());
    }

    #[test]
    fn test_data_type() {
        assert_eq!(TypedValue::Bool(true).data_type(), ModbusDataType::Bool);
        assert_eq!(TypedValue::Bits(vec![true]).data_type(), ModbusDataType::Bool);
        assert_eq!(TypedValue::Float32(0.0).data_type(), ModbusDataType::Float32);
    }

    #[test]
    fn test_parse_as() {
        assert_eq!(
            TypedValue::parse_as(ModbusDataType::UInt16, "1200").unwrap(),
            TypedValue::UInt16(1200)
        );
        assert_eq!(
            TypedValue::parse_as(ModbusDataType::Bool, "on").unwrap(),
            TypedValue::Bool(true)
        );
        assert!(TypedValue::parse_as(ModbusDataType::Int8, "300").is_err());
    }

    #[test]
    fn test_coerce() {
        assert_eq!(
            TypedValue::Float64(12.0).coerce(ModbusDataType::Int16).unwrap(),
            TypedValue::Int16(12)
        );
        assert!(TypedValue::Int16(-1).coerce(ModbusDataType::UInt16).is_err());
        assert!(TypedValue::String("x".into()).coerce(ModbusDataType::Int16).is_err());
    }

    #[test]
    fn test_untagged_serialization() {
        assert_eq!(serde_json::to_string(&TypedValue::Float32(50.0)).unwrap(), "50.0");
        assert_eq!(
            serde_json::to_string(&TypedValue::Bits(vec![true, false])).unwrap(),
            "[true,false]"
        );
    }

    #[test]
    fn test_client_stats() {
        let stats = ClientStats::new();
        stats.record_success(Duration::from_millis(10));
        stats.record_error();
        stats.record_connection();

        assert_eq!(stats.total_requests(), 2);
        assert_eq!(stats.failed_requests(), 1);
        assert_eq!(stats.connections(), 1);
        assert_eq!(stats.average_response_time(), Duration::from_millis(10));
    }
}
