// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for gridlink-config.

use std::path::PathBuf;

use gridlink_modbus::ModbusError;
use thiserror::Error;

/// Frame loading and device construction errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The frame or properties text could not be parsed.
    #[error("Failed to parse '{source_name}': {message}")]
    Parse {
        /// File path, or `<string>` for in-memory text.
        source_name: String,
        /// Parser message.
        message: String,
    },

    /// File I/O error.
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// An `${ENV}` placeholder names an unset variable and has no default,
    /// or a `{{key}}` placeholder has no property.
    #[error("Unresolved placeholder: {name}")]
    UnresolvedPlaceholder {
        /// Variable or property name.
        name: String,
    },

    /// Unsupported frame format.
    #[error("Unsupported frame format: {format}")]
    UnsupportedFormat {
        /// The unsupported format or extension.
        format: String,
    },

    /// The builder was asked to build without a frame source.
    #[error("No device frame given")]
    MissingFrame,

    /// Device construction failed.
    #[error(transparent)]
    Modbus(#[from] ModbusError),
}

impl ConfigError {
    /// Creates a parse error.
    pub fn parse(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Creates an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates an unresolved placeholder error.
    pub fn unresolved_placeholder(name: impl Into<String>) -> Self {
        Self::UnresolvedPlaceholder { name: name.into() }
    }

    /// Creates an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Returns the wrapped device error, if any.
    pub fn as_modbus(&self) -> Option<&ModbusError> {
        match self {
            Self::Modbus(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for gridlink-config.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use gridlink_modbus::ConfigurationError;

    #[test]
    fn test_display() {
        let err = ConfigError::unresolved_placeholder("METER_HOST");
        assert_eq!(err.to_string(), "Unresolved placeholder: ${METER_HOST}");

        let err = ConfigError::parse("meter.yaml", "bad indent");
        assert!(err.to_string().contains("meter.yaml"));
    }

    #[test]
    fn test_from_modbus() {
        let err: ConfigError =
            ModbusError::configuration(ConfigurationError::MissingTransport).into();
        assert!(matches!(
            err.as_modbus(),
            Some(ModbusError::Configuration(ConfigurationError::MissingTransport))
        ));
    }
}
