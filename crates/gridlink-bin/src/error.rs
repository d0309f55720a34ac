// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the gridlink binary.

use thiserror::Error;

/// Result type alias for gridlink-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors that can occur in the gridlink binary.
#[derive(Debug, Error)]
pub enum BinError {
    /// Invalid command-line usage.
    #[error("Usage error: {0}")]
    Usage(String),

    /// A named profile or data point does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Frame loading or device construction failed.
    #[error("Config error: {0}")]
    Config(#[from] gridlink_config::ConfigError),

    /// Device I/O failed.
    #[error("Device error: {0}")]
    Device(#[from] gridlink_modbus::ModbusError),

    /// Some data points of a batch read failed.
    #[error("{failed} of {total} data point reads failed")]
    PartialRead {
        /// Failed reads.
        failed: usize,
        /// Attempted reads.
        total: usize,
    },

    /// Output could not be rendered.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        /// The context description.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates a usage error.
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Creates a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Adds context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 64,
            Self::Config(_) => 1,
            Self::NotFound(_) => 2,
            Self::Device(_) => 3,
            Self::PartialRead { .. } => 4,
            Self::Output(_) => 5,
            Self::WithContext { source, .. } => source.exit_code(),
        }
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Reports an error with its cause chain and recovery hints.
pub fn report_error(error: &BinError) {
    eprintln!("Error: {}", error);

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }

    if let Some(device_error) = device_error(error) {
        for hint in device_error.recovery_hints() {
            eprintln!("  Hint: {}", hint);
        }
    }
}

/// Reports an error and exits with the appropriate code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

fn device_error(error: &BinError) -> Option<&gridlink_modbus::ModbusError> {
    match error {
        BinError::Device(e) => Some(e),
        BinError::Config(e) => e.as_modbus(),
        BinError::WithContext { source, .. } => device_error(source),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================
