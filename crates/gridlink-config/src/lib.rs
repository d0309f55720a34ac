// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gridlink-config
//!
//! Device frame loading and device construction for gridlink.
//!
//! ## Features
//!
//! - **Multi-Format Support**: YAML, TOML and JSON device frames
//! - **Properties**: `{{key}}` placeholders filled from a map or an INI file
//! - **Environment Placeholders**: `${VAR}` and `${VAR:default}`
//! - **Device Builder**: frame to [`gridlink_modbus::DeviceInterface`] in one call
//!
//! ## Quick Start
//!
//! ```no_run
//! use gridlink_config::loader::load_frame;
//!
//! let frame = load_frame("meter.yaml").unwrap();
//! println!("Device: {:?}", frame.name());
//! println!("Profiles: {}", frame.functional_profiles.len());
//! ```
//!
//! Frames can reference installation values:
//!
//! ```yaml
//! interface:
//!   modbus:
//!     rtu:
//!       port_name: "{{serial_port}}"
//!       baud_rate: ${METER_BAUD:9600}
//!       parity: E
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod builder;
pub mod error;
pub mod loader;
pub mod properties;

// =============================================================================
// Re-exports
// =============================================================================

pub use builder::{DeviceBuilder, DeviceProtocol};
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_frame, load_frame_str, resolve_env_placeholders, FrameFormat, FrameLoader};
pub use properties::Properties;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "gridlink-config");
    }
}
