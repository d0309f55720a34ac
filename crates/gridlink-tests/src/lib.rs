// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gridlink Integration Tests
//!
//! Integration tests for gridlink together with the fixtures and mock
//! transports they share.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Device frames for TCP, RTU and shared RTU devices
//!   - `mocks`: Recording mock transport and factory
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p gridlink-tests
//!
//! # Run one suite
//! cargo test -p gridlink-tests --test integration_interface
//! cargo test -p gridlink-tests --test integration_shared
//! cargo test -p gridlink-tests --test integration_builder
//! ```
//!
//! ## Test Categories
//!
//! ### Interface Tests (`integration_interface.rs`)
//! - Register routing and slave ids
//! - Direction and read-only checks
//! - Connection state and release
//!
//! ### Shared Line Tests (`integration_shared.rs`)
//! - Reference counting per serial port
//! - Line setting conflicts
//! - Serialized access under concurrency and cancellation
//!
//! ### Builder Tests (`integration_builder.rs`)
//! - Frame files in every format
//! - Properties and environment placeholders
//! - Protocol selection
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use gridlink_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let factory = MockTransportFactory::new();
//!     let device = build_device(&FrameFixtures::tcp_meter(), &factory, None, "dev").await;
//!     // ... test logic
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::fixtures::*;
    pub use crate::common::mocks::*;
    pub use crate::common::{init_test_logging, temp_test_dir};
}
