// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Device interface identifiers.
//!
//! Each interface instance receives a fresh id at construction. Ids are
//! drawn from an [`IdSource`] so tests can substitute a deterministic one.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of randomly generated ids.
pub const DEVICE_ID_LEN: usize = 8;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Opaque identifier of one device interface instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Wraps an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Source of device ids.
pub trait IdSource: Send + Sync {
    /// Returns the next id. Ids must not repeat within a process.
    fn next_id(&self) -> DeviceId;
}

/// Draws ids of [`DEVICE_ID_LEN`] random ASCII letters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdSource;

impl IdSource for RandomIdSource {
    fn next_id(&self) -> DeviceId {
        let mut rng = rand::thread_rng();
        let id: String = (0..DEVICE_ID_LEN)
            .map(|_| char::from(LETTERS[rng.gen_range(0..LETTERS.len())]))
            .collect();
        DeviceId(id)
    }
}

/// Issues `prefix-1`, `prefix-2`, ... in order.
#[derive(Debug)]
pub struct SequentialIdSource {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdSource {
    /// Creates a source with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIdSource {
    fn default() -> Self {
        Self::new("device")
    }
}

impl IdSource for SequentialIdSource {
    fn next_id(&self) -> DeviceId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        DeviceId(format!("{}-{}", self.prefix, n))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_random_ids_are_letters() {
        let id = RandomIdSource.next_id();
        assert_eq!(id.as_str().len(), DEVICE_ID_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphabetic()));
    }

    #[test]
    fn test_random_ids_differ() {
        let ids: HashSet<_> = (0..64).map(|_| RandomIdSource.next_id()).collect();
        assert_eq!(ids.len(), 64);
    }

    #[test]
    fn test_sequential_ids() {
        let source = SequentialIdSource::new("meter");
        assert_eq!(source.next_id().as_str(), "meter-1");
        assert_eq!(source.next_id().as_str(), "meter-2");
    }

    #[test]
    fn test_serde_transparent() {
        let id = DeviceId::new("abcdEFGH");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abcdEFGH\"");
    }
}
