// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Frame properties.
//!
//! Frames may carry `{{key}}` placeholders for installation specific values
//! such as host addresses or serial ports. Properties come from a map or an
//! INI file; keys of every section (and outside any section) take part, a
//! later section winning on a repeated key.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use config::Source;
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};

/// Key/value pairs substituted into `{{key}}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    /// Creates an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads properties from an INI file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_ini(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => {
                ConfigError::parse(path.display().to_string(), message)
            }
            other => other,
        })
    }

    /// Parses properties from INI text.
    pub fn from_ini(content: &str) -> ConfigResult<Self> {
        let parsed = config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Ini))
            .build()
            .map_err(|e| ConfigError::parse("<properties>", e.to_string()))?;
        let root = parsed
            .collect()
            .map_err(|e| ConfigError::parse("<properties>", e.to_string()))?;

        let mut properties = Self::new();
        let mut sections = Vec::new();
        for (key, value) in root {
            match value.clone().into_table() {
                Ok(section) => sections.push((key, section)),
                Err(_) => {
                    let value = value
                        .into_string()
                        .map_err(|e| ConfigError::parse("<properties>", e.to_string()))?;
                    properties.insert(key, value);
                }
            }
        }

        sections.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, section) in sections {
            for (key, value) in section {
                let value = value
                    .into_string()
                    .map_err(|e| ConfigError::parse("<properties>", e.to_string()))?;
                properties.insert(key, value);
            }
        }

        Ok(properties)
    }

    /// Sets a property.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Adds every pair from `other`, overriding existing keys.
    pub fn extend(&mut self, other: Properties) {
        self.values.extend(other.values);
    }

    /// Returns a property value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns the number of properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replaces every `{{key}}` in `text` with its value.
    ///
    /// Placeholders without a matching property are left in place.
    pub fn apply(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (key, value) in &self.values {
            let placeholder = format!("{{{{{}}}}}", key);
            if result.contains(&placeholder) {
                debug!(key = %key, "Substituting property");
                result = result.replace(&placeholder, value);
            }
        }

        for name in unresolved_placeholders(&result) {
            warn!(key = %name, "No property for placeholder");
        }
        result
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Self::new();
        for (key, value) in iter {
            properties.insert(key, value);
        }
        properties
    }
}

/// Returns the names of `{{name}}` placeholders left in `text`.
pub fn unresolved_placeholders(text: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                if !name.is_empty() && !name.contains(char::is_whitespace) {
                    names.push(name);
                }
                rest = &after[end + 2..];
            }
            None => break,
        }
    }
    names
}
