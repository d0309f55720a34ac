// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Device frame loading.
//!
//! # Loading Pipeline
//!
//! 1. Read the frame text (file or string)
//! 2. Substitute `{{key}}` properties, rejecting any left without a value
//! 3. Resolve `${VAR}` and `${VAR:default}` environment placeholders
//! 4. Parse YAML, TOML or JSON into a [`DeviceFrame`]

use std::env;
use std::fs;
use std::path::Path;

use gridlink_modbus::DeviceFrame;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::properties::{unresolved_placeholders, Properties};

const STRING_SOURCE: &str = "<string>";

// =============================================================================
// FrameLoader
// =============================================================================

/// Loads device frames.
///
/// # Examples
///
/// ```no_run
/// use gridlink_config::loader::FrameLoader;
///
/// let frame = FrameLoader::new().load("meter.yaml").unwrap();
/// println!("{} data points", frame.data_point_count());
/// ```
#[derive(Debug, Clone)]
pub struct FrameLoader {
    properties: Properties,
    resolve_env_vars: bool,
}

impl FrameLoader {
    /// Creates a loader without properties that resolves environment
    /// placeholders.
    pub fn new() -> Self {
        Self {
            properties: Properties::new(),
            resolve_env_vars: true,
        }
    }

    /// Sets the properties substituted into `{{key}}` placeholders.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Enables or disables environment placeholder resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Loads a frame from a file. The format follows the extension.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<DeviceFrame> {
        let path = path.as_ref();
        info!("Loading device frame from: {}", path.display());

        let format = FrameFormat::from_path(path)?;
        let content = self.read_file(path)?;
        let frame = self.parse_content(&content, format, &path.display().to_string())?;

        debug!(
            device = frame.name().unwrap_or("<unnamed>"),
            profiles = frame.functional_profiles.len(),
            data_points = frame.data_point_count(),
            "Device frame loaded"
        );
        Ok(frame)
    }

    /// Loads a frame from a string.
    pub fn load_from_str(&self, content: &str, format: FrameFormat) -> ConfigResult<DeviceFrame> {
        self.parse_content(content, format, STRING_SOURCE)
    }

    /// Applies properties and environment placeholders without parsing.
    pub fn substitute(&self, content: &str) -> ConfigResult<String> {
        let content = self.properties.apply(content);
        if let Some(name) = unresolved_placeholders(&content).first() {
            return Err(ConfigError::unresolved_placeholder(*name));
        }
        if self.resolve_env_vars {
            resolve_env_placeholders(&content)
        } else {
            Ok(content)
        }
    }

    fn read_file(&self, path: &Path) -> ConfigResult<String> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
    }

    fn parse_content(
        &self,
        content: &str,
        format: FrameFormat,
        source_name: &str,
    ) -> ConfigResult<DeviceFrame> {
        let content = self.substitute(content)?;
        parse_str(&content, format).map_err(|message| ConfigError::parse(source_name, message))
    }
}

impl Default for FrameLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// FrameFormat
// =============================================================================

/// Supported frame formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl FrameFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(FrameFormat::Yaml),
            Some("toml") => Ok(FrameFormat::Toml),
            Some("json") => Ok(FrameFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }

    /// Guesses the format of in-memory text: JSON when it starts with `{`,
    /// YAML otherwise.
    pub fn detect(content: &str) -> Self {
        if content.trim_start().starts_with('{') {
            FrameFormat::Json
        } else {
            FrameFormat::Yaml
        }
    }

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FrameFormat::Yaml => "yaml",
            FrameFormat::Toml => "toml",
            FrameFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for FrameFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(FrameFormat::Yaml),
            "toml" => Ok(FrameFormat::Toml),
            "json" => Ok(FrameFormat::Json),
            other => Err(ConfigError::unsupported_format(other)),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_str(content: &str, format: FrameFormat) -> Result<DeviceFrame, String> {
    let file_format = match format {
        FrameFormat::Yaml => config::FileFormat::Yaml,
        FrameFormat::Toml => config::FileFormat::Toml,
        FrameFormat::Json => {
            return serde_json::from_str(content).map_err(|e| e.to_string());
        }
    };

    config::Config::builder()
        .add_source(config::File::from_str(content, file_format))
        .build()
        .map_err(|e| e.to_string())?
        .try_deserialize()
        .map_err(|e| e.to_string())
}

/// Resolves `${VAR}` and `${VAR:default}` placeholders from the
/// environment.
///
/// An unset variable without a default is an error. An unterminated `${`
/// is kept as-is.
pub fn resolve_env_placeholders(content: &str) -> ConfigResult<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' || chars.peek() != Some(&'{') {
            result.push(c);
            continue;
        }
        chars.next();

        let mut var_content = String::new();
        let mut found_close = false;
        for c in chars.by_ref() {
            if c == '}' {
                found_close = true;
                break;
            }
            var_content.push(c);
        }

        if !found_close {
            result.push_str("${");
            result.push_str(&var_content);
            continue;
        }

        let (var_name, default_value) = match var_content.find(':') {
            Some(idx) => (&var_content[..idx], Some(&var_content[idx + 1..])),
            None => (var_content.as_str(), None),
        };

        match (env::var(var_name), default_value) {
            (Ok(value), _) => result.push_str(&value),
            (Err(_), Some(default)) => result.push_str(default),
            (Err(_), None) => return Err(ConfigError::unresolved_placeholder(var_name)),
        }
    }

    Ok(result)
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads a frame from a file with default settings.
pub fn load_frame(path: impl AsRef<Path>) -> ConfigResult<DeviceFrame> {
    FrameLoader::new().load(path)
}

/// Loads a frame from a string with default settings.
pub fn load_frame_str(content: &str, format: FrameFormat) -> ConfigResult<DeviceFrame> {
    FrameLoader::new().load_from_str(content, format)
}

// =============================================================================
// Tests
// =============================================================================
