//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_GEOMETRY_PROPERTY, DEFAULT_NAMESPACE_PREFIX, DEFAULT_NAMESPACE_URI, DEFAULT_PAGE_SIZE,
    DEFAULT_WFS_ENDPOINT,
};
use std::env;
use std::time::Duration;

/// Runtime configuration for the WFS-T engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub endpoint: String,
    pub namespace_prefix: String,
    pub namespace_uri: String,
    pub geometry_property: String,
    /// `None` leaves requests without a timeout.
    pub request_timeout: Option<Duration>,
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_WFS_ENDPOINT.to_string(),
            namespace_prefix: DEFAULT_NAMESPACE_PREFIX.to_string(),
            namespace_uri: DEFAULT_NAMESPACE_URI.to_string(),
            geometry_property: DEFAULT_GEOMETRY_PROPERTY.to_string(),
            request_timeout: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty or unparsable values fall back to the defaults.
    ///
    /// # Arguments
    /// - `lookup`: Returns the raw value for a variable name, if set.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            endpoint: non_empty(lookup("WFS_ENDPOINT"))
                .map(|endpoint| endpoint.trim_end_matches('/').to_string())
                .unwrap_or(defaults.endpoint),
            namespace_prefix: non_empty(lookup("WFS_NAMESPACE_PREFIX"))
                .unwrap_or(defaults.namespace_prefix),
            namespace_uri: non_empty(lookup("WFS_NAMESPACE_URI"))
                .unwrap_or(defaults.namespace_uri),
            geometry_property: non_empty(lookup("WFS_GEOMETRY_PROPERTY"))
                .unwrap_or(defaults.geometry_property),
            request_timeout: non_empty(lookup("WFS_TIMEOUT_SECS"))
                .and_then(|secs| secs.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            page_size: non_empty(lookup("WFS_PAGE_SIZE"))
                .and_then(|size| size.parse::<usize>().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.page_size),
        }
    }
}
