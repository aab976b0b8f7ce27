//! Event bus configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// What a handler does when a published argument has the wrong type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Substitute `Default::default()` at the mismatched position and call anyway
    #[default]
    Degrade,

    /// Do not call the handler at all
    Skip,
}

impl MismatchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchPolicy::Degrade => "degrade",
            MismatchPolicy::Skip => "skip",
        }
    }
}

impl FromStr for MismatchPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "degrade" | "lenient" => Ok(MismatchPolicy::Degrade),
            "skip" | "strict" => Ok(MismatchPolicy::Skip),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for MismatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event bus configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    /// Policy applied when an argument does not match a handler's signature
    pub mismatch_policy: MismatchPolicy,

    /// Enable event logging
    pub enable_logging: bool,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            mismatch_policy: MismatchPolicy::Degrade,
            enable_logging: true,
        }
    }
}

/// Parse a boolean switch. Anything unrecognized yields `None`.
pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl EventBusConfig {
    /// Create config from environment variables.
    ///
    /// - `SWITCHBOARD_MISMATCH_POLICY=degrade|skip`
    /// - `SWITCHBOARD_EVENT_LOGGING=1|0|true|false|yes|no|on|off`
    ///
    /// Unset or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let mismatch_policy = lookup("SWITCHBOARD_MISMATCH_POLICY")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.mismatch_policy);

        let enable_logging = lookup("SWITCHBOARD_EVENT_LOGGING")
            .and_then(|s| parse_flag(&s))
            .unwrap_or(defaults.enable_logging);

        Self {
            mismatch_policy,
            enable_logging,
        }
    }
}
