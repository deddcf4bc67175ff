//! Analysis configuration.
//!
//! The allow/ignore lists and the log level form one explicit [`Config`]
//! value passed into the analysis entry point. Nothing here is process
//! global; a config is built once before a run and only read afterwards.

use std::str::FromStr;

use serde::Serialize;

use crate::error::CapError;

/// Configuration for one analysis run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Config {
    /// If non-empty, only captures of interfaces with these names are
    /// reported.
    pub allow_interfaces: Vec<String>,

    /// Captures of interfaces with these names are never reported. Only
    /// consulted when the allow-list is empty.
    pub ignore_interfaces: Vec<String>,

    /// Log verbosity for the run.
    pub log_level: LogLevel,
}

impl Config {
    /// Set the interface allow-list.
    #[must_use]
    pub fn with_allow_interfaces(mut self, names: Vec<String>) -> Self {
        self.allow_interfaces = names;
        self
    }

    /// Set the interface ignore-list.
    #[must_use]
    pub fn with_ignore_interfaces(mut self, names: Vec<String>) -> Self {
        self.ignore_interfaces = names;
        self
    }

    /// Set the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Whether captures of the named interface should be checked.
    ///
    /// A non-empty allow-list is exhaustive: only listed names pass. With an
    /// empty allow-list, every name passes unless it is on the ignore-list.
    #[must_use]
    pub fn should_check_interface(&self, name: &str) -> bool {
        if !self.allow_interfaces.is_empty() {
            return self.allow_interfaces.iter().any(|allow| allow == name);
        }
        !self.ignore_interfaces.iter().any(|ignore| ignore == name)
    }
}

/// Log verbosity, validated at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The corresponding `tracing` level.
    #[must_use]
    pub fn as_tracing(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = CapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(CapError::InvalidLogLevel(s.to_string())),
        }
    }
}
