//! Runner configuration loaded from `conformance.toml`.

use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
};

use serde::Deserialize;

/// Settings for the conformance runner binary.
///
/// Every field has a default, so a sparse file is fine; CLI flags override
/// whatever the file provides.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    pub server: ServerSettings,
    pub fixtures: FixtureSettings,
    pub logging: LoggingSettings,
}

impl RunnerSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        toml::from_str(&text).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Command that launches the tooling server on stdio.
    pub command: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct FixtureSettings {
    /// Fixture roots, each holding `config/` and `source/` directories.
    pub roots: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive string for the tracing `EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// The runner configuration file could not be used.
#[derive(Debug)]
pub enum ConfigError {
    Unreadable {
        path: PathBuf,
        reason: String,
    },
    Parse {
        path: PathBuf,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Unreadable {
                path,
                reason,
            } => {
                write!(f, "cannot read configuration {}: {reason}", path.display())
            },
            Self::Parse {
                path,
                reason,
            } => {
                write!(f, "configuration {} is not valid TOML: {reason}", path.display())
            },
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
#[path = "../tests/src/config_tests.rs"]
mod tests;
