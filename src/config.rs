//! Connection and mapper configuration.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ProcMapperError, Result};

/// Default per-call command timeout. Some procedures are long-running batch queries.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connect timeout, matching the ADO.NET `Connect Timeout` default.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// A resolved connection string, immutable once constructed.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ConnectionConfig {
    connection_string: String,
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
        }
    }

    /// Read the connection string from an environment variable.
    ///
    /// # Errors
    ///
    /// Returns `ProcMapperError::ConfigError` if the variable is unset, not unicode, or empty.
    pub fn from_env(var: &str) -> Result<Self> {
        let value = std::env::var(var).map_err(|e| {
            ProcMapperError::ConfigError(format!("cannot read connection string from {var}: {e}"))
        })?;
        if value.trim().is_empty() {
            return Err(ProcMapperError::ConfigError(format!(
                "connection string in {var} is empty"
            )));
        }
        Ok(Self::new(value))
    }

    #[must_use]
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Value of a `key=value` property, matched case-insensitively on the key.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.connection_string
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim())
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = self
            .connection_string
            .split(';')
            .map(|pair| match pair.split_once('=') {
                Some((k, _))
                    if k.trim().eq_ignore_ascii_case("password")
                        || k.trim().eq_ignore_ascii_case("pwd") =>
                {
                    format!("{k}=***")
                }
                _ => pair.to_string(),
            })
            .collect::<Vec<_>>()
            .join(";");
        f.debug_struct("ConnectionConfig")
            .field("connection_string", &redacted)
            .finish()
    }
}

/// Named connection strings loaded from a JSON settings file:
///
/// ```json
/// { "connectionStrings": { "miconexion": "Server=tcp:db,1433;Database=hr;User Id=app;Password=..." } }
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConnectionStrings {
    #[serde(rename = "connectionStrings", default)]
    entries: HashMap<String, ConnectionConfig>,
}

impl ConnectionStrings {
    /// Load the settings file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ProcMapperError::ConfigError` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ProcMapperError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    /// Parse settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `ProcMapperError::ConfigError` if the document is not valid settings JSON.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| ProcMapperError::ConfigError(format!("invalid settings: {e}")))
    }

    /// Look up a connection string by name.
    ///
    /// # Errors
    ///
    /// Returns `ProcMapperError::ConfigError` if no entry has that name.
    pub fn get(&self, name: &str) -> Result<ConnectionConfig> {
        self.entries.get(name).cloned().ok_or_else(|| {
            ProcMapperError::ConfigError(format!("no connection string named `{name}`"))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Per-mapper execution options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MapperOptions {
    /// Upper bound on a single procedure call, connection time excluded.
    #[serde(with = "duration_secs")]
    pub command_timeout: Duration,
    /// Upper bound on opening the connection.
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,
    /// Bind `@NmbError`/`@MsgError` output parameters on every call.
    pub bind_status_parameters: bool,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            bind_status_parameters: true,
        }
    }
}

impl MapperOptions {
    #[must_use]
    pub fn builder() -> MapperOptionsBuilder {
        MapperOptionsBuilder::default()
    }

    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// Fluent builder for [`MapperOptions`].
#[derive(Debug, Clone, Default)]
pub struct MapperOptionsBuilder {
    opts: MapperOptions,
}

impl MapperOptionsBuilder {
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.opts.command_timeout = timeout;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.opts.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn bind_status_parameters(mut self, bind: bool) -> Self {
        self.opts.bind_status_parameters = bind;
        self
    }

    #[must_use]
    pub fn finish(self) -> MapperOptions {
        self.opts
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_password() {
        let cfg = ConnectionConfig::new("Server=db;User Id=sa;Password=hunter2;Database=hr");
        let shown = format!("{cfg:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("Password=***"));
        assert_eq!(cfg.property("database"), Some("hr"));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: MapperOptions = serde_json::from_str(r#"{"command_timeout": 1.5}"#).unwrap();
        assert_eq!(opts.command_timeout, Duration::from_millis(1500));
        assert_eq!(opts.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert!(opts.bind_status_parameters);
    }
}
