//! Config loading, layering, resolution and validation.

use super::model::{Config, RunConfig};
use crate::error::{LockError, Result};
use crate::locks::LockSettings;
use crate::session::ConnectionParams;
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load a config layer from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LockError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse a config layer from a YAML string.
    ///
    /// An empty document yields an empty layer.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
            .map_err(|e| LockError::Config(format!("failed to parse config YAML: {}", e)))
    }

    /// Fill every unset field of `self` from `lower`.
    pub fn layered_over(self, lower: Config) -> Config {
        Config {
            host: self.host.or(lower.host),
            port: self.port.or(lower.port),
            database: self.database.or(lower.database),
            username: self.username.or(lower.username),
            password: self.password.or(lower.password),
            connect_attempts: self.connect_attempts.or(lower.connect_attempts),
            connect_timeout_secs: self.connect_timeout_secs.or(lower.connect_timeout_secs),
            ttl: self.ttl.or(lower.ttl),
            timeout: self.timeout.or(lower.timeout),
            interval: self.interval.or(lower.interval),
        }
    }

    /// Apply built-in defaults to unset fields and validate the result.
    pub fn resolve(self, key: String, command: Vec<String>) -> Result<RunConfig> {
        let connection_defaults = ConnectionParams::default();
        let lock_defaults = LockSettings::default();

        let config = RunConfig {
            connection: ConnectionParams {
                host: self.host.unwrap_or(connection_defaults.host),
                port: self.port.unwrap_or(connection_defaults.port),
                database: self.database,
                username: self.username,
                password: self.password,
                max_connect_attempts: self
                    .connect_attempts
                    .unwrap_or(connection_defaults.max_connect_attempts),
                connect_timeout: self
                    .connect_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(connection_defaults.connect_timeout),
            },
            key,
            lock: LockSettings {
                ttl_seconds: self.ttl.unwrap_or(lock_defaults.ttl_seconds),
                acquire_timeout_seconds: self
                    .timeout
                    .unwrap_or(lock_defaults.acquire_timeout_seconds),
                poll_interval_seconds: self
                    .interval
                    .unwrap_or(lock_defaults.poll_interval_seconds),
            },
            command,
        };

        config.validate()?;
        Ok(config)
    }
}

impl RunConfig {
    /// Validate values before any network activity.
    ///
    /// Validation rules:
    /// - `key`, `host` and the command must be non-empty
    /// - `port`, `ttl`, connect attempts and connect timeout must be positive
    /// - `ttl` in milliseconds must fit in 64 bits
    /// - the poll interval must be a finite, non-negative number
    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: &str) -> Result<()> {
            Err(LockError::Config(msg.to_string()))
        }

        if self.key.is_empty() {
            return invalid("lock key must not be empty");
        }
        if self.command.first().is_none_or(|program| program.is_empty()) {
            return invalid("no command given to run under the lock");
        }

        let conn = &self.connection;
        if conn.host.trim().is_empty() {
            return invalid("host must not be empty");
        }
        if conn.port == 0 {
            return invalid("port must be greater than 0");
        }
        if conn.max_connect_attempts == 0 {
            return invalid("connect attempts must be greater than 0");
        }
        if conn.connect_timeout.is_zero() {
            return invalid("connect timeout must be greater than 0");
        }
        if conn.username.is_some() && conn.password.is_none() {
            return invalid("a username requires a password");
        }

        let lock = &self.lock;
        if lock.ttl_seconds == 0 {
            return invalid("ttl must be greater than 0");
        }
        if lock.ttl_seconds.checked_mul(1000).is_none() {
            return invalid("ttl is too large");
        }
        if !lock.poll_interval_seconds.is_finite() || lock.poll_interval_seconds < 0.0 {
            return Err(LockError::Config(format!(
                "interval must be a non-negative number of seconds (got {})",
                lock.poll_interval_seconds
            )));
        }

        Ok(())
    }
}
