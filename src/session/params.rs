//! Connection parameters.

use std::fmt;
use std::time::Duration;

/// Where and how to reach the coordinator.
#[derive(Clone, PartialEq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    /// Database index to `SELECT` after connecting.
    pub database: Option<u32>,
    /// ACL username; only sent together with `password`.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Number of connection attempts before giving up.
    pub max_connect_attempts: u32,
    /// Timeout for a single connection attempt, and for each reply once
    /// connected.
    pub connect_timeout: Duration,
}

impl ConnectionParams {
    /// `host:port` as shown in messages.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            database: None,
            username: None,
            password: None,
            max_connect_attempts: 5,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

// The password must never reach a log line.
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("max_connect_attempts", &self.max_connect_attempts)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
