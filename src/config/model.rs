//! Config layer and resolved run configuration.

use crate::locks::LockSettings;
use crate::session::ConnectionParams;
use serde::Deserialize;

/// One layer of settings, as read from a YAML file or from the command line.
///
/// Every field is optional; unset fields fall through to the next layer.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Coordinator connection
    // =========================================================================
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Database index selected after connecting.
    pub database: Option<u32>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub connect_attempts: Option<u32>,
    pub connect_timeout_secs: Option<u64>,

    // =========================================================================
    // Lock timing
    // =========================================================================
    /// Lock expiry in seconds.
    pub ttl: Option<u64>,
    /// Seconds to wait for the lock; 0 waits forever.
    pub timeout: Option<u64>,
    /// Seconds between acquisition attempts.
    pub interval: Option<f64>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub connection: ConnectionParams,
    pub key: String,
    pub lock: LockSettings,
    /// Program and arguments of the command to run while holding the lock.
    pub command: Vec<String>,
}
