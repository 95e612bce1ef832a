//! CLI argument parsing for rlock.
//!
//! Uses clap derive macros for declarative argument definitions. Every
//! connection and lock option can also be set through an environment
//! variable, and any option left unset falls back to the YAML file given
//! with `--config`, then to the built-in default.

use crate::config::{Config, RunConfig};
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// rlock: run a command while holding a distributed lock.
///
/// The lock is a key on a Redis-compatible coordinator, claimed with an
/// expiring set-if-absent and released with an ownership-checked delete
/// when the command exits, however it exits.
#[derive(Parser, Debug)]
#[command(name = "rlock")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Coordinator host.
    #[arg(short = 'H', long, env = "RLOCK_HOST")]
    pub host: Option<String>,

    /// Coordinator port [default: 6379].
    #[arg(short, long, env = "RLOCK_PORT")]
    pub port: Option<u16>,

    /// Database index to select after connecting.
    #[arg(short = 'n', long = "db", env = "RLOCK_DB")]
    pub database: Option<u32>,

    /// ACL username (requires a password).
    #[arg(short, long, env = "RLOCK_USER")]
    pub user: Option<String>,

    /// Password for AUTH.
    #[arg(short = 'a', long, env = "RLOCK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Connection attempts before giving up [default: 5].
    #[arg(long, env = "RLOCK_CONNECT_ATTEMPTS")]
    pub connect_attempts: Option<u32>,

    /// Seconds allowed for each connection attempt [default: 5].
    #[arg(long, env = "RLOCK_CONNECT_TIMEOUT")]
    pub connect_timeout: Option<u64>,

    /// Lock expiry in seconds [default: 60].
    #[arg(short, long, env = "RLOCK_TTL")]
    pub ttl: Option<u64>,

    /// Seconds to wait for the lock, 0 to wait forever [default: 0].
    #[arg(short = 'w', long, env = "RLOCK_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Seconds between acquisition attempts [default: 0.5].
    #[arg(short, long, env = "RLOCK_INTERVAL")]
    pub interval: Option<f64>,

    /// YAML file with default settings.
    #[arg(short, long, env = "RLOCK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log protocol details to stderr.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Log nothing, not even warnings.
    #[arg(short, long)]
    pub quiet: bool,

    /// Name of the lock key.
    pub key: String,

    /// Command to run while holding the lock.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Merge flags over the config file and built-in defaults.
    pub fn into_run_config(self) -> Result<RunConfig> {
        let file = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        let flags = Config {
            host: self.host,
            port: self.port,
            database: self.database,
            username: self.user,
            password: self.password,
            connect_attempts: self.connect_attempts,
            connect_timeout_secs: self.connect_timeout,
            ttl: self.ttl,
            timeout: self.timeout,
            interval: self.interval,
        };

        flags.layered_over(file).resolve(self.key, self.command)
    }
}
