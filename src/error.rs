//! Error types for the rlock CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use std::time::Duration;
use thiserror::Error;

/// Main error type for rlock operations.
///
/// Each variant maps to a specific exit code. Everything except `Interrupted`
/// and `Spawn` happens before the wrapped command could run and exits with 1.
#[derive(Error, Debug)]
pub enum LockError {
    /// A required parameter is missing or out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The coordinator could not be reached within the attempt bound.
    #[error("failed to connect to {addr} after {attempts} attempt(s): {reason}")]
    Connect {
        addr: String,
        attempts: u32,
        reason: String,
    },

    /// The coordinator rejected the credential.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The coordinator rejected the database index.
    #[error("database selection rejected: {0}")]
    Select(String),

    /// The stream was closed or became unreadable mid-protocol.
    #[error("disconnected from coordinator: {0}")]
    Disconnect(String),

    /// The coordinator sent something this client cannot interpret.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The coordinator answered a command with an error reply.
    #[error("coordinator error: {0}")]
    Server(String),

    /// The acquire deadline passed while another holder kept the key.
    #[error("timed out after {:.1}s waiting for lock '{key}'", .waited.as_secs_f64())]
    Timeout { key: String, waited: Duration },

    /// Signal handlers could not be installed.
    #[error("failed to install signal handlers: {0}")]
    Signal(String),

    /// Waiting for the wrapped command failed.
    #[error("failed to wait for command: {0}")]
    Wait(String),

    /// A termination signal arrived before the command ran.
    #[error("interrupted by signal {0}")]
    Interrupted(i32),

    /// The wrapped command could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl LockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LockError::Interrupted(signal) => exit_codes::from_signal(*signal),
            LockError::Spawn { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => exit_codes::COMMAND_NOT_FOUND,
                _ => exit_codes::CANNOT_EXECUTE,
            },
            _ => exit_codes::FAILURE,
        }
    }
}

/// Result type alias for rlock operations.
pub type Result<T> = std::result::Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_command_failures_exit_with_one() {
        let errors = [
            LockError::Config("ttl must be greater than 0".to_string()),
            LockError::Connect {
                addr: "127.0.0.1:6379".to_string(),
                attempts: 3,
                reason: "connection refused".to_string(),
            },
            LockError::Auth("WRONGPASS".to_string()),
            LockError::Select("DB index is out of range".to_string()),
            LockError::Disconnect("connection closed".to_string()),
            LockError::Protocol("array replies are not supported".to_string()),
            LockError::Server("ERR syntax error".to_string()),
            LockError::Timeout {
                key: "job".to_string(),
                waited: Duration::from_secs(2),
            },
        ];
        for err in errors {
            assert_eq!(err.exit_code(), exit_codes::FAILURE, "{err}");
        }
    }

    #[test]
    fn interrupted_error_maps_to_signal_exit_code() {
        assert_eq!(LockError::Interrupted(15).exit_code(), 143);
    }

    #[test]
    fn spawn_error_distinguishes_missing_from_unexecutable() {
        let missing = LockError::Spawn {
            program: "nope".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(missing.exit_code(), exit_codes::COMMAND_NOT_FOUND);

        let denied = LockError::Spawn {
            program: "/etc/passwd".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(denied.exit_code(), exit_codes::CANNOT_EXECUTE);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = LockError::Timeout {
            key: "job-x".to_string(),
            waited: Duration::from_millis(2500),
        };
        assert_eq!(err.to_string(), "timed out after 2.5s waiting for lock 'job-x'");

        let err = LockError::Connect {
            addr: "redis:6379".to_string(),
            attempts: 2,
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to connect to redis:6379 after 2 attempt(s): connection refused"
        );
    }
}
