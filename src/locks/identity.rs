//! Lock identity: the key and this run's ownership token.

use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fmt;

/// Length of the generated ownership token.
pub const TOKEN_LEN: usize = 40;

/// The lock key together with the token proving this process owns it.
///
/// Created once per run and passed by reference everywhere; the token is
/// immutable and deliberately absent from the `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct LockIdentity {
    key: String,
    token: String,
}

impl LockIdentity {
    /// Create an identity for `key` with a fresh random token.
    pub fn generate(key: &str) -> Self {
        let token = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        Self {
            key: key.to_string(),
            token,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_token(key: &str, token: &str) -> Self {
        Self {
            key: key.to_string(),
            token: token.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for LockIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockIdentity")
            .field("key", &self.key)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Describe this process as `user@host` for log lines.
pub(crate) fn holder_description() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}
