//! Ownership-checked release.

use super::identity::LockIdentity;
use crate::error::{LockError, Result};
use crate::protocol::Reply;
use crate::session::{Session, Transport, unexpected_reply};

/// Deletes `KEYS[1]` only if it still holds `ARGV[1]`, as one server-side step.
pub const RELEASE_SCRIPT: &str = "if redis.call(\"get\", KEYS[1]) == ARGV[1] then \
return redis.call(\"del\", KEYS[1]) \
else return 0 end";

/// What the conditional delete found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The key held our token and was deleted.
    Released,
    /// The key was missing or held another token; nothing was changed.
    NotOwned,
}

/// Delete the lock key if, and only if, it still holds this identity's token.
///
/// The comparison and the delete run atomically on the coordinator, so an
/// expired lock that another process has re-acquired is left untouched.
pub fn release<S: Transport>(
    session: &mut Session<S>,
    identity: &LockIdentity,
) -> Result<ReleaseOutcome> {
    let reply = session.send(&[
        "EVAL",
        RELEASE_SCRIPT,
        "1",
        identity.key(),
        identity.token(),
    ])?;

    match reply {
        Reply::Integer(1) => Ok(ReleaseOutcome::Released),
        Reply::Integer(0) => Ok(ReleaseOutcome::NotOwned),
        Reply::Error(e) => Err(LockError::Server(e)),
        other => Err(unexpected_reply("EVAL", &other)),
    }
}
