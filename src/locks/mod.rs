//! Locking subsystem for rlock.
//!
//! This module implements the lock protocol against the coordinator:
//! - Acquisition by polling `SET key token NX PX ttl` until it succeeds, the
//!   acquire deadline passes, or the session fails
//! - Release by an atomic server-side compare-and-delete script, so a holder
//!   whose TTL lapsed can never delete a lock someone else has since taken
//!
//! # Ownership
//!
//! Every run generates one [`LockIdentity`] whose random token is the value
//! stored under the key. The token is the proof of ownership; it is never
//! logged and never reused.
//!
//! # RAII Guards
//!
//! [`with_lock`] holds the lock through a [`LockGuard`] that releases it when
//! dropped, so the release runs whether the protected work returns, fails, or
//! panics. Release is best-effort: failures are logged, not propagated.

mod acquire;
mod guard;
mod identity;
mod release;
mod settings;


// Re-export public API
pub use acquire::{Acquisition, Held, acquire};
pub use guard::LockGuard;
pub use identity::LockIdentity;
pub use release::{RELEASE_SCRIPT, ReleaseOutcome, release};
pub use settings::LockSettings;

use crate::error::{LockError, Result};
use crate::session::{InterruptCheck, Session, Transport};

/// Acquire the lock, run `work` while holding it, then release it.
///
/// `interrupted` is polled between attempts and returns the number of a
/// pending termination signal, if any. A timed-out acquisition is reported as
/// [`LockError::Timeout`] and `work` is not called.
pub fn with_lock<S, T, F>(
    session: &mut Session<S>,
    identity: &LockIdentity,
    settings: &LockSettings,
    interrupted: InterruptCheck,
    work: F,
) -> Result<T>
where
    S: Transport,
    F: FnOnce(&Held) -> Result<T>,
{
    let held = match acquire(session, identity, settings, interrupted)? {
        Acquisition::Held(held) => held,
        Acquisition::TimedOut { waited, .. } => {
            return Err(LockError::Timeout {
                key: identity.key().to_string(),
                waited,
            });
        }
    };

    let guard = LockGuard::new(session, identity);
    let result = work(&held);
    guard.release();
    result
}
