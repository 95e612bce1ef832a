//! RAII lock guard implementation.

use super::identity::LockIdentity;
use super::release::{ReleaseOutcome, release};
use crate::session::{Session, Transport};
use tracing::{info, warn};

/// RAII guard for a held lock.
///
/// When dropped, the lock is released with the ownership-checked delete.
/// If the release fails, a warning is logged but no panic occurs.
pub struct LockGuard<'a, S: Transport> {
    session: &'a mut Session<S>,
    identity: &'a LockIdentity,

    /// Whether the release has already been attempted.
    released: bool,
}

impl<'a, S: Transport> LockGuard<'a, S> {
    /// Guard a lock that `session` has just acquired for `identity`.
    pub fn new(session: &'a mut Session<S>, identity: &'a LockIdentity) -> Self {
        Self {
            session,
            identity,
            released: false,
        }
    }

    /// Release the lock now and report the outcome.
    ///
    /// Release is attempted exactly once; later drops do nothing.
    pub fn release(mut self) -> Option<ReleaseOutcome> {
        self.release_once()
    }

    fn release_once(&mut self) -> Option<ReleaseOutcome> {
        if self.released {
            return None;
        }
        self.released = true;

        match release(self.session, self.identity) {
            Ok(ReleaseOutcome::Released) => {
                info!(key = self.identity.key(), "lock released");
                Some(ReleaseOutcome::Released)
            }
            Ok(ReleaseOutcome::NotOwned) => {
                warn!(
                    key = self.identity.key(),
                    "lock was no longer ours at release (expired or taken over)"
                );
                Some(ReleaseOutcome::NotOwned)
            }
            Err(e) => {
                warn!(key = self.identity.key(), error = %e, "failed to release lock");
                None
            }
        }
    }
}

impl<S: Transport> Drop for LockGuard<'_, S> {
    fn drop(&mut self) {
        self.release_once();
    }
}
