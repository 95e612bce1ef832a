//! Lock acquisition state machine.
//!
//! `Trying` repeats a conditional set until one of three things happens:
//! the set succeeds (`Held`), the deadline passes (`TimedOut`), or the
//! coordinator answers with an error or the session drops (`Err`, fatal).

use super::identity::{LockIdentity, holder_description};
use super::settings::LockSettings;
use crate::error::{LockError, Result};
use crate::protocol::Reply;
use crate::session::{InterruptCheck, Session, Transport};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Proof that the lock was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Held {
    /// Time spent waiting, from the first attempt to the successful one.
    pub waited: Duration,
    /// Number of conditional sets sent, including the successful one.
    pub attempts: u32,
}

/// Non-fatal outcome of an acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    Held(Held),
    TimedOut { waited: Duration, attempts: u32 },
}

/// Poll the coordinator until the lock is acquired or the deadline passes.
///
/// Contention (a null reply) sleeps for the poll interval and tries again. An
/// error reply, an unexpected reply type or a disconnect aborts immediately:
/// the session cannot recover, so polling on would be pointless. A pending
/// signal reported by `interrupted` aborts with [`LockError::Interrupted`],
/// also while a request is still waiting for its reply.
pub fn acquire<S: Transport>(
    session: &mut Session<S>,
    identity: &LockIdentity,
    settings: &LockSettings,
    interrupted: InterruptCheck,
) -> Result<Acquisition> {
    session.set_interrupt_check(Some(interrupted));
    let outcome = poll_until_settled(session, identity, settings, interrupted);
    session.set_interrupt_check(None);
    outcome
}

fn poll_until_settled<S: Transport>(
    session: &mut Session<S>,
    identity: &LockIdentity,
    settings: &LockSettings,
    interrupted: InterruptCheck,
) -> Result<Acquisition> {
    let ttl = settings.ttl_millis().to_string();
    let timeout = settings.acquire_timeout();
    let interval = settings.poll_interval();
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts = attempts.saturating_add(1);

        let reply = session.send(&[
            "SET",
            identity.key(),
            identity.token(),
            "NX",
            "PX",
            &ttl,
        ])?;

        match reply {
            Reply::Status(_) | Reply::Bulk(Some(_)) => {
                let held = Held {
                    waited: started.elapsed(),
                    attempts,
                };
                info!(
                    key = identity.key(),
                    holder = %holder_description(),
                    waited_ms = held.waited.as_millis() as u64,
                    attempts = held.attempts,
                    "lock acquired"
                );
                return Ok(Acquisition::Held(held));
            }
            Reply::Bulk(None) => {
                debug!(key = identity.key(), attempts, "lock is held elsewhere");
            }
            Reply::Error(e) => return Err(LockError::Server(e)),
            Reply::Integer(_) => {
                return Err(crate::session::unexpected_reply("SET", &reply));
            }
        }

        std::thread::sleep(interval);

        if let Some(signal) = interrupted() {
            return Err(LockError::Interrupted(signal));
        }

        let waited = started.elapsed();
        if let Some(timeout) = timeout
            && waited >= timeout
        {
            info!(
                key = identity.key(),
                waited_ms = waited.as_millis() as u64,
                attempts,
                "gave up waiting for lock"
            );
            return Ok(Acquisition::TimedOut { waited, attempts });
        }
    }
}
