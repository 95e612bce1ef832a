//! Termination signal capture.
//!
//! The wrapper must never die between acquiring the lock and releasing it, so
//! SIGINT, SIGTERM and SIGHUP are caught and recorded instead of killing the
//! process. The connect retry loop, the acquisition loop (including a wait for
//! a reply that never comes) and the child wait loop poll [`pending`] and
//! unwind normally, which lets the lock guard release on the way out.

use crate::error::{LockError, Result};
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::flag;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, OnceLock};

/// Signals that request termination.
pub const TERMINATION_SIGNALS: [i32; 3] = [SIGINT, SIGTERM, SIGHUP];

/// Most recent termination signal received, or 0.
static PENDING: LazyLock<Arc<AtomicUsize>> = LazyLock::new(|| Arc::new(AtomicUsize::new(0)));

static INSTALLED: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Install the recording handler for every termination signal.
///
/// Handlers stay registered for the life of the process; later calls are
/// no-ops that report the outcome of the first one.
pub fn install() -> Result<()> {
    INSTALLED
        .get_or_init(|| {
            TERMINATION_SIGNALS.iter().try_for_each(|&signal| {
                flag::register_usize(signal, Arc::clone(&PENDING), signal as usize)
                    .map(|_| ())
                    .map_err(|e| format!("signal {}: {}", signal, e))
            })
        })
        .clone()
        .map_err(LockError::Signal)
}

/// Number of the last termination signal received, if any.
pub fn pending() -> Option<i32> {
    match PENDING.load(Ordering::SeqCst) {
        0 => None,
        signal => i32::try_from(signal).ok(),
    }
}

#[cfg(test)]
pub(crate) fn reset() {
    PENDING.store(0, Ordering::SeqCst);
}
