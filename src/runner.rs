//! Guarded execution of the wrapped command.
//!
//! Connects, acquires the lock, runs the command with the wrapper's own
//! standard streams, and releases the lock on every way out: normal exit,
//! failure to spawn, a failing command, or a termination signal.

use crate::config::RunConfig;
use crate::error::{LockError, Result};
use crate::exit_codes;
use crate::locks::{LockIdentity, with_lock};
use crate::session::Session;
use crate::signals;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, ExitStatus};
use std::time::Duration;
use tracing::{debug, warn};

/// How often a running child is checked for exit and pending signals.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the configured command under the lock and return its exit code.
///
/// Errors are only returned when the command did not run (or could not be
/// waited for); the command's own failure is reported through the exit code.
pub fn run(config: &RunConfig) -> Result<i32> {
    signals::install()?;

    let identity = LockIdentity::generate(&config.key);
    let mut session = Session::connect_interruptible(&config.connection, signals::pending)?;

    let code = with_lock(
        &mut session,
        &identity,
        &config.lock,
        signals::pending,
        |_held| run_command(&config.command, &signals::pending),
    )?;

    session.close();
    Ok(code)
}

/// Spawn `command` with inherited stdio and wait for it.
///
/// A termination signal reported by `interrupted` while the child runs is
/// forwarded to it once; waiting continues until the child exits.
pub fn run_command(command: &[String], interrupted: &dyn Fn() -> Option<i32>) -> Result<i32> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| LockError::Config("no command given to run under the lock".to_string()))?;

    if let Some(signal) = interrupted() {
        return Err(LockError::Interrupted(signal));
    }

    debug!(command = %shell_words::join(command), "running command");

    let mut child = Command::new(program)
        .args(args)
        .spawn()
        .map_err(|source| LockError::Spawn {
            program: program.clone(),
            source,
        })?;

    let status = wait_forwarding_signals(&mut child, interrupted)?;
    debug!(%status, "command finished");

    Ok(exit_code_of(status))
}

fn wait_forwarding_signals(
    child: &mut Child,
    interrupted: &dyn Fn() -> Option<i32>,
) -> Result<ExitStatus> {
    let mut forwarded = false;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if !forwarded && let Some(signal) = interrupted() {
                    forwarded = true;
                    forward_signal(child, signal);
                }
                std::thread::sleep(WAIT_POLL_INTERVAL);
            }
            Err(e) => return Err(LockError::Wait(e.to_string())),
        }
    }
}

fn forward_signal(child: &Child, signal: i32) {
    let Ok(signal) = Signal::try_from(signal) else {
        return;
    };
    let pid = Pid::from_raw(child.id() as i32);

    debug!(%signal, pid = child.id(), "forwarding signal to command");
    if let Err(e) = kill(pid, signal)
        && e != nix::errno::Errno::ESRCH
    {
        warn!(%signal, pid = child.id(), error = %e, "failed to forward signal");
    }
}

/// Exit code the wrapper reports for a finished child.
fn exit_code_of(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => exit_codes::from_signal(signal),
        (None, None) => exit_codes::FAILURE,
    }
}
