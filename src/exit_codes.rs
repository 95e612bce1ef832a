//! Exit code constants for the rlock CLI.
//!
//! Once the wrapped command has run, its own exit status is propagated
//! verbatim. The constants below cover everything that happens around it:
//! - 0: Success
//! - 1: Failure before the command ran (config, connect, lock timeout, ...)
//! - 126: Command found but not executable
//! - 127: Command not found
//! - 128 + N: Terminated by signal N

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Any failure that prevented the wrapped command from running.
pub const FAILURE: i32 = 1;

/// The wrapped command exists but could not be executed.
pub const CANNOT_EXECUTE: i32 = 126;

/// The wrapped command could not be found.
pub const COMMAND_NOT_FOUND: i32 = 127;

/// Base added to a signal number when a process dies from that signal.
pub const SIGNAL_BASE: i32 = 128;

/// Exit code for a process terminated by `signal`.
pub fn from_signal(signal: i32) -> i32 {
    SIGNAL_BASE + signal
}
