//! Reply deadline and signal checks under the buffered reader.

use std::io::{self, ErrorKind, Read, Write};
use std::time::{Duration, Instant};

/// Returns the number of a pending termination signal, if any.
pub type InterruptCheck = fn() -> Option<i32>;

/// Wraps a stream whose reads return `WouldBlock` after a short slice.
///
/// Between slices it gives up on a pending signal or once the current reply
/// has taken longer than `reply_timeout`. Streams without a read timeout
/// never hit either branch.
pub(crate) struct Watched<S> {
    inner: S,
    reply_timeout: Option<Duration>,
    interrupt: Option<InterruptCheck>,
    waiting_since: Instant,
}

impl<S> Watched<S> {
    pub(crate) fn new(inner: S, reply_timeout: Option<Duration>) -> Self {
        Self {
            inner,
            reply_timeout,
            interrupt: None,
            waiting_since: Instant::now(),
        }
    }

    pub(crate) fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub(crate) fn set_interrupt(&mut self, check: Option<InterruptCheck>) {
        self.interrupt = check;
    }

    /// Start the deadline for the next reply.
    pub(crate) fn start_request(&mut self) {
        self.waiting_since = Instant::now();
    }

    pub(crate) fn pending_signal(&self) -> Option<i32> {
        self.interrupt.and_then(|pending| pending())
    }
}

impl<S: Read> Read for Watched<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.inner.read(buf) {
                Err(e) if is_transient(&e) => {
                    if let Some(signal) = self.pending_signal() {
                        return Err(io::Error::other(format!("interrupted by signal {}", signal)));
                    }
                    match self.reply_timeout {
                        Some(limit) if self.waiting_since.elapsed() >= limit => {
                            return Err(io::Error::new(
                                ErrorKind::TimedOut,
                                format!("no reply within {:.1}s", limit.as_secs_f64()),
                            ));
                        }
                        Some(_) => {}
                        None if e.kind() == ErrorKind::Interrupted => {}
                        None => return Err(e),
                    }
                }
                result => return result,
            }
        }
    }
}

impl<S: Write> Write for Watched<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
    )
}
