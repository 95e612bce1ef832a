//! Session establishment, request/reply and teardown.

use super::params::ConnectionParams;
use super::transport::Transport;
use super::watched::{InterruptCheck, Watched};
use crate::error::{LockError, Result};
use crate::protocol::{Reply, encode, read_reply};
use std::io::{self, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, warn};

/// Pause between two connection attempts.
pub(crate) const CONNECT_RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Read timeout on the socket; pending signals are checked this often.
const READ_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    /// A write failed or a reply could not be read; nothing more may be sent.
    Broken,
    Closed,
}

/// An open, exclusively owned connection to the coordinator.
///
/// Dropping a session performs the same graceful teardown as [`Session::close`].
pub struct Session<S: Transport = TcpStream> {
    stream: BufReader<Watched<S>>,
    state: State,
}

impl Session<TcpStream> {
    /// Connect to the coordinator and run the authentication/selection handshake.
    ///
    /// Connection failures are retried up to `params.max_connect_attempts`
    /// times with a fixed one-second pause. A rejected credential or database
    /// index is fatal immediately.
    pub fn connect(params: &ConnectionParams) -> Result<Self> {
        Self::connect_with_pause(params, CONNECT_RETRY_PAUSE, None)
    }

    /// Like [`Session::connect`], but gives up with
    /// [`LockError::Interrupted`] as soon as `interrupted` reports a signal
    /// between attempts or while the handshake waits for a reply.
    pub fn connect_interruptible(
        params: &ConnectionParams,
        interrupted: InterruptCheck,
    ) -> Result<Self> {
        Self::connect_with_pause(params, CONNECT_RETRY_PAUSE, Some(interrupted))
    }

    pub(crate) fn connect_with_pause(
        params: &ConnectionParams,
        pause: Duration,
        interrupted: Option<InterruptCheck>,
    ) -> Result<Self> {
        let addr = params.address();
        let mut last_error = String::from("no connection attempts configured");

        for attempt in 1..=params.max_connect_attempts {
            if let Some(signal) = interrupted.and_then(|pending| pending()) {
                return Err(LockError::Interrupted(signal));
            }
            match open_stream(params) {
                Ok(stream) => {
                    debug!(addr = %addr, attempt, "connected to coordinator");
                    let mut session = Session {
                        stream: BufReader::new(Watched::new(stream, Some(params.connect_timeout))),
                        state: State::Open,
                    };
                    session.set_interrupt_check(interrupted);
                    session.handshake(params)?;
                    session.set_interrupt_check(None);
                    return Ok(session);
                }
                Err(e) => {
                    last_error = e.to_string();
                    if let Some(signal) = interrupted.and_then(|pending| pending()) {
                        return Err(LockError::Interrupted(signal));
                    }
                    if attempt < params.max_connect_attempts {
                        warn!(
                            addr = %addr,
                            attempt,
                            max_attempts = params.max_connect_attempts,
                            error = %e,
                            "coordinator unreachable, retrying"
                        );
                        std::thread::sleep(pause);
                    }
                }
            }
        }

        Err(LockError::Connect {
            addr,
            attempts: params.max_connect_attempts,
            reason: last_error,
        })
    }
}

impl<S: Transport> Session<S> {
    /// Wrap an already connected stream. No handshake is performed.
    pub fn from_transport(stream: S) -> Self {
        Self {
            stream: BufReader::new(Watched::new(stream, None)),
            state: State::Open,
        }
    }

    /// Abort waits for a reply when `check` reports a pending signal.
    ///
    /// The abort breaks the session and surfaces as
    /// [`LockError::Interrupted`]. `None` turns the check off again.
    pub fn set_interrupt_check(&mut self, check: Option<InterruptCheck>) {
        self.stream.get_mut().set_interrupt(check);
    }

    /// Send `AUTH` and `SELECT` as configured.
    pub fn handshake(&mut self, params: &ConnectionParams) -> Result<()> {
        if let Some(password) = params.password.as_deref() {
            let reply = match params.username.as_deref() {
                Some(user) => self.send(&["AUTH", user, password])?,
                None => self.send(&["AUTH", password])?,
            };
            match reply {
                Reply::Status(_) => debug!("authenticated with coordinator"),
                Reply::Error(e) => return Err(LockError::Auth(e)),
                other => return Err(unexpected_reply("AUTH", &other)),
            }
        }

        if let Some(database) = params.database {
            let index = database.to_string();
            match self.send(&["SELECT", &index])? {
                Reply::Status(_) => debug!(database, "selected database"),
                Reply::Error(e) => return Err(LockError::Select(e)),
                other => return Err(unexpected_reply("SELECT", &other)),
            }
        }

        Ok(())
    }

    /// Write one command and read exactly one reply.
    ///
    /// Error replies are returned as [`Reply::Error`]; only transport and
    /// framing failures are `Err`, and those leave the session unusable.
    pub fn send(&mut self, args: &[&str]) -> Result<Reply> {
        match self.state {
            State::Open => {}
            State::Broken => {
                return Err(LockError::Disconnect(
                    "session is no longer usable".to_string(),
                ));
            }
            State::Closed => {
                return Err(LockError::Disconnect("session is closed".to_string()));
            }
        }

        debug!(command = args.first().copied().unwrap_or_default(), "sending");

        self.stream.get_mut().start_request();
        if let Err(e) = write_frame(self.stream.get_mut(), &encode(args)) {
            self.state = State::Broken;
            return Err(LockError::Disconnect(format!("write failed: {}", e)));
        }

        read_reply(&mut self.stream).map_err(|e| {
            self.state = State::Broken;
            match self.stream.get_ref().pending_signal() {
                Some(signal) => LockError::Interrupted(signal),
                None => e,
            }
        })
    }

    /// Whether requests can still be sent.
    pub fn is_open(&self) -> bool {
        self.state == State::Open
    }

    /// Send `QUIT` and close the stream.
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.is_open() {
            match self.send(&["QUIT"]) {
                Ok(reply) => debug!(%reply, "quit acknowledged"),
                Err(e) => debug!(error = %e, "quit failed"),
            }
        }
        if self.state != State::Closed {
            if let Err(e) = self.stream.get_mut().inner_mut().shutdown() {
                debug!(error = %e, "socket shutdown failed");
            }
            self.state = State::Closed;
        }
    }
}

impl<S: Transport> Drop for Session<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Error for a reply whose type makes no sense for `command`.
pub(crate) fn unexpected_reply(command: &str, reply: &Reply) -> LockError {
    LockError::Protocol(format!(
        "unexpected {} reply to {}: {}",
        reply.kind(),
        command,
        reply
    ))
}

fn write_frame<W: Write>(writer: &mut W, frame: &[u8]) -> io::Result<()> {
    writer.write_all(frame)?;
    writer.flush()
}

fn open_stream(params: &ConnectionParams) -> io::Result<TcpStream> {
    let mut last_error = None;

    for addr in (params.host.as_str(), params.port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, params.connect_timeout) {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                stream.set_read_timeout(Some(READ_SLICE))?;
                stream.set_write_timeout(Some(params.connect_timeout))?;
                return Ok(stream);
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("'{}' resolved to no addresses", params.host),
        )
    }))
}
