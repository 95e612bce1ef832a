//! Transport session to the coordinator.
//!
//! A [`Session`] owns the single connection this process uses for its whole
//! lifetime. It is established with a bounded number of attempts, optionally
//! authenticated and pointed at a database index, and then used in strict
//! request/reply turns.
//!
//! # Disconnects
//!
//! Once established, a session is never re-opened. A failed write or a read
//! that hits end of stream marks the session broken and every later request
//! fails with [`LockError::Disconnect`](crate::error::LockError::Disconnect):
//! after a reconnect this process could no longer tell whether it still holds
//! the lock.
//!
//! Replies that take longer than the connect timeout also break the session,
//! and so does a termination signal while a watched request is waiting.

mod connection;
mod params;
mod transport;
mod watched;


pub(crate) use connection::unexpected_reply;
pub use connection::Session;
pub use params::ConnectionParams;
pub use transport::Transport;
pub use watched::InterruptCheck;
