//! Wire protocol spoken with the coordinator.
//!
//! This is the minimal subset of the Redis serialization protocol needed by
//! the lock: requests are always arrays of bulk strings, and replies are one
//! of status, error, integer or bulk string.
//!
//! # Frames
//!
//! ```text
//! request:  *2\r\n$3\r\nGET\r\n$5\r\njob-x\r\n
//! replies:  +OK\r\n   -ERR msg\r\n   :1\r\n   $5\r\nhello\r\n   $-1\r\n
//! ```
//!
//! Array replies never occur for the commands this client sends, so decoding
//! one is a protocol error rather than something to skip over.

mod codec;
mod reply;


pub use codec::{encode, read_reply};
pub use reply::Reply;
