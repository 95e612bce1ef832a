//! Byte stream abstraction under a session.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};

/// A bidirectional byte stream a [`Session`](super::Session) can run over.
pub trait Transport: Read + Write {
    /// Close both directions of the stream.
    fn shutdown(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Transport for TcpStream {
    fn shutdown(&mut self) -> std::io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}
