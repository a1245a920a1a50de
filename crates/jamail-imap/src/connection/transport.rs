//! Byte transport contract between the session and the network.

use std::io;

/// Why a transport call could not complete.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The call needs the socket to become readable first.
    #[error("transport wants to read")]
    WantRead,
    /// The call needs the socket to become writable first.
    #[error("transport wants to write")]
    WantWrite,
    /// The transport failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A non-blocking, encrypted byte stream.
///
/// Implementations never block: when the socket is not ready they return
/// [`TransportError::WantRead`] or [`TransportError::WantWrite`].
pub trait Transport {
    /// Reads decrypted bytes into `buf`. `Ok(0)` means the peer closed.
    ///
    /// # Errors
    ///
    /// Returns a would-block condition or an I/O failure.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Accepts bytes from `buf` for sending and returns how many were taken.
    ///
    /// An empty `buf` only pushes pending protocol output such as handshake
    /// records.
    ///
    /// # Errors
    ///
    /// Returns a would-block condition or an I/O failure.
    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError>;

    /// Returns true while protocol output is waiting for the socket.
    fn wants_write(&self) -> bool;

    /// Starts an orderly shutdown. Best effort; errors are dropped.
    fn close(&mut self);
}
