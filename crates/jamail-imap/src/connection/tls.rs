//! TLS transport over a non-blocking socket.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore};

use super::transport::{Transport, TransportError};

/// Creates a TLS client configuration with the webpki root certificates.
#[must_use]
pub fn tls_client_config() -> Arc<ClientConfig> {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
}

/// A rustls client session layered over a non-blocking socket.
///
/// The socket must report "not ready" as [`io::ErrorKind::WouldBlock`].
pub struct TlsTransport<S> {
    conn: ClientConnection,
    socket: S,
}

impl<S: Read + Write> TlsTransport<S> {
    /// Starts a client session for `host` on an already connected socket.
    ///
    /// No bytes are exchanged until the first read or write.
    ///
    /// # Errors
    ///
    /// Returns an error if `host` is not a valid server name or the TLS
    /// session cannot be created.
    pub fn new(config: Arc<ClientConfig>, host: &str, socket: S) -> crate::Result<Self> {
        let server_name = ServerName::try_from(host.to_string())?;
        let conn = ClientConnection::new(config, server_name)?;
        Ok(Self { conn, socket })
    }

    /// Returns the underlying socket.
    #[must_use]
    pub const fn get_ref(&self) -> &S {
        &self.socket
    }

    /// Returns true while the handshake is in progress.
    #[must_use]
    pub fn is_handshaking(&self) -> bool {
        self.conn.is_handshaking()
    }

    // Returns false if the socket would block before all records went out.
    fn flush_tls(&mut self) -> io::Result<bool> {
        while self.conn.wants_write() {
            match self.conn.write_tls(&mut self.socket) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }
}

impl<S: Read + Write> Transport for TlsTransport<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        loop {
            match self.conn.reader().read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                // peer went away without close_notify
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(0),
                Err(e) => return Err(e.into()),
            }

            // the handshake may have records to send before the peer answers
            self.flush_tls()?;

            match self.conn.read_tls(&mut self.socket) {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Err(TransportError::WantRead);
                }
                Err(e) => return Err(e.into()),
            }

            self.conn
                .process_new_packets()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        let accepted = if buf.is_empty() {
            0
        } else {
            self.conn.writer().write(buf)?
        };

        if !self.flush_tls()? && accepted == 0 {
            return Err(TransportError::WantWrite);
        }
        Ok(accepted)
    }

    fn wants_write(&self) -> bool {
        self.conn.wants_write()
    }

    fn close(&mut self) {
        self.conn.send_close_notify();
        let _ = self.flush_tls();
    }
}

impl<S> fmt::Debug for TlsTransport<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsTransport")
            .field("handshaking", &self.conn.is_handshaking())
            .field("wants_write", &self.conn.wants_write())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::Error;

    #[derive(Default)]
    struct MockSocket {
        incoming: Vec<u8>,
        outgoing: Vec<u8>,
        eof: bool,
        blocked_writes: bool,
    }

    impl Read for MockSocket {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.incoming.is_empty() {
                return if self.eof {
                    Ok(0)
                } else {
                    Err(io::ErrorKind::WouldBlock.into())
                };
            }
            let n = buf.len().min(self.incoming.len());
            buf[..n].copy_from_slice(&self.incoming[..n]);
            self.incoming.drain(..n);
            Ok(n)
        }
    }

    impl Write for MockSocket {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.blocked_writes {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            self.outgoing.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tls_client_config() {
        let config = tls_client_config();
        let name = ServerName::try_from("imap.example.com").unwrap();
        assert!(ClientConnection::new(config, name).is_ok());
    }

    #[test]
    fn test_invalid_host() {
        let err = TlsTransport::new(tls_client_config(), "not a host!", MockSocket::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDnsName(_)));
    }

    #[test]
    fn test_empty_write_sends_client_hello() {
        let mut t =
            TlsTransport::new(tls_client_config(), "imap.example.com", MockSocket::default())
                .unwrap();
        assert!(t.is_handshaking());
        assert!(t.wants_write());

        assert_eq!(t.write(&[]).unwrap(), 0);
        let sent = &t.get_ref().outgoing;
        // TLS handshake record
        assert_eq!(sent.first(), Some(&0x16));
        assert!(!t.wants_write());
    }

    #[test]
    fn test_blocked_socket_wants_write() {
        let socket = MockSocket {
            blocked_writes: true,
            ..MockSocket::default()
        };
        let mut t = TlsTransport::new(tls_client_config(), "imap.example.com", socket).unwrap();
        assert!(matches!(t.write(&[]), Err(TransportError::WantWrite)));
        assert!(t.wants_write());
    }

    #[test]
    fn test_read_without_data_wants_read() {
        let mut t =
            TlsTransport::new(tls_client_config(), "imap.example.com", MockSocket::default())
                .unwrap();
        let mut buf = [0u8; 64];
        assert!(matches!(t.read(&mut buf), Err(TransportError::WantRead)));
        // the client hello went out on the way
        assert!(!t.get_ref().outgoing.is_empty());
    }

    #[test]
    fn test_peer_close_reads_zero() {
        let socket = MockSocket {
            eof: true,
            ..MockSocket::default()
        };
        let mut t = TlsTransport::new(tls_client_config(), "imap.example.com", socket).unwrap();
        let mut buf = [0u8; 64];
        assert_eq!(t.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_garbage_from_peer_is_io_error() {
        let socket = MockSocket {
            incoming: b"* OK plaintext greeting\r\n".to_vec(),
            ..MockSocket::default()
        };
        let mut t = TlsTransport::new(tls_client_config(), "imap.example.com", socket).unwrap();
        let mut buf = [0u8; 64];
        assert!(matches!(t.read(&mut buf), Err(TransportError::Io(_))));
    }
}
