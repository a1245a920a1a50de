//! IMAP connection plumbing.
//!
//! This module provides the seams between the session and the outside
//! world:
//! - Configuration (host, port, timeout)
//! - The [`Transport`] contract and its TLS implementation
//! - The [`EventLoop`] contract for readiness watches
//!
//! Opening the TCP connection is left to the host; the transport takes an
//! already connected, non-blocking socket.

mod config;
mod event_loop;
mod tls;
mod transport;

pub use config::{Config, ConfigBuilder, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};
pub use event_loop::{EventLoop, WatchId, WatchSet};
pub use tls::{TlsTransport, tls_client_config};
pub use transport::{Transport, TransportError};
