//! # jamail-imap
//!
//! A small, non-blocking IMAPS client engine: log in, select `INBOX`, list
//! every envelope, then fetch message bodies on demand.
//!
//! ## Features
//!
//! - **Host-driven I/O**: the session never blocks and never spawns; it
//!   registers readiness watches with the host's event loop
//! - **TLS via rustls**: implicit TLS on port 993 over any non-blocking
//!   socket
//! - **Resumable parser**: a FETCH reply whose literal is split across
//!   reads is parsed once, when the last byte arrives
//! - **Strict correlation**: commands are issued one at a time and every
//!   tagged reply must match the oldest outstanding tag
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::cell::RefCell;
//! use std::net::TcpStream;
//! use std::rc::Rc;
//!
//! use jamail_imap::connection::{TlsTransport, WatchSet, tls_client_config};
//! use jamail_imap::handler::LoggingHandler;
//! use jamail_imap::session::Session;
//! use jamail_imap::types::Account;
//!
//! fn main() -> jamail_imap::Result<()> {
//!     let account = Account::new("imap.example.com", "user", "password");
//!     let socket = TcpStream::connect("imap.example.com:993")?;
//!     socket.set_nonblocking(true)?;
//!
//!     let transport = TlsTransport::new(tls_client_config(), &account.server, socket)?;
//!     let watches = Rc::new(RefCell::new(WatchSet::new()));
//!     let mut session = Session::new(account, transport, Rc::clone(&watches), LoggingHandler);
//!     session.connect()?;
//!
//!     // poll the socket according to `watches`, then:
//!     session.handle_readable()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Session States
//!
//! ```text
//! Idle ─ connect() ─→ Connecting ─ greeting ─→ Login ─ OK ─→ Select ─ OK ─→ FetchList
//!  ↑                                                                          │
//!  └──────────────────────────────── OK ──────────────────────────────────────┘
//!  │
//!  └─ fetch_message() ─→ FetchBody ─ OK ─→ Idle
//! ```
//!
//! ## Modules
//!
//! - [`command`]: IMAP command serialization and tags
//! - [`connection`]: Transport and event-loop contracts, TLS transport
//! - [`handler`]: Session callbacks
//! - [`parser`]: Sans-I/O response parser
//! - [`session`]: The session state machine
//! - [`types`]: Envelopes, addresses, accounts and statuses

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod handler;
pub mod parser;
pub mod session;
pub mod types;

pub use command::{Command, TagGenerator};
pub use connection::{
    Config, ConfigBuilder, DEFAULT_PORT, EventLoop, TlsTransport, Transport, TransportError,
    WatchId, WatchSet, tls_client_config,
};
pub use error::{Error, Result};
pub use handler::{CollectingHandler, LoggingHandler, NoopHandler, SessionEvent, SessionHandler};
pub use parser::{Parsed, Response, ResponseParser, UntaggedResponse};
pub use session::{Session, SessionState};
pub use types::{Account, Address, Envelope, Status};
