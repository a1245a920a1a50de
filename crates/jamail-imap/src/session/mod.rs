//! Event-driven IMAP session.
//!
//! A [`Session`] logs in, selects `INBOX`, lists the envelopes of every
//! message and then waits for [`Session::fetch_message`] requests. It never
//! blocks: the host owns the event loop, and the session asks it for
//! readiness watches through the [`EventLoop`] contract. When a watch
//! fires the host calls [`Session::handle_readable`] or
//! [`Session::handle_writable`].
//!
//! Commands go out strictly one at a time, tagged `1`, `2`, `3`, ... and
//! every tagged reply must carry the tag of the oldest command still in
//! flight.
//!
//! Any failure other than a malformed untagged FETCH tears the session
//! down: both watches are removed, the transport is closed and the buffers
//! are dropped. The error is returned to the host.

mod state;

use std::mem;

use bytes::{Buf, BytesMut};
use tracing::{debug, error, trace, warn};

pub use state::SessionState;

use crate::command::{Command, TagGenerator};
use crate::connection::{EventLoop, Transport, TransportError, WatchId};
use crate::handler::SessionHandler;
use crate::parser::cursor::Cursor;
use crate::parser::{Parsed, Response, ResponseParser, UntaggedResponse};
use crate::types::{Account, Status};
use crate::{Error, Result};

/// Size of a single transport read.
pub const READ_CHUNK: usize = 4096;

/// Mailbox the session selects.
pub const MAILBOX: &str = "INBOX";

/// One IMAP session over one transport.
pub struct Session<T: Transport, L: EventLoop, H: SessionHandler> {
    account: Account,
    transport: Option<T>,
    event_loop: L,
    handler: H,
    state: SessionState,
    tags: TagGenerator,
    next_reply_id: u32,
    recv_buf: BytesMut,
    send_buf: BytesMut,
    read_watch: Option<WatchId>,
    write_watch: Option<WatchId>,
}

impl<T: Transport, L: EventLoop, H: SessionHandler> Session<T, L, H> {
    /// Creates a session. Nothing happens until [`Session::connect`].
    pub fn new(account: Account, transport: T, event_loop: L, handler: H) -> Self {
        Self {
            account,
            transport: Some(transport),
            event_loop,
            handler,
            state: SessionState::Idle,
            tags: TagGenerator::new(),
            next_reply_id: 1,
            recv_buf: BytesMut::with_capacity(READ_CHUNK),
            send_buf: BytesMut::new(),
            read_watch: None,
            write_watch: None,
        }
    }

    /// Registers with the event loop and starts the TLS handshake.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if the session was already started,
    /// or the transport error that tore the session down.
    pub fn connect(&mut self) -> Result<()> {
        if self.read_watch.is_some() || self.state != SessionState::Idle {
            return Err(Error::InvalidState("session already started".to_string()));
        }
        if self.transport.is_none() {
            return Err(Error::ConnectionClosed);
        }

        debug!(server = %self.account.server, "connecting");
        self.read_watch = Some(self.event_loop.watch_readable());
        self.set_state(SessionState::Connecting);
        let result = self.try_write();
        self.guard(result)
    }

    /// Requests the body text of message `id`.
    ///
    /// The body arrives through [`SessionHandler::on_body`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] when the session is not connected or
    /// another command is in flight; the session stays as it is. Other
    /// errors tear the session down.
    pub fn fetch_message(&mut self, id: u32) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::InvalidState("not connected".to_string()));
        }
        if self.state != SessionState::Idle {
            return Err(Error::InvalidState(format!(
                "cannot fetch message {id} while in state {}",
                self.state
            )));
        }

        self.send(&Command::FetchBody { id });
        self.set_state(SessionState::FetchBody);
        let result = self.try_write();
        self.guard(result)
    }

    /// Handles a readable event on the socket.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that tore the session down.
    pub fn handle_readable(&mut self) -> Result<()> {
        let result = self.try_read().and_then(|()| self.try_write());
        self.guard(result)
    }

    /// Handles a writable event on the socket.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that tore the session down.
    pub fn handle_writable(&mut self) -> Result<()> {
        let result = self.try_write();
        self.guard(result)
    }

    /// Tears the session down.
    pub fn close(&mut self) {
        if self.is_connected() {
            debug!(server = %self.account.server, "closing session");
        }
        self.teardown();
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the tag the next command will get.
    #[must_use]
    pub const fn next_cmd_id(&self) -> u32 {
        self.tags.peek()
    }

    /// Returns the tag the next tagged reply must carry.
    #[must_use]
    pub const fn next_reply_id(&self) -> u32 {
        self.next_reply_id
    }

    /// Returns the number of received bytes not yet consumed as complete
    /// responses.
    #[must_use]
    pub fn pending_input(&self) -> usize {
        self.recv_buf.len()
    }

    /// Returns true between [`Session::connect`] and teardown.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.read_watch.is_some()
    }

    /// Returns the account.
    #[must_use]
    pub const fn account(&self) -> &Account {
        &self.account
    }

    /// Returns the handler.
    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns the handler mutably.
    pub const fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Returns the transport, if the session has not been torn down.
    #[must_use]
    pub const fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    fn guard(&mut self, result: Result<()>) -> Result<()> {
        if let Err(e) = &result {
            error!(server = %self.account.server, state = %self.state, error = %e, "session failed");
            self.teardown();
        }
        result
    }

    fn teardown(&mut self) {
        if let Some(id) = self.write_watch.take() {
            self.event_loop.unwatch(id);
        }
        if let Some(id) = self.read_watch.take() {
            self.event_loop.unwatch(id);
        }
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.recv_buf.clear();
        self.send_buf.clear();
        self.state = SessionState::Idle;
    }

    fn set_state(&mut self, state: SessionState) {
        debug!(from = %self.state, to = %state, "session state");
        self.state = state;
    }

    fn send(&mut self, command: &Command) {
        let tag = self.tags.next_tag();
        debug!(tag, %command, "sending");
        self.send_buf.extend_from_slice(&command.serialize(tag));
    }

    fn try_read(&mut self) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let transport = self.transport.as_mut().ok_or(Error::ConnectionClosed)?;
            match transport.read(&mut chunk) {
                Ok(0) => return Err(Error::ConnectionClosed),
                Ok(n) => {
                    self.recv_buf.extend_from_slice(&chunk[..n]);
                    self.process_recv()?;
                }
                Err(TransportError::WantRead) => return Ok(()),
                Err(TransportError::WantWrite) => {
                    self.update_write_watch(true);
                    return Ok(());
                }
                Err(TransportError::Io(e)) => return Err(e.into()),
            }
        }
    }

    // Pushes queued commands and pending protocol output, then arms the
    // write watch exactly when something is still waiting.
    fn try_write(&mut self) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::ConnectionClosed)?;
        loop {
            match transport.write(&self.send_buf) {
                Ok(n) => {
                    self.send_buf.advance(n);
                    if n == 0 || self.send_buf.is_empty() {
                        break;
                    }
                }
                Err(TransportError::WantRead | TransportError::WantWrite) => break,
                Err(TransportError::Io(e)) => return Err(e.into()),
            }
        }
        let pending = !self.send_buf.is_empty() || transport.wants_write();
        self.update_write_watch(pending);
        Ok(())
    }

    fn update_write_watch(&mut self, wanted: bool) {
        match (wanted, self.write_watch) {
            (true, None) => self.write_watch = Some(self.event_loop.watch_writable()),
            (false, Some(id)) => {
                self.event_loop.unwatch(id);
                self.write_watch = None;
            }
            _ => {}
        }
    }

    // Consumes every complete response in the receive buffer. A candidate
    // runs to the next CRLF; when a literal runs past it, the candidate is
    // extended to the following CRLF.
    fn process_recv(&mut self) -> Result<()> {
        let buf = mem::take(&mut self.recv_buf);
        let mut begin = 0;
        let mut search = 0;

        let result = loop {
            let Some(offset) = find_crlf(&buf[search..]) else {
                break Ok(());
            };
            let end = search + offset;
            match self.dispatch(&buf[begin..end]) {
                Ok(Parsed::Complete(())) => {
                    begin = end + 2;
                    search = begin;
                }
                Ok(Parsed::NeedMore) => search = end + 2,
                Err(e) => break Err(e),
            }
        };

        self.recv_buf = buf;
        self.recv_buf.advance(begin);
        result
    }

    fn dispatch(&mut self, line: &[u8]) -> Result<Parsed<()>> {
        trace!(line = %String::from_utf8_lossy(line), "received");

        match ResponseParser::parse(line)? {
            Response::Tagged { tag, status, text } => {
                self.on_tagged(tag, status, &text)?;
                Ok(Parsed::Complete(()))
            }
            Response::Untagged(untagged) if self.state == SessionState::Connecting => {
                self.on_greeting(untagged)
            }
            Response::Untagged(untagged) => Ok(self.on_untagged(line, untagged)),
        }
    }

    fn on_greeting(&mut self, greeting: UntaggedResponse<'_>) -> Result<Parsed<()>> {
        match greeting {
            UntaggedResponse::Status {
                status: Status::Bye,
                text,
            } => {
                self.handler.on_bye(&self.account, &text);
                return Err(Error::Bye(text));
            }
            UntaggedResponse::Status { .. } => {}
            UntaggedResponse::Fetch { rest, .. } | UntaggedResponse::Other { rest } => {
                if ResponseParser::skip(rest)? == Parsed::NeedMore {
                    return Ok(Parsed::NeedMore);
                }
            }
        }

        let login = Command::Login {
            username: self.account.user.clone(),
            password: self.account.password.clone(),
        };
        self.send(&login);
        self.set_state(SessionState::Login);
        Ok(Parsed::Complete(()))
    }

    fn on_tagged(&mut self, tag: u32, status: Status, text: &str) -> Result<()> {
        if self.next_reply_id >= self.tags.peek() {
            return Err(Error::Protocol(format!(
                "tagged reply {tag} with no command in flight"
            )));
        }
        if tag != self.next_reply_id {
            return Err(Error::Protocol(format!(
                "tag mismatch: expected {}, got {tag}",
                self.next_reply_id
            )));
        }
        self.next_reply_id += 1;

        let Some(command) = self.state.pending_command() else {
            return Err(Error::Protocol(format!(
                "tagged reply {tag} in state {}",
                self.state
            )));
        };
        if !status.is_ok() {
            return Err(Error::Protocol(format!("{command} failed: {status} {text}")));
        }

        match self.state {
            SessionState::Login => {
                self.send(&Command::Select {
                    mailbox: MAILBOX.to_string(),
                });
                self.set_state(SessionState::Select);
            }
            SessionState::Select => {
                self.send(&Command::FetchList);
                self.set_state(SessionState::FetchList);
            }
            SessionState::FetchList | SessionState::FetchBody => {
                self.set_state(SessionState::Idle);
            }
            SessionState::Idle | SessionState::Connecting => {}
        }
        Ok(())
    }

    // Malformed FETCH data is logged and skipped, never fatal.
    fn on_untagged(&mut self, line: &[u8], untagged: UntaggedResponse<'_>) -> Parsed<()> {
        let result = match untagged {
            UntaggedResponse::Status {
                status: Status::Bye,
                text,
            } => {
                debug!(%text, "server said BYE");
                self.handler.on_bye(&self.account, &text);
                Ok(Parsed::Complete(()))
            }
            UntaggedResponse::Status { .. } => Ok(Parsed::Complete(())),
            UntaggedResponse::Fetch { seq, rest } => match self.state {
                SessionState::FetchList => {
                    ResponseParser::parse_fetch_envelope(seq, rest).map(|parsed| match parsed {
                        Parsed::Complete(envelope) => {
                            self.handler.on_envelope(&self.account, &envelope);
                            Parsed::Complete(())
                        }
                        Parsed::NeedMore => Parsed::NeedMore,
                    })
                }
                SessionState::FetchBody => {
                    ResponseParser::parse_fetch_body(rest).map(|parsed| match parsed {
                        Parsed::Complete(Some(body)) => {
                            self.handler.on_body(&self.account, seq, &body);
                            Parsed::Complete(())
                        }
                        Parsed::Complete(None) => {
                            debug!(seq, "FETCH reply without body text");
                            Parsed::Complete(())
                        }
                        Parsed::NeedMore => Parsed::NeedMore,
                    })
                }
                _ => ResponseParser::skip(rest),
            },
            UntaggedResponse::Other { rest } => ResponseParser::skip(rest),
        };

        match result {
            Ok(parsed) => parsed,
            // the response may still hold an unfinished literal; skip
            // only once it is framed in full
            Err(e) => match ResponseParser::skip(Cursor::new(line)) {
                Ok(Parsed::NeedMore) => Parsed::NeedMore,
                _ => {
                    warn!(
                        error = %e,
                        line = %String::from_utf8_lossy(line),
                        "skipping unparseable response"
                    );
                    Parsed::Complete(())
                }
            },
        }
    }
}

impl<T: Transport, L: EventLoop, H: SessionHandler> Drop for Session<T, L, H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
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

    #[test]
    fn test_find_crlf() {
        assert_eq!(find_crlf(b"abc\r\ndef"), Some(3));
        assert_eq!(find_crlf(b"\r\n"), Some(0));
        assert_eq!(find_crlf(b"abc\r"), None);
        assert_eq!(find_crlf(b""), None);
    }
}
